//! Account configuration and export options.
//!
//! Credentials come from an INI file:
//!
//! ```ini
//! [Gmail]
//! user = someone@example.com
//! password = app-password
//! imap_url = imap.gmail.com
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use ini::Ini;
use mailsheet_imap::Config;

use crate::{Error, Result};

/// Section holding the account keys.
pub const SECTION: &str = "Gmail";

/// Port used when `imap_url` names no port.
pub const DEFAULT_IMAP_PORT: u16 = 993;

/// Folder exported when the operator gives none.
pub const DEFAULT_FOLDER: &str = "INBOX";

/// Search criteria used when the operator gives none.
pub const DEFAULT_CRITERIA: &str = "ALL";

/// Output file used when the operator gives none.
pub const DEFAULT_OUTPUT: &str = "output.xlsx";

/// IMAP server host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    /// Host name, also used for certificate verification.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServerAddress {
    /// Parses `host` or `host:port`. IPv6 literals need brackets when a port
    /// is given (`[::1]:993`).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty host or an invalid port.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let (host, port) = match value.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') || host.ends_with(']') => {
                let port = port
                    .parse::<u16>()
                    .ok()
                    .filter(|&p| p != 0)
                    .ok_or_else(|| Error::Config(format!("invalid port in imap_url `{value}`")))?;
                (host, port)
            }
            _ => (value, DEFAULT_IMAP_PORT),
        };

        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(Error::Config("imap_url has no host".to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Connection settings for implicit TLS to this address.
    #[must_use]
    pub fn to_imap_config(&self) -> Config {
        Config::builder(self.host.clone()).port(self.port).build()
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Credentials and server of the mailbox to export.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// Login name.
    pub user: String,
    /// Password or app password.
    pub password: String,
    /// IMAP server.
    pub server: ServerAddress,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .finish()
    }
}

impl AccountConfig {
    /// Loads the account from an INI file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or parsed, or the
    /// `[Gmail]` section lacks `user`, `password` or `imap_url`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_ini(&ini)
    }

    /// Parses the account from INI text.
    ///
    /// # Errors
    ///
    /// Same as [`AccountConfig::load`].
    pub fn from_ini_str(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self> {
        let section = ini
            .section(Some(SECTION))
            .ok_or_else(|| Error::Config(format!("missing [{SECTION}] section")))?;
        let get = |key: &str| {
            section
                .get(key)
                .ok_or_else(|| Error::Config(format!("missing `{key}` in [{SECTION}]")))
        };

        let user = get("user")?.trim();
        if user.is_empty() {
            return Err(Error::Config(format!("empty `user` in [{SECTION}]")));
        }

        Ok(Self {
            user: user.to_string(),
            password: get("password")?.to_string(),
            server: ServerAddress::parse(get("imap_url")?)?,
        })
    }
}

/// What to export and where to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Folder to open read-only.
    pub folder: String,
    /// IMAP SEARCH criteria, passed through verbatim.
    pub criteria: String,
    /// Destination `.xlsx` file.
    pub output: PathBuf,
    /// Abort on the first message that cannot be extracted instead of
    /// skipping it.
    pub strict_extraction: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            folder: DEFAULT_FOLDER.to_string(),
            criteria: DEFAULT_CRITERIA.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            strict_extraction: false,
        }
    }
}

impl ExportOptions {
    /// Builds options from operator answers; blank answers take the
    /// defaults.
    #[must_use]
    pub fn from_answers(folder: &str, criteria: &str, output: &str) -> Self {
        let defaults = Self::default();
        let answer = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        Self {
            folder: answer(folder).unwrap_or(defaults.folder),
            criteria: answer(criteria).unwrap_or(defaults.criteria),
            output: answer(output).map_or(defaults.output, PathBuf::from),
            strict_extraction: defaults.strict_extraction,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use mailsheet_imap::Security;

    const CONFIG: &str = "[Gmail]\nuser = me@example.com\npassword = hunter2\nimap_url = imap.gmail.com\n";

    #[test]
    fn parses_account() {
        let account = AccountConfig::from_ini_str(CONFIG).unwrap();
        assert_eq!(account.user, "me@example.com");
        assert_eq!(account.password, "hunter2");
        assert_eq!(
            account.server,
            ServerAddress {
                host: "imap.gmail.com".to_string(),
                port: 993
            }
        );
    }

    #[test]
    fn debug_hides_password() {
        let account = AccountConfig::from_ini_str(CONFIG).unwrap();
        let debug = format!("{account:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn missing_section_or_key() {
        let err = AccountConfig::from_ini_str("[Other]\nuser = x\n").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("[Gmail]")));

        let err = AccountConfig::from_ini_str("[Gmail]\nuser = x\nimap_url = h\n").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("password")));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, CONFIG).unwrap();
        assert_eq!(AccountConfig::load(&path).unwrap().user, "me@example.com");

        let missing = AccountConfig::load(dir.path().join("absent.ini")).unwrap_err();
        assert!(matches!(missing, Error::Config(_)));
    }

    #[test]
    fn server_address_forms() {
        assert_eq!(ServerAddress::parse("mail.example.com:1993").unwrap().port, 1993);
        assert_eq!(ServerAddress::parse(" mail.example.com ").unwrap().host, "mail.example.com");

        let v6 = ServerAddress::parse("[::1]:143").unwrap();
        assert_eq!((v6.host.as_str(), v6.port), ("::1", 143));
        assert_eq!(ServerAddress::parse("::1").unwrap().port, DEFAULT_IMAP_PORT);

        assert!(ServerAddress::parse("host:http").is_err());
        assert!(ServerAddress::parse("host:0").is_err());
        assert!(ServerAddress::parse(":993").is_err());
    }

    #[test]
    fn imap_config_uses_implicit_tls() {
        let config = ServerAddress::parse("mail.example.com").unwrap().to_imap_config();
        assert_eq!(config.port, 993);
        assert_eq!(config.security, Security::Implicit);
    }

    #[test]
    fn blank_answers_take_defaults() {
        let options = ExportOptions::from_answers("", "  ", "\n");
        assert_eq!(options, ExportOptions::default());
        assert_eq!(options.folder, "INBOX");
        assert_eq!(options.criteria, "ALL");
        assert_eq!(options.output, PathBuf::from("output.xlsx"));

        let options = ExportOptions::from_answers("Archive", "SINCE 1-Jan-2024", "out.xlsx");
        assert_eq!(options.folder, "Archive");
        assert_eq!(options.criteria, "SINCE 1-Jan-2024");
    }
}
