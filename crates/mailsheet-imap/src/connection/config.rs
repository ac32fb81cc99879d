//! Connection configuration.

/// Transport security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plaintext TCP. Only meant for local test servers.
    None,
    /// TLS from the first byte (IMAPS).
    #[default]
    Implicit,
}

impl Security {
    /// Well-known port for this mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 143,
            Self::Implicit => 993,
        }
    }
}

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server host name, also used for certificate verification.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Transport security.
    pub security: Security,
}

impl Config {
    /// Implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self::builder(host).build()
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            host: host.into(),
            port: None,
            security: Security::default(),
        }
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
}

impl ConfigBuilder {
    /// Overrides the port. Without this the security mode's port is used.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            host: self.host,
            security: self.security,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_imaps() {
        let config = Config::new("imap.gmail.com");
        assert_eq!(config.host, "imap.gmail.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.security, Security::Implicit);
    }

    #[test]
    fn plaintext_uses_143_unless_overridden() {
        let config = Config::builder("localhost").security(Security::None).build();
        assert_eq!(config.port, 143);

        let config = Config::builder("localhost")
            .security(Security::None)
            .port(3143)
            .build();
        assert_eq!(config.port, 3143);
    }
}
