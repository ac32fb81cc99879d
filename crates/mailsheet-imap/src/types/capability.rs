//! Response status and server capabilities.

/// Completion status carried by tagged and untagged status responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed.
    Ok,
    /// Command refused by the server.
    No,
    /// Command was malformed or not valid in the current state.
    Bad,
    /// Greeting of a connection that is already authenticated.
    PreAuth,
    /// Server is closing the connection.
    Bye,
}

impl Status {
    /// Returns true for `OK` and `PREAUTH`.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// A capability advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501).
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051).
    Imap4Rev2,
    /// `STARTTLS`.
    StartTls,
    /// `LOGINDISABLED`: the LOGIN command must not be used.
    LoginDisabled,
    /// `AUTH=<mechanism>`.
    Auth(String),
    /// Anything else, kept verbatim.
    Unknown(String),
}

impl Capability {
    /// Parses a capability atom (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ => upper
                .strip_prefix("AUTH=")
                .map_or_else(|| Self::Unknown(s.to_string()), |m| Self::Auth(m.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_capabilities_case_insensitively() {
        assert_eq!(Capability::parse("imap4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("IMAP4rev2"), Capability::Imap4Rev2);
        assert_eq!(Capability::parse("LoginDisabled"), Capability::LoginDisabled);
        assert_eq!(
            Capability::parse("auth=xoauth2"),
            Capability::Auth("XOAUTH2".to_string())
        );
    }

    #[test]
    fn keeps_unknown_capabilities_verbatim() {
        assert_eq!(
            Capability::parse("X-GM-EXT-1"),
            Capability::Unknown("X-GM-EXT-1".to_string())
        );
    }

    #[test]
    fn status_ok() {
        assert!(Status::Ok.is_ok());
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
        assert!(!Status::Bye.is_ok());
    }
}
