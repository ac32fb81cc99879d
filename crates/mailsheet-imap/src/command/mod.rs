//! IMAP commands.
//!
//! Only the commands a read-only export issues are modeled. Each one
//! serializes to a CRLF-terminated line, split where an 8-bit argument has
//! to travel as a synchronizing literal.

mod serialize;
mod tag_generator;

use crate::error::{Error, Result};
use crate::types::{Mailbox, SeqNum, Tag};

pub use tag_generator::TagGenerator;

use serialize::{Wire, write_astring};

/// An IMAP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// `LOGIN user password`.
    Login {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// `EXAMINE mailbox` (read-only SELECT).
    Examine {
        /// Mailbox to open.
        mailbox: Mailbox,
    },
    /// `SEARCH criteria`, criteria in server syntax.
    Search {
        /// Search key, e.g. `ALL` or `FROM "alice" SINCE 1-Jan-2024`.
        criteria: String,
    },
    /// `FETCH seq (BODY.PEEK[section])`, which leaves `\Seen` alone.
    Fetch {
        /// Message to fetch.
        sequence: SeqNum,
        /// Section specifier; empty for the whole message.
        section: String,
    },
    /// `LOGOUT`.
    Logout,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Examine { mailbox } => f.debug_struct("Examine").field("mailbox", mailbox).finish(),
            Self::Search { criteria } => f.debug_struct("Search").field("criteria", criteria).finish(),
            Self::Fetch { sequence, section } => f
                .debug_struct("Fetch")
                .field("sequence", sequence)
                .field("section", section)
                .finish(),
            Self::Logout => f.write_str("Logout"),
        }
    }
}

impl Command {
    /// Rejects arguments that would break out of the command line.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if a string argument contains CR, LF
    /// or NUL, or if the search criteria are empty.
    pub fn validate(&self) -> Result<()> {
        let forbidden = |s: &str| s.bytes().any(|b| matches!(b, b'\r' | b'\n' | 0));
        match self {
            Self::Login { username, password } => {
                if forbidden(username) || forbidden(password) {
                    return Err(Error::InvalidArgument(
                        "credentials contain a line break or NUL".to_string(),
                    ));
                }
            }
            Self::Examine { mailbox } if forbidden(mailbox.as_str()) => {
                return Err(Error::InvalidArgument(format!(
                    "mailbox name {:?} contains a line break or NUL",
                    mailbox.as_str()
                )));
            }
            Self::Fetch { section, .. } if forbidden(section) || section.contains(']') => {
                return Err(Error::InvalidArgument(format!("invalid section {section:?}")));
            }
            Self::Search { criteria } => {
                if criteria.trim().is_empty() {
                    return Err(Error::InvalidArgument("empty search criteria".to_string()));
                }
                if forbidden(criteria) {
                    return Err(Error::InvalidArgument(
                        "search criteria contain a line break or NUL".to_string(),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Serializes the command with its tag, including the trailing CRLF.
    ///
    /// The result has one chunk per synchronizing literal plus one: every
    /// chunk but the last ends with a `{n}` announcement, and the server
    /// must send a continuation request before the next chunk goes out.
    #[must_use]
    pub fn serialize(&self, tag: &Tag) -> Vec<Vec<u8>> {
        let mut wire = Wire::new();
        wire.extend(tag.as_str().as_bytes());
        wire.push(b' ');

        match self {
            Self::Logout => wire.extend(b"LOGOUT"),
            Self::Login { username, password } => {
                wire.extend(b"LOGIN ");
                write_astring(&mut wire, username);
                wire.push(b' ');
                write_astring(&mut wire, password);
            }
            Self::Examine { mailbox } => {
                wire.extend(b"EXAMINE ");
                write_astring(&mut wire, &mailbox.to_wire());
            }
            Self::Search { criteria } => {
                wire.extend(b"SEARCH ");
                if !criteria.is_ascii() {
                    wire.extend(b"CHARSET UTF-8 ");
                }
                wire.extend(criteria.trim().as_bytes());
            }
            Self::Fetch { sequence, section } => {
                wire.extend(format!("FETCH {sequence} (BODY.PEEK[{section}])").as_bytes());
            }
        }

        wire.extend(b"\r\n");
        wire.into_chunks()
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

    fn line(cmd: &Command) -> String {
        let chunks = cmd.serialize(&Tag::new("A0001"));
        assert_eq!(chunks.len(), 1);
        String::from_utf8(chunks.concat()).unwrap()
    }

    #[test]
    fn login_quotes_when_needed() {
        let cmd = Command::Login {
            username: "alice@example.com".to_string(),
            password: "pa ss\"word".to_string(),
        };
        assert_eq!(line(&cmd), "A0001 LOGIN alice@example.com \"pa ss\\\"word\"\r\n");
    }

    #[test]
    fn login_debug_hides_password() {
        let cmd = Command::Login {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{cmd:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn examine_encodes_mailbox() {
        let cmd = Command::Examine {
            mailbox: Mailbox::new("[Gmail]/Sent Mail"),
        };
        assert_eq!(line(&cmd), "A0001 EXAMINE \"[Gmail]/Sent Mail\"\r\n");

        let cmd = Command::Examine {
            mailbox: Mailbox::new("Entwürfe"),
        };
        assert_eq!(line(&cmd), "A0001 EXAMINE Entw&APw-rfe\r\n");
    }

    #[test]
    fn search_passes_criteria_through() {
        let cmd = Command::Search {
            criteria: "FROM \"bob\" SINCE 1-Jan-2024".to_string(),
        };
        assert_eq!(line(&cmd), "A0001 SEARCH FROM \"bob\" SINCE 1-Jan-2024\r\n");
    }

    #[test]
    fn search_declares_utf8_for_non_ascii_criteria() {
        let cmd = Command::Search {
            criteria: "SUBJECT \"Café\"".to_string(),
        };
        assert_eq!(line(&cmd), "A0001 SEARCH CHARSET UTF-8 SUBJECT \"Café\"\r\n");
    }

    #[test]
    fn fetch_peeks_at_section() {
        let cmd = Command::Fetch {
            sequence: SeqNum::new(42).unwrap(),
            section: String::new(),
        };
        assert_eq!(line(&cmd), "A0001 FETCH 42 (BODY.PEEK[])\r\n");

        let cmd = Command::Fetch {
            sequence: SeqNum::new(7).unwrap(),
            section: "HEADER".to_string(),
        };
        assert_eq!(line(&cmd), "A0001 FETCH 7 (BODY.PEEK[HEADER])\r\n");
    }

    #[test]
    fn non_ascii_password_is_sent_as_literal() {
        let cmd = Command::Login {
            username: "alice".to_string(),
            password: "pässe".to_string(),
        };
        let chunks = cmd.serialize(&Tag::new("A0001"));
        assert_eq!(
            chunks,
            vec![
                b"A0001 LOGIN alice {6}\r\n".to_vec(),
                "pässe\r\n".as_bytes().to_vec(),
            ]
        );
    }

    #[test]
    fn validate_rejects_section_escape() {
        let cmd = Command::Fetch {
            sequence: SeqNum::new(1).unwrap(),
            section: "TEXT] FLAGS".to_string(),
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn logout() {
        assert_eq!(line(&Command::Logout), "A0001 LOGOUT\r\n");
    }

    #[test]
    fn validate_rejects_injection() {
        let cmd = Command::Search {
            criteria: "ALL\r\nA9 DELETE INBOX".to_string(),
        };
        assert!(matches!(cmd.validate(), Err(Error::InvalidArgument(_))));

        let cmd = Command::Login {
            username: "alice".to_string(),
            password: "a\nb".to_string(),
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_criteria() {
        let cmd = Command::Search {
            criteria: "   ".to_string(),
        };
        assert!(cmd.validate().is_err());
        let cmd = Command::Search {
            criteria: "ALL".to_string(),
        };
        assert!(cmd.validate().is_ok());
    }
}
