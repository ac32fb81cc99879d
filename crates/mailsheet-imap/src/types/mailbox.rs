//! Mailbox names and the status reported when one is opened.

use base64::Engine;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};

use super::Uid;

const MUTF7: GeneralPurpose = GeneralPurpose::new(&IMAP_MUTF7, NO_PAD);

/// Mailbox name as the user types it (Unicode).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a new mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the mailbox name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encodes the name in modified UTF-7 (RFC 3501 section 5.1.3).
    ///
    /// Printable ASCII passes through, `&` becomes `&-`, and every run of
    /// other characters becomes `&<base64 of UTF-16BE>-`.
    #[must_use]
    pub fn to_wire(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut pending: Vec<u16> = Vec::new();

        for ch in self.0.chars() {
            if (' '..='~').contains(&ch) {
                flush_utf16(&mut pending, &mut out);
                if ch == '&' {
                    out.push_str("&-");
                } else {
                    out.push(ch);
                }
            } else {
                let mut buf = [0u16; 2];
                pending.extend_from_slice(ch.encode_utf16(&mut buf));
            }
        }
        flush_utf16(&mut pending, &mut out);
        out
    }
}

fn flush_utf16(pending: &mut Vec<u16>, out: &mut String) {
    if pending.is_empty() {
        return;
    }
    let bytes: Vec<u8> = pending.iter().flat_map(|unit| unit.to_be_bytes()).collect();
    out.push('&');
    out.push_str(&MUTF7.encode(bytes));
    out.push('-');
    pending.clear();
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mailbox information gathered from the untagged responses to EXAMINE.
#[derive(Debug, Clone, Default)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<u32>,
    /// Flags defined for this mailbox.
    pub flags: Vec<String>,
    /// Whether the mailbox was opened read-only.
    pub read_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_are_unchanged() {
        assert_eq!(Mailbox::new("INBOX").to_wire(), "INBOX");
        assert_eq!(Mailbox::new("[Gmail]/Sent Mail").to_wire(), "[Gmail]/Sent Mail");
    }

    #[test]
    fn ampersand_is_escaped() {
        assert_eq!(Mailbox::new("Q&A").to_wire(), "Q&-A");
    }

    #[test]
    fn non_ascii_runs_use_modified_base64() {
        // Examples from RFC 3501 section 5.1.3.
        assert_eq!(Mailbox::new("~peter/mail/台北/日本語").to_wire(), "~peter/mail/&U,BTFw-/&ZeVnLIqe-");
        assert_eq!(Mailbox::new("Entwürfe").to_wire(), "Entw&APw-rfe");
    }
}
