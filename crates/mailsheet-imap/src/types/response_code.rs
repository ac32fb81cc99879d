//! Bracketed response codes.

use super::{Capability, Uid};

/// Response code attached to a status response, e.g. `[READ-ONLY]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: text that must be shown to the user.
    Alert,
    /// CAPABILITY list sent inline.
    Capability(Vec<Capability>),
    /// PERMANENTFLAGS: flags the client may change permanently.
    PermanentFlags(Vec<String>),
    /// READ-ONLY: the mailbox was opened read-only.
    ReadOnly,
    /// READ-WRITE: the mailbox was opened read-write.
    ReadWrite,
    /// TRYCREATE: the target mailbox does not exist.
    TryCreate,
    /// UIDNEXT: next UID to be assigned.
    UidNext(Uid),
    /// UIDVALIDITY of the mailbox.
    UidValidity(u32),
    /// UNSEEN: first unseen message.
    Unseen(u32),
    /// AUTHENTICATIONFAILED (RFC 5530).
    AuthenticationFailed,
    /// NONEXISTENT (RFC 5530): the mailbox does not exist.
    NonExistent,
    /// Any other code, kept verbatim.
    Unknown(String),
}
