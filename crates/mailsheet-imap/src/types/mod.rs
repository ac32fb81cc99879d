//! Protocol value types.
//!
//! Identifiers, capabilities, mailbox names and response codes as defined by
//! RFC 3501 (`IMAP4rev1`).

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod identifiers;
mod mailbox;
mod response_code;

pub use capability::{Capability, Status};
pub use identifiers::{SeqNum, Tag, Uid};
pub use mailbox::{Mailbox, MailboxStatus};
pub use response_code::ResponseCode;
