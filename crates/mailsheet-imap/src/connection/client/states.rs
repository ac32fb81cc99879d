//! Connection state markers.

use crate::types::{Mailbox, MailboxStatus};

/// Connected, greeting read, not logged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in, no mailbox open.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// A mailbox is open.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: Mailbox,
    pub(crate) status: MailboxStatus,
}

impl Selected {
    /// Name of the open mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Status reported when the mailbox was opened.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.status
    }
}
