//! Commands after login.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use super::states::{Authenticated, Selected};
use super::{Client, Completion, Rejected};
use crate::command::Command;
use crate::parser::UntaggedResponse;
use crate::types::{Mailbox, MailboxStatus, ResponseCode};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Opens a mailbox read-only with EXAMINE.
    ///
    /// Messages are never expunged and flags never change while the mailbox
    /// is open this way.
    ///
    /// # Errors
    ///
    /// Hands the client back in [`Rejected`] when the server refuses the
    /// mailbox (typically `Error::No` for a missing folder).
    pub async fn examine(
        mut self,
        mailbox: &str,
    ) -> std::result::Result<(Client<S, Selected>, MailboxStatus), Rejected<S, Authenticated>> {
        let mailbox = Mailbox::new(mailbox);
        let command = Command::Examine {
            mailbox: mailbox.clone(),
        };

        match self.execute(&command).await {
            Ok(done) => {
                let status = mailbox_status(done);
                info!(%mailbox, exists = status.exists, "mailbox opened read-only");
                let selected = Selected {
                    mailbox,
                    status: status.clone(),
                };
                Ok((self.into_state(selected), status))
            }
            Err(error) => Err(self.reject(error)),
        }
    }
}

fn mailbox_status(done: Completion) -> MailboxStatus {
    let mut status = MailboxStatus {
        read_only: true,
        ..MailboxStatus::default()
    };

    for response in done.untagged {
        match response {
            UntaggedResponse::Exists(n) => status.exists = n,
            UntaggedResponse::Recent(n) => status.recent = n,
            UntaggedResponse::Flags(flags) => status.flags = flags,
            UntaggedResponse::Ok {
                code: Some(code), ..
            } => match code {
                ResponseCode::UidNext(uid) => status.uid_next = Some(uid),
                ResponseCode::UidValidity(v) => status.uid_validity = Some(v),
                _ => {}
            },
            _ => {}
        }
    }

    if matches!(done.code, Some(ResponseCode::ReadWrite)) {
        status.read_only = false;
    }
    status
}
