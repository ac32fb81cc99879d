//! Commands with a mailbox open.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::Selected;
use crate::command::Command;
use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{Mailbox, MailboxStatus, SeqNum};
use crate::{Error, Result};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Name of the open mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        self.state.mailbox()
    }

    /// Status reported when the mailbox was opened.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        self.state.status()
    }

    /// Runs SEARCH with criteria in server syntax, e.g. `ALL` or
    /// `FROM "alice" SINCE 1-Jan-2024`.
    ///
    /// Sequence numbers come back in the order the server sent them.
    ///
    /// # Errors
    ///
    /// Returns `Error::No`/`Error::Bad` if the server rejects the criteria and
    /// `Error::InvalidArgument` for blank criteria or embedded line breaks.
    pub async fn search(&mut self, criteria: &str) -> Result<Vec<SeqNum>> {
        let command = Command::Search {
            criteria: criteria.to_string(),
        };
        let done = self.execute(&command).await?;

        let ids: Vec<SeqNum> = done
            .untagged
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Search(ids) => Some(ids),
                _ => None,
            })
            .flatten()
            .collect();
        debug!(criteria, matches = ids.len(), "search finished");
        Ok(ids)
    }

    /// Fetches one body section (`BODY.PEEK[section]`) of a message, without
    /// setting `\Seen`. An empty section is the whole message.
    ///
    /// Returns every data item the server sent for `seq`; FETCH responses
    /// for other messages are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::No`/`Error::Bad` if the server rejects the request and
    /// `Error::InvalidArgument` for a malformed section.
    pub async fn fetch(&mut self, seq: SeqNum, section: &str) -> Result<Vec<FetchItem>> {
        let command = Command::Fetch {
            sequence: seq,
            section: section.to_string(),
        };
        let done = self.execute(&command).await?;

        Ok(done
            .untagged
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Fetch { seq: got, items } if got == seq => Some(items),
                _ => None,
            })
            .flatten()
            .collect())
    }

    /// Fetches the complete raw message (`BODY.PEEK[]`) without setting
    /// `\Seen`.
    ///
    /// # Errors
    ///
    /// Returns `Error::No`/`Error::Bad` if the server rejects the request and
    /// `Error::Protocol` if it completes without returning the message.
    pub async fn fetch_message(&mut self, seq: SeqNum) -> Result<Vec<u8>> {
        let items = self.fetch(seq, "").await?;

        items
            .into_iter()
            .find_map(|item| match item {
                FetchItem::Body { section, data } if section.is_empty() => data,
                _ => None,
            })
            .ok_or_else(|| Error::Protocol(format!("server returned no body for message {seq}")))
    }
}
