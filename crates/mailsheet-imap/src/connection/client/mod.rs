//! Type-state client.
//!
//! `Client<S, State>` only exposes the commands valid in `State`. Transitions
//! consume the client; when the server refuses one, the unchanged client comes
//! back inside [`Rejected`] so the session can still be logged out.

#![allow(clippy::result_large_err)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status, Tag};
use crate::{Error, Result};

/// IMAP connection in state `State`.
pub struct Client<S, State> {
    stream: FramedStream<S>,
    tags: TagGenerator,
    capabilities: Vec<Capability>,
    state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// A refused state transition: the error plus the client, still in its
/// previous state.
pub struct Rejected<S, State> {
    /// The client, unchanged.
    pub client: Client<S, State>,
    /// Why the transition failed.
    pub error: Error,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Rejected<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rejected")
            .field("client", &self.client)
            .field("error", &self.error)
            .finish()
    }
}

impl<S, State> From<Rejected<S, State>> for Error {
    fn from(rejected: Rejected<S, State>) -> Self {
        rejected.error
    }
}

/// Untagged data and the tagged completion of one successful command.
pub(crate) struct Completion {
    pub(crate) untagged: Vec<UntaggedResponse>,
    pub(crate) code: Option<ResponseCode>,
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Capabilities learned from the greeting or a later response.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns true if the server advertised `cap`.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Ends the session with LOGOUT and closes the connection.
    ///
    /// Valid in every state.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent or the server answers
    /// with anything but OK. A connection that drops right after the
    /// server's BYE counts as a clean logout.
    pub async fn logout(mut self) -> Result<()> {
        let result = match self.execute(&Command::Logout).await {
            Ok(_) | Err(Error::Bye(_)) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "shutdown after LOGOUT failed");
        }
        result
    }

    /// Sends `command` and waits for its tagged completion.
    ///
    /// # Errors
    ///
    /// `Error::No`/`Error::Bad`/`Error::Bye` mirror the tagged status; I/O
    /// and argument errors pass through.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Completion> {
        command.validate()?;
        let tag = self.tags.next();
        debug!(%tag, ?command, "sending command");

        let mut chunks = command.serialize(&tag).into_iter();
        if let Some(first) = chunks.next() {
            self.stream.write_command(&first).await?;
        }
        for chunk in chunks {
            self.await_continuation(&tag).await?;
            self.stream.write_command(&chunk).await?;
        }
        self.read_until_tagged(&tag).await
    }

    /// Waits for the `+` that lets a literal through. A tagged completion
    /// instead means the server refused the command.
    async fn await_continuation(&mut self, tag: &Tag) -> Result<()> {
        loop {
            let bytes = self.stream.read_response().await?;
            match ResponseParser::parse(&bytes) {
                Ok(Response::Continuation { .. }) => return Ok(()),
                Ok(Response::Tagged {
                    tag: done,
                    status,
                    text,
                    ..
                }) if done == *tag => {
                    return Err(match status {
                        Status::Bad => Error::Bad(text),
                        Status::Bye => Error::Bye(text),
                        Status::No => Error::No(text),
                        Status::Ok | Status::PreAuth => Error::Protocol(format!(
                            "command completed before its literal was sent: {text}"
                        )),
                    });
                }
                Ok(Response::Untagged(UntaggedResponse::Bye { text, .. })) => {
                    return Err(Error::Bye(text));
                }
                Ok(other) => debug!(?other, "ignoring response while waiting for continuation"),
                Err(e) => warn!(error = %e, "skipping unparseable response"),
            }
        }
    }

    async fn read_until_tagged(&mut self, tag: &Tag) -> Result<Completion> {
        let mut untagged = Vec::new();
        let mut farewell: Option<String> = None;

        loop {
            let bytes = match self.stream.read_response().await {
                Ok(bytes) => bytes,
                Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Err(farewell.map_or(Error::Io(e), Error::Bye));
                }
                Err(e) => return Err(e),
            };

            match ResponseParser::parse(&bytes) {
                Ok(Response::Tagged {
                    tag: done,
                    status,
                    code,
                    text,
                }) if done == *tag => {
                    debug!(%tag, ?status, untagged = untagged.len(), "command completed");
                    return match status {
                        Status::Ok | Status::PreAuth => Ok(Completion { untagged, code }),
                        Status::No => Err(Error::No(text)),
                        Status::Bad => Err(Error::Bad(text)),
                        Status::Bye => Err(Error::Bye(text)),
                    };
                }
                Ok(Response::Tagged { tag: other, .. }) => {
                    warn!(expected = %tag, got = %other, "ignoring completion for another tag");
                }
                Ok(Response::Untagged(response)) => {
                    if let UntaggedResponse::Bye { text, .. } = &response {
                        farewell = Some(text.clone());
                    }
                    if let UntaggedResponse::Capability(caps) = &response {
                        self.capabilities.clone_from(caps);
                    }
                    untagged.push(response);
                }
                Ok(Response::Continuation { text }) => {
                    return Err(Error::Protocol(format!(
                        "unexpected continuation request: {text}"
                    )));
                }
                Err(e) => {
                    warn!(error = %e, "skipping unparseable response");
                }
            }
        }
    }

    fn into_state<Next>(self, state: Next) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tags: self.tags,
            capabilities: self.capabilities,
            state,
        }
    }

    fn reject(self, error: Error) -> Rejected<S, State> {
        Rejected {
            client: self,
            error,
        }
    }
}
