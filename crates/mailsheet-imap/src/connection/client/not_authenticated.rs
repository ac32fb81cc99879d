//! Commands before login.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::{Client, Rejected};
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting from a freshly connected stream.
    ///
    /// # Errors
    ///
    /// Returns `Error::Bye` if the server refuses the connection and
    /// `Error::Protocol` if the first response is not a greeting.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut stream = FramedStream::new(stream);
        let greeting = stream.read_response().await?;

        let (code, text) = match ResponseParser::parse(&greeting)? {
            Response::Untagged(UntaggedResponse::Ok { code, text }) => (code, text),
            Response::Untagged(UntaggedResponse::PreAuth { code, text }) => {
                debug!("server sent PREAUTH greeting");
                (code, text)
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => return Err(Error::Bye(text)),
            other => {
                return Err(Error::Protocol(format!("expected greeting, got {other:?}")));
            }
        };
        debug!(greeting = %text, "server greeting");

        let capabilities = match code {
            Some(ResponseCode::Capability(caps)) => caps,
            _ => Vec::new(),
        };

        Ok(Self {
            stream,
            tags: TagGenerator::default(),
            capabilities,
            state: NotAuthenticated,
        })
    }

    /// Logs in with a user name and password.
    ///
    /// # Errors
    ///
    /// Hands the client back in [`Rejected`] when the server refuses the
    /// credentials (`Error::No`), the command is malformed (`Error::Bad`),
    /// or the server advertises `LOGINDISABLED`.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Client<S, Authenticated>, Rejected<S, NotAuthenticated>> {
        if self.has_capability(&Capability::LoginDisabled) {
            return Err(self.reject(Error::No("server advertises LOGINDISABLED".to_string())));
        }

        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.execute(&command).await {
            Ok(done) => {
                if let Some(ResponseCode::Capability(caps)) = done.code {
                    self.capabilities = caps;
                }
                info!(user = username, "logged in");
                Ok(self.into_state(Authenticated))
            }
            Err(error) => Err(self.reject(error)),
        }
    }
}
