//! Read-only mailbox session.
//!
//! [`MailboxSession`] keeps the type-state IMAP client behind a runtime state
//! so that one value can travel through the whole export and be logged out
//! exactly once, whichever step failed.

use mailsheet_imap::{
    Authenticated, Client, ImapStream, NotAuthenticated, Rejected, SeqNum, Selected,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::config::ServerAddress;
use crate::{Error, Result};

enum SessionState<S> {
    Connected(Client<S, NotAuthenticated>),
    Authenticated(Client<S, Authenticated>),
    Selected(Client<S, Selected>),
}

impl<S> SessionState<S> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Authenticated(_) => "authenticated",
            Self::Selected(_) => "selected",
        }
    }
}

/// An IMAP session used for one export run.
pub struct MailboxSession<S> {
    state: Option<SessionState<S>>,
}

impl<S> std::fmt::Debug for MailboxSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxSession")
            .field("state", &self.state.as_ref().map_or("closed", SessionState::name))
            .finish()
    }
}

impl MailboxSession<ImapStream> {
    /// Connects with implicit TLS and reads the greeting.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` on network or TLS failure, or when the
    /// server greets with BYE.
    pub async fn connect(server: &ServerAddress) -> Result<Self> {
        info!(%server, "connecting");
        let stream = mailsheet_imap::connection::connect(&server.to_imap_config())
            .await
            .map_err(Error::Connection)?;
        Self::from_stream(stream).await
    }
}

impl<S> MailboxSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Starts a session on an already connected stream.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` if the greeting is missing or a refusal.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let client = Client::from_stream(stream)
            .await
            .map_err(Error::Connection)?;
        Ok(Self {
            state: Some(SessionState::Connected(client)),
        })
    }

    /// Logs in.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` if the server rejects the
    /// credentials, `Error::InvalidState` if already logged in.
    pub async fn authenticate(&mut self, user: &str, password: &str) -> Result<()> {
        let client = match self.state.take() {
            Some(SessionState::Connected(client)) => client,
            other => {
                self.state = other;
                return Err(Error::InvalidState("authenticate needs a fresh connection"));
            }
        };

        match client.login(user, password).await {
            Ok(client) => {
                self.state = Some(SessionState::Authenticated(client));
                Ok(())
            }
            Err(Rejected { client, error }) => {
                self.state = Some(SessionState::Connected(client));
                Err(Error::Authentication(error))
            }
        }
    }

    /// Opens `folder` read-only and returns its message count.
    ///
    /// # Errors
    ///
    /// Returns `Error::FolderNotFound` if the server refuses the folder,
    /// `Error::InvalidState` unless the session is authenticated and no
    /// folder is open yet.
    pub async fn select_folder(&mut self, folder: &str) -> Result<u32> {
        let client = match self.state.take() {
            Some(SessionState::Authenticated(client)) => client,
            other => {
                self.state = other;
                return Err(Error::InvalidState("select_folder needs an authenticated session"));
            }
        };

        match client.examine(folder).await {
            Ok((client, status)) => {
                self.state = Some(SessionState::Selected(client));
                Ok(status.exists)
            }
            Err(Rejected { client, error }) => {
                self.state = Some(SessionState::Authenticated(client));
                Err(Error::FolderNotFound {
                    folder: folder.to_string(),
                    source: error,
                })
            }
        }
    }

    /// Runs `SEARCH criteria` and returns the matches in server order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Search` if the server rejects the criteria,
    /// `Error::InvalidState` if no folder is open.
    pub async fn search(&mut self, criteria: &str) -> Result<Vec<SeqNum>> {
        let ids = self
            .selected()?
            .search(criteria)
            .await
            .map_err(Error::Search)?;
        debug!(criteria, matches = ids.len(), "search finished");
        Ok(ids)
    }

    /// Fetches the full raw message without setting `\Seen`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Fetch` if the server rejects the request or sends no
    /// body, `Error::InvalidState` if no folder is open.
    pub async fn fetch(&mut self, seq: SeqNum) -> Result<Vec<u8>> {
        let raw = self
            .selected()?
            .fetch_message(seq)
            .await
            .map_err(|source| Error::Fetch { seq, source })?;
        debug!(%seq, bytes = raw.len(), "fetched message");
        Ok(raw)
    }

    /// Sends LOGOUT from whatever state the session is in and closes the
    /// connection. Failures are logged, not returned.
    pub async fn logout(mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        let result = match state {
            SessionState::Connected(client) => client.logout().await,
            SessionState::Authenticated(client) => client.logout().await,
            SessionState::Selected(client) => client.logout().await,
        };
        match result {
            Ok(()) => debug!("logged out"),
            Err(e) => warn!(error = %e, "logout failed"),
        }
    }

    fn selected(&mut self) -> Result<&mut Client<S, Selected>> {
        match &mut self.state {
            Some(SessionState::Selected(client)) => Ok(client),
            _ => Err(Error::InvalidState("no folder selected")),
        }
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
    use tokio_test::io::Builder;

    const GREETING: &[u8] = b"* OK IMAP4rev1 ready\r\n";

    #[tokio::test]
    async fn operations_out_of_order_are_refused() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGOUT\r\n")
            .read(b"* BYE\r\nA0000 OK done\r\n")
            .build();

        let mut session = MailboxSession::from_stream(mock).await.unwrap();
        assert!(matches!(
            session.select_folder("INBOX").await,
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(session.search("ALL").await, Err(Error::InvalidState(_))));
        assert!(matches!(
            session.fetch(SeqNum::new(1).unwrap()).await,
            Err(Error::InvalidState(_))
        ));
        assert_eq!(format!("{session:?}"), "MailboxSession { state: \"connected\" }");
        session.logout().await;
    }

    #[tokio::test]
    async fn rejected_login_keeps_session_for_logout() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN me nope\r\n")
            .read(b"A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .write(b"A0001 LOGOUT\r\n")
            .read(b"* BYE\r\nA0001 OK done\r\n")
            .build();

        let mut session = MailboxSession::from_stream(mock).await.unwrap();
        let err = session.authenticate("me", "nope").await.unwrap_err();
        assert!(matches!(err, Error::Authentication(mailsheet_imap::Error::No(_))));
        session.logout().await;
    }

    #[tokio::test]
    async fn missing_folder() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN me pw\r\n")
            .read(b"A0000 OK Logged in\r\n")
            .write(b"A0001 EXAMINE Nope\r\n")
            .read(b"A0001 NO [NONEXISTENT] Unknown Mailbox: Nope\r\n")
            .write(b"A0002 LOGOUT\r\n")
            .read(b"* BYE\r\nA0002 OK done\r\n")
            .build();

        let mut session = MailboxSession::from_stream(mock).await.unwrap();
        session.authenticate("me", "pw").await.unwrap();
        let err = session.select_folder("Nope").await.unwrap_err();
        assert!(matches!(err, Error::FolderNotFound { ref folder, .. } if folder == "Nope"));
        assert!(matches!(
            session.authenticate("me", "pw").await,
            Err(Error::InvalidState(_))
        ));
        session.logout().await;
    }

    #[tokio::test]
    async fn bye_greeting_is_a_connection_error() {
        let mock = Builder::new().read(b"* BYE Too many connections\r\n").build();
        let err = MailboxSession::from_stream(mock).await.unwrap_err();
        assert!(matches!(err, Error::Connection(mailsheet_imap::Error::Bye(_))));
    }

    #[tokio::test]
    async fn logout_failure_is_swallowed() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGOUT\r\n")
            .read(b"A0000 BAD not now\r\n")
            .build();

        let session = MailboxSession::from_stream(mock).await.unwrap();
        session.logout().await;
    }
}
