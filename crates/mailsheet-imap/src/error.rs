//! Error types for the IMAP client.

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The host name is not usable as a TLS server name.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A server response could not be parsed.
    #[error("Parse error at position {position}: {message}")]
    Parse {
        /// Byte offset into the response where parsing failed.
        position: usize,
        /// What the parser expected.
        message: String,
    },

    /// Server returned NO.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE and is closing the connection.
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// A command argument cannot be sent on the wire.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The server broke the protocol (unexpected data or early EOF).
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns true if the server answered the command with NO or BAD.
    ///
    /// These leave the connection usable, unlike I/O or protocol failures.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::No(_) | Self::Bad(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
