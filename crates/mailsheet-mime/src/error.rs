//! Error types for MIME decoding.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An encoded-word names a charset no decoder is known for.
    #[error("Unknown charset: {0}")]
    UnknownCharset(String),

    /// A Content-Type value could not be parsed.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// A Date header could not be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
