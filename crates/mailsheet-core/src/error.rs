//! Error types for the core library.

use mailsheet_imap::SeqNum;
use thiserror::Error;

/// Errors that end an export run.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file is missing, unreadable or incomplete.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server could not be reached, TLS failed, or the greeting was a
    /// refusal.
    #[error("Connection failed: {0}")]
    Connection(#[source] mailsheet_imap::Error),

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] mailsheet_imap::Error),

    /// The folder does not exist or cannot be opened.
    #[error("Folder not found: {folder}: {source}")]
    FolderNotFound {
        /// Folder name as given.
        folder: String,
        /// Server response.
        #[source]
        source: mailsheet_imap::Error,
    },

    /// The server rejected the search criteria.
    #[error("Search failed: {0}")]
    Search(#[source] mailsheet_imap::Error),

    /// A message could not be retrieved.
    #[error("Fetch of message {seq} failed: {source}")]
    Fetch {
        /// Sequence number of the message.
        seq: SeqNum,
        /// Underlying failure.
        #[source]
        source: mailsheet_imap::Error,
    },

    /// A message could not be turned into a record.
    #[error("Message {seq}: {source}")]
    Extract {
        /// Sequence number of the message.
        seq: SeqNum,
        /// Underlying failure.
        #[source]
        source: ExtractError,
    },

    /// The spreadsheet could not be written.
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    /// A session operation was called in the wrong state.
    #[error("Invalid session state: {0}")]
    InvalidState(&'static str),
}

/// Why a message could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The message has no `Date` header.
    #[error("missing Date header")]
    MissingDate,

    /// The `Date` header could not be parsed.
    #[error("invalid Date header: {0:?}")]
    InvalidDate(String),

    /// The subject names a charset that cannot be decoded.
    #[error("cannot decode subject: {0}")]
    Decode(#[from] mailsheet_mime::Error),
}

/// Why the spreadsheet could not be written.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Building the workbook failed.
    #[error("workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// Writing the temporary file failed.
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Moving the temporary file over the target failed.
    #[error("rename: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
