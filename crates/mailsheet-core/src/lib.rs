//! # mailsheet-core
//!
//! Exports the messages of one IMAP folder to a spreadsheet.
//!
//! This crate provides:
//! - [`AccountConfig`] and [`ExportOptions`]: what to connect to and what to
//!   export
//! - [`MailboxSession`]: a read-only IMAP session that can always be logged
//!   out, whatever state it ended in
//! - [`extract`]: turns raw message bytes into a [`MessageRecord`]
//! - [`export`]: writes records to an `.xlsx` file atomically
//! - [`export_mailbox`]: the whole run, reporting to a [`ProgressSink`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod export;
pub mod extract;
pub mod mailbox;
pub mod pipeline;
pub mod progress;
pub mod record;

pub use config::{AccountConfig, ExportOptions, ServerAddress};
pub use error::{Error, ExportError, ExtractError, Result};
pub use export::{ExportSummary, export, normalize_date};
pub use extract::extract;
pub use mailbox::MailboxSession;
pub use pipeline::{export_mailbox, run_session};
pub use progress::{Progress, ProgressSink, TracingProgress};
pub use record::{MessageRecord, sort_by_date};
