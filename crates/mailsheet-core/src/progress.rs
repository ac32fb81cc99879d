//! Progress reporting.
//!
//! The pipeline never prints; it reports [`Progress`] events to a
//! [`ProgressSink`]. [`TracingProgress`] turns them into log lines.

use std::path::Path;

use mailsheet_imap::SeqNum;
use tracing::info;

use crate::error::ExtractError;
use crate::record::MessageRecord;

/// Characters of the body shown when a message has been extracted.
const BODY_PREVIEW_CHARS: usize = 50;

/// One step of an export run.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// The server greeted us.
    Connected {
        /// Server host.
        host: &'a str,
    },
    /// Login succeeded.
    Authenticated {
        /// Login name.
        user: &'a str,
    },
    /// The folder is open.
    FolderSelected {
        /// Folder name.
        folder: &'a str,
        /// Messages in the folder.
        exists: u32,
    },
    /// The search returned.
    SearchFinished {
        /// Number of matching messages.
        matches: usize,
    },
    /// A message became a record.
    Extracted {
        /// Zero-based position among the matches.
        index: usize,
        /// Number of matches.
        total: usize,
        /// The new record.
        record: &'a MessageRecord,
    },
    /// A message was left out.
    Skipped {
        /// Zero-based position among the matches.
        index: usize,
        /// Number of matches.
        total: usize,
        /// Sequence number of the message.
        seq: SeqNum,
        /// Why it could not be extracted.
        error: &'a ExtractError,
    },
    /// The spreadsheet is written.
    Exported {
        /// Destination file.
        path: &'a Path,
        /// Data rows written.
        rows: usize,
    },
}

/// Receives progress events.
pub trait ProgressSink {
    /// Called once per event, in order.
    fn report(&mut self, event: Progress<'_>);
}

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&mut self, event: Progress<'_>) {
        match event {
            Progress::Connected { host } => info!(host, "connected"),
            Progress::Authenticated { user } => info!(user, "authenticated"),
            Progress::FolderSelected { folder, exists } => {
                info!(folder, exists, "folder selected");
            }
            Progress::SearchFinished { matches } => info!(matches, "search finished"),
            Progress::Extracted {
                index,
                total,
                record,
            } => {
                let preview: String = record
                    .body
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .take(BODY_PREVIEW_CHARS)
                    .collect();
                info!(
                    position = index + 1,
                    total,
                    date = %record.date,
                    from = %record.from,
                    subject = %record.subject,
                    body = ?preview,
                    "message extracted"
                );
            }
            Progress::Skipped {
                index,
                total,
                seq,
                error,
            } => {
                info!(position = index + 1, total, %seq, %error, "message skipped");
            }
            Progress::Exported { path, rows } => {
                info!(path = %path.display(), rows, "export written");
            }
        }
    }
}
