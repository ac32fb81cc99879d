//! The export run: session, extraction, sort, write.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::config::{AccountConfig, ExportOptions};
use crate::export::{ExportSummary, export};
use crate::extract::extract;
use crate::mailbox::MailboxSession;
use crate::progress::{Progress, ProgressSink};
use crate::record::{MessageRecord, sort_by_date};
use crate::{Error, Result};

/// Connects to the account's server and runs [`run_session`].
///
/// # Errors
///
/// Returns the first fatal error of the run; see [`run_session`].
pub async fn export_mailbox(
    account: &AccountConfig,
    options: &ExportOptions,
    progress: &mut dyn ProgressSink,
) -> Result<ExportSummary> {
    let session = MailboxSession::connect(&account.server).await?;
    progress.report(Progress::Connected {
        host: &account.server.host,
    });
    run_session(session, account, options, progress).await
}

/// Exports one folder over an open session.
///
/// Logs in, opens `options.folder` read-only, searches, then fetches and
/// extracts each match one after the other. The session is logged out
/// before anything is written, whether or not collection succeeded. Records
/// are sorted by date and exported to `options.output`.
///
/// A message that cannot be extracted is skipped with a
/// [`Progress::Skipped`] event, unless `options.strict_extraction` is set.
///
/// # Errors
///
/// Any session error aborts the run, as does an export failure or, in
/// strict mode, `Error::Extract`. Nothing is written on error.
pub async fn run_session<S>(
    mut session: MailboxSession<S>,
    account: &AccountConfig,
    options: &ExportOptions,
    progress: &mut dyn ProgressSink,
) -> Result<ExportSummary>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let collected = collect(&mut session, account, options, progress).await;
    session.logout().await;

    let mut records = collected?;
    sort_by_date(&mut records);

    let summary = export(&records, &options.output)?;
    progress.report(Progress::Exported {
        path: &summary.path,
        rows: summary.rows,
    });
    Ok(summary)
}

async fn collect<S>(
    session: &mut MailboxSession<S>,
    account: &AccountConfig,
    options: &ExportOptions,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<MessageRecord>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.authenticate(&account.user, &account.password).await?;
    progress.report(Progress::Authenticated {
        user: &account.user,
    });

    let exists = session.select_folder(&options.folder).await?;
    progress.report(Progress::FolderSelected {
        folder: &options.folder,
        exists,
    });

    let ids = session.search(&options.criteria).await?;
    let total = ids.len();
    progress.report(Progress::SearchFinished { matches: total });

    let mut records = Vec::with_capacity(total);
    for (index, seq) in ids.into_iter().enumerate() {
        let raw = session.fetch(seq).await?;
        match extract(&raw) {
            Ok(record) => {
                progress.report(Progress::Extracted {
                    index,
                    total,
                    record: &record,
                });
                records.push(record);
            }
            Err(source) if options.strict_extraction => {
                return Err(Error::Extract { seq, source });
            }
            Err(error) => {
                warn!(%seq, %error, "skipping message that cannot be extracted");
                progress.report(Progress::Skipped {
                    index,
                    total,
                    seq,
                    error: &error,
                });
            }
        }
    }

    debug!(records = records.len(), skipped = total - records.len(), "collection finished");
    Ok(records)
}
