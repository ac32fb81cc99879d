//! mailsheet - exports one IMAP folder to an xlsx spreadsheet.
//!
//! Reads the account from `config.ini` in the working directory, asks for
//! the folder, search criteria and output file, then runs the export.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use mailsheet_core::config::{DEFAULT_CRITERIA, DEFAULT_FOLDER, DEFAULT_OUTPUT};
use mailsheet_core::{AccountConfig, ExportOptions, TracingProgress, export_mailbox};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_FILE: &str = "config.ini";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsheet=info,mailsheet_core=info,mailsheet_imap=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let account = AccountConfig::load(CONFIG_FILE)
        .with_context(|| format!("loading account from {CONFIG_FILE}"))?;
    info!(user = %account.user, server = %account.server, "account loaded");

    let options = ask_options().context("reading answers from stdin")?;

    let summary = export_mailbox(&account, &options, &mut TracingProgress)
        .await
        .with_context(|| format!("exporting {} from {}", options.folder, account.server))?;

    info!(
        path = %summary.path.display(),
        rows = summary.rows,
        "done"
    );
    Ok(())
}

fn ask_options() -> io::Result<ExportOptions> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let folder = ask(&mut input, "Folder", DEFAULT_FOLDER)?;
    let criteria = ask(&mut input, "Search criteria", DEFAULT_CRITERIA)?;
    let output = ask(&mut input, "Output file", DEFAULT_OUTPUT)?;
    Ok(ExportOptions::from_answers(&folder, &criteria, &output))
}

/// Prints a prompt and reads one line. End of input counts as an empty
/// answer.
fn ask(input: &mut impl BufRead, question: &str, default: &str) -> io::Result<String> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{question} [{default}]: ")?;
    stdout.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}
