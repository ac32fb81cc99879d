//! Whole export runs against scripted IMAP conversations.
//!
//! The mock server fails the test on any unexpected client write, so each
//! script also proves that the session is logged out exactly once.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use mailsheet_core::{
    AccountConfig, Error, ExportOptions, ExtractError, MailboxSession, Progress, ProgressSink,
    run_session,
};
use tokio_test::io::{Builder, Mock};

const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] ready\r\n";

const NEWEST: &[u8] = b"Date: Wed, 3 Jan 2024 08:00:00 +0000\r\n\
From: carol@example.com\r\n\
To: me@example.com\r\n\
Subject: third\r\n\
\r\n\
newest";

const OLDEST: &[u8] = b"Date: Mon, 1 Jan 2024 08:00:00 +0000\r\n\
From: alice@example.com\r\n\
To: me@example.com\r\n\
Subject: =?UTF-8?Q?Caf=C3=A9?=\r\n\
\r\n\
oldest";

const MIDDLE: &[u8] = b"Date: Tue, 2 Jan 2024 09:00:00 +0100\r\n\
From: bob@example.com\r\n\
To: me@example.com\r\n\
Subject: second\r\n\
Content-Type: multipart/alternative; boundary=sep\r\n\
\r\n\
--sep\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>middle</p>\r\n\
--sep\r\n\
Content-Type: text/plain\r\n\
\r\n\
middle\r\n\
--sep--\r\n";

const UNDATED: &[u8] = b"From: nobody@example.com\r\nSubject: no date\r\n\r\nbody\r\n";

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl ProgressSink for Recorder {
    fn report(&mut self, event: Progress<'_>) {
        let line = match event {
            Progress::Connected { host } => format!("connected {host}"),
            Progress::Authenticated { user } => format!("authenticated {user}"),
            Progress::FolderSelected { folder, exists } => format!("selected {folder} {exists}"),
            Progress::SearchFinished { matches } => format!("search {matches}"),
            Progress::Extracted { record, .. } => format!("extracted {}", record.subject),
            Progress::Skipped { seq, .. } => format!("skipped {seq}"),
            Progress::Exported { rows, .. } => format!("exported {rows}"),
        };
        self.events.push(line);
    }
}

fn account() -> AccountConfig {
    AccountConfig::from_ini_str(
        "[Gmail]\nuser = me@example.com\npassword = s3cret\nimap_url = imap.example.com\n",
    )
    .unwrap()
}

fn options(output: &Path) -> ExportOptions {
    ExportOptions {
        output: output.to_path_buf(),
        ..ExportOptions::default()
    }
}

/// Login, EXAMINE INBOX and `SEARCH ALL` answered with `ids`.
fn opening(builder: &mut Builder, exists: u32, ids: &str) {
    builder
        .read(GREETING)
        .write(b"A0000 LOGIN me@example.com s3cret\r\n")
        .read(b"A0000 OK Logged in\r\n")
        .write(b"A0001 EXAMINE INBOX\r\n")
        .read(format!("* {exists} EXISTS\r\nA0001 OK [READ-ONLY] Examine completed\r\n").as_bytes())
        .write(b"A0002 SEARCH ALL\r\n")
        .read(format!("* SEARCH{ids}\r\nA0002 OK Search completed\r\n").as_bytes());
}

fn fetch(builder: &mut Builder, tag: &str, seq: u32, raw: &[u8]) {
    let mut reply = format!("* {seq} FETCH (BODY[] {{{}}}\r\n", raw.len()).into_bytes();
    reply.extend_from_slice(raw);
    reply.extend_from_slice(format!(")\r\n{tag} OK Fetch completed\r\n").as_bytes());
    builder
        .write(format!("{tag} FETCH {seq} (BODY.PEEK[])\r\n").as_bytes())
        .read(&reply);
}

fn logout(builder: &mut Builder, tag: &str) -> Mock {
    builder
        .write(format!("{tag} LOGOUT\r\n").as_bytes())
        .read(format!("* BYE Logging out\r\n{tag} OK Logout completed\r\n").as_bytes())
        .build()
}

fn read_rows(path: &Path) -> Vec<Vec<Data>> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range("Sheet1").unwrap();
    range.rows().map(<[Data]>::to_vec).collect()
}

fn column(rows: &[Vec<Data>], index: usize) -> Vec<String> {
    rows[1..].iter().map(|row| row[index].to_string()).collect()
}

#[tokio::test]
async fn exports_all_messages_sorted_by_date() {
    let mut builder = Builder::new();
    opening(&mut builder, 3, " 1 2 3");
    fetch(&mut builder, "A0003", 1, NEWEST);
    fetch(&mut builder, "A0004", 2, OLDEST);
    fetch(&mut builder, "A0005", 3, MIDDLE);
    let mock = logout(&mut builder, "A0006");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    let mut progress = Recorder::default();

    let session = MailboxSession::from_stream(mock).await.unwrap();
    let summary = run_session(session, &account(), &options(&path), &mut progress)
        .await
        .unwrap();
    assert_eq!(summary.rows, 3);

    assert_eq!(
        progress.events,
        vec![
            "authenticated me@example.com",
            "selected INBOX 3",
            "search 3",
            "extracted third",
            "extracted Café",
            "extracted second",
            "exported 3",
        ]
    );

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 4);
    assert_eq!(column(&rows, 3), ["Café", "second", "third"]);
    assert_eq!(
        column(&rows, 1),
        ["alice@example.com", "bob@example.com", "carol@example.com"]
    );
    assert_eq!(column(&rows, 4), ["oldest", "middle", "newest"]);
}

#[tokio::test]
async fn empty_search_writes_header_only() {
    let mut builder = Builder::new();
    opening(&mut builder, 0, "");
    let mock = logout(&mut builder, "A0003");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    let session = MailboxSession::from_stream(mock).await.unwrap();
    let summary = run_session(session, &account(), &options(&path), &mut Recorder::default())
        .await
        .unwrap();

    assert_eq!(summary.rows, 0);
    assert_eq!(read_rows(&path).len(), 1);
}

#[tokio::test]
async fn failed_fetch_still_logs_out_and_writes_nothing() {
    let mut builder = Builder::new();
    opening(&mut builder, 2, " 1 2");
    fetch(&mut builder, "A0003", 1, OLDEST);
    builder
        .write(b"A0004 FETCH 2 (BODY.PEEK[])\r\n")
        .read(b"A0004 NO Some messages could not be FETCHed\r\n");
    let mock = logout(&mut builder, "A0005");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    let session = MailboxSession::from_stream(mock).await.unwrap();
    let err = run_session(session, &account(), &options(&path), &mut Recorder::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch { seq, .. } if seq.get() == 2));
    assert!(!path.exists());
}

#[tokio::test]
async fn rejected_login_still_logs_out() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN me@example.com s3cret\r\n")
        .read(b"A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
        .write(b"A0001 LOGOUT\r\n")
        .read(b"* BYE\r\nA0001 OK done\r\n")
        .build();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    let session = MailboxSession::from_stream(mock).await.unwrap();
    let err = run_session(session, &account(), &options(&path), &mut Recorder::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authentication(_)));
    assert!(!path.exists());
}

#[tokio::test]
async fn undated_message_is_skipped() {
    let mut builder = Builder::new();
    opening(&mut builder, 2, " 1 2");
    fetch(&mut builder, "A0003", 1, UNDATED);
    fetch(&mut builder, "A0004", 2, OLDEST);
    let mock = logout(&mut builder, "A0005");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    let mut progress = Recorder::default();
    let session = MailboxSession::from_stream(mock).await.unwrap();
    let summary = run_session(session, &account(), &options(&path), &mut progress)
        .await
        .unwrap();

    assert_eq!(summary.rows, 1);
    assert!(progress.events.contains(&"skipped 1".to_string()));
    assert_eq!(column(&read_rows(&path), 3), ["Café"]);
}

#[tokio::test]
async fn strict_extraction_aborts() {
    let mut builder = Builder::new();
    opening(&mut builder, 1, " 1");
    fetch(&mut builder, "A0003", 1, UNDATED);
    let mock = logout(&mut builder, "A0004");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    let options = ExportOptions {
        strict_extraction: true,
        ..options(&path)
    };
    let session = MailboxSession::from_stream(mock).await.unwrap();
    let err = run_session(session, &account(), &options, &mut Recorder::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Extract {
            source: ExtractError::MissingDate,
            ..
        }
    ));
    assert!(!path.exists());
}
