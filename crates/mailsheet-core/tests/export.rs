//! Workbooks written by `export`, read back with calamine.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use calamine::{Data, DataType, Reader, Xlsx, open_workbook};
use chrono::DateTime;
use mailsheet_core::export::MAX_CELL_CHARS;
use mailsheet_core::{MessageRecord, export, normalize_date};

fn record(date: &str, from: &str, subject: &str, body: Option<&str>) -> MessageRecord {
    MessageRecord {
        date: DateTime::parse_from_rfc2822(date).unwrap(),
        from: from.to_string(),
        to: "team@example.com".to_string(),
        subject: subject.to_string(),
        body: body.map(str::to_string),
    }
}

fn read_rows(path: &Path) -> Vec<Vec<Data>> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range("Sheet1").unwrap();
    range.rows().map(<[Data]>::to_vec).collect()
}

fn text(value: &str) -> Data {
    Data::String(value.to_string())
}

#[test]
fn round_trip_reproduces_columns() {
    let records = vec![
        record(
            "Tue, 2 Jan 2024 09:15:42 +0100",
            "Alice <alice@example.com>",
            "Café",
            Some("Hello\nworld"),
        ),
        record("Wed, 3 Jan 2024 18:00:00 -0500", "bob@example.com", "html only", None),
    ];
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");

    let summary = export(&records, &path).unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.truncated_cells, 0);

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        vec![text("date"), text("from"), text("to"), text("subject"), text("body")]
    );

    for (row, record) in rows[1..].iter().zip(&records) {
        let written = row[0].as_datetime().unwrap();
        assert_eq!(written, normalize_date(&record.date));
        assert_eq!(row[1], text(&record.from));
        assert_eq!(row[2], text(&record.to));
        assert_eq!(row[3], text(&record.subject));
    }
    assert_eq!(rows[1][4], text("Hello\nworld"));
    assert_eq!(rows[2][4], Data::Empty);

    assert_eq!(
        normalize_date(&records[0].date).to_string(),
        "2024-01-02 08:15:42"
    );
}

#[test]
fn same_records_same_bytes() {
    let records = vec![
        record("Mon, 1 Jan 2024 00:00:00 +0000", "a@example.com", "one", Some("1")),
        record("Mon, 1 Jan 2024 00:00:01 +0000", "b@example.com", "two", None),
    ];
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.xlsx");
    let second = dir.path().join("second.xlsx");

    export(&records, &first).unwrap();
    export(&records, &second).unwrap();
    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn no_records_gives_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");

    export(&[], &path).unwrap();
    let rows = read_rows(&path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], text("date"));
    assert_eq!(rows[0][4], text("body"));
}

#[test]
fn oversized_body_is_truncated() {
    let body = "x".repeat(MAX_CELL_CHARS + 100);
    let records = vec![record(
        "Mon, 1 Jan 2024 00:00:00 +0000",
        "a@example.com",
        "big",
        Some(&body),
    )];
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.xlsx");

    let summary = export(&records, &path).unwrap();
    assert_eq!(summary.truncated_cells, 1);
    let rows = read_rows(&path);
    assert_eq!(rows[1][4], text(&body[..MAX_CELL_CHARS]));
}

#[test]
fn dates_before_1900_are_text() {
    let records = vec![record(
        "Sat, 1 Jun 1850 12:00:00 +0000",
        "old@example.com",
        "history",
        None,
    )];
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.xlsx");

    export(&records, &path).unwrap();
    let rows = read_rows(&path);
    assert_eq!(rows[1][0], text("1850-06-01 12:00:00"));
}
