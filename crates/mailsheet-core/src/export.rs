//! Spreadsheet output.

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, SubsecRound};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet};
use tracing::{debug, warn};

use crate::Result;
use crate::error::ExportError;
use crate::record::MessageRecord;

/// Header row, in column order.
pub const COLUMNS: [&str; 5] = ["date", "from", "to", "subject", "body"];

/// Longest text a spreadsheet cell can hold, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Number format of the date column; also the text form of dates a
/// spreadsheet cannot represent.
pub const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DATE_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What [`export`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Destination file.
    pub path: PathBuf,
    /// Data rows written, header excluded.
    pub rows: usize,
    /// Cells cut down to [`MAX_CELL_CHARS`].
    pub truncated_cells: usize,
}

/// Converts to UTC, drops the offset and sub-second precision.
#[must_use]
pub fn normalize_date(date: &DateTime<FixedOffset>) -> NaiveDateTime {
    date.naive_utc().trunc_subsecs(0)
}

/// Writes `records` to `path` as an `.xlsx` workbook, in the given order.
///
/// The workbook is rendered in memory, written to a temporary file next to
/// `path` and renamed over it, so `path` is either fully written or left
/// untouched. The same records always produce the same bytes.
///
/// # Errors
///
/// Returns `Error::Export` if the workbook cannot be built or the file
/// cannot be written.
pub fn export(records: &[MessageRecord], path: &Path) -> Result<ExportSummary> {
    let (buffer, truncated_cells) = render(records)?;
    write_atomically(path, &buffer)?;
    debug!(path = %path.display(), bytes = buffer.len(), "workbook written");

    Ok(ExportSummary {
        path: path.to_path_buf(),
        rows: records.len(),
        truncated_cells,
    })
}

fn render(records: &[MessageRecord]) -> std::result::Result<(Vec<u8>, usize), ExportError> {
    let mut workbook = Workbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let bold = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let mut truncated = 0;

    let sheet = workbook.add_worksheet();
    for (col, name) in (0u16..).zip(COLUMNS) {
        sheet.write_string_with_format(0, col, name, &bold)?;
    }
    sheet.set_column_width(0, 20)?;

    for (row, record) in (1u32..).zip(records) {
        write_date(sheet, row, &normalize_date(&record.date), &date_format)?;

        let texts = [
            record.from.as_str(),
            record.to.as_str(),
            record.subject.as_str(),
            record.body.as_deref().unwrap_or_default(),
        ];
        for (col, text) in (1u16..).zip(texts) {
            if text.is_empty() {
                continue;
            }
            let text = fit_cell(text);
            if matches!(text, Cow::Owned(_)) {
                warn!(row, column = COLUMNS[usize::from(col)], "cell truncated to {MAX_CELL_CHARS} characters");
                truncated += 1;
            }
            sheet.write_string(row, col, text.as_ref())?;
        }
    }

    Ok((workbook.save_to_buffer()?, truncated))
}

fn write_date(
    sheet: &mut Worksheet,
    row: u32,
    date: &NaiveDateTime,
    format: &Format,
) -> std::result::Result<(), ExportError> {
    if (1900..=9999).contains(&date.year()) {
        sheet.write_datetime_with_format(row, 0, date, format)?;
    } else {
        let text = date.format(DATE_TEXT_FORMAT).to_string();
        warn!(row, date = %text, "date outside spreadsheet range, written as text");
        sheet.write_string(row, 0, &text)?;
    }
    Ok(())
}

fn fit_cell(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => Cow::Owned(text[..cut].to_string()),
        None => Cow::Borrowed(text),
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::result::Result<(), ExportError> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let existing = std::fs::metadata(path).ok().map(|meta| meta.permissions());

    let mut builder = tempfile::Builder::new();
    // Plain files get 0666 minus the umask, like `File::create`.
    #[cfg(unix)]
    builder.permissions(std::os::unix::fs::PermissionsExt::from_mode(0o666));
    let mut file = builder.tempfile_in(dir)?;

    if let Some(permissions) = existing {
        file.as_file().set_permissions(permissions)?;
    }
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
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
    use crate::Error;

    #[test]
    fn normalizes_to_utc_whole_seconds() {
        let date = DateTime::parse_from_rfc3339("2024-03-10T01:30:15.750+02:00").unwrap();
        assert_eq!(
            normalize_date(&date).to_string(),
            "2024-03-09 23:30:15"
        );
    }

    #[test]
    fn fit_cell_counts_characters() {
        let short = "é".repeat(MAX_CELL_CHARS);
        assert!(matches!(fit_cell(&short), Cow::Borrowed(_)));

        let long = "é".repeat(MAX_CELL_CHARS + 5);
        let fitted = fit_cell(&long);
        assert_eq!(fitted.chars().count(), MAX_CELL_CHARS);
        assert!(matches!(fitted, Cow::Owned(_)));
    }

    #[test]
    fn missing_directory_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("out.xlsx");
        let err = export(&[], &path).unwrap_err();
        assert!(matches!(err, Error::Export(ExportError::Io(_))));
        assert!(!path.exists());
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        std::fs::write(&path, b"stale").unwrap();

        let summary = export(&[], &path).unwrap();
        assert_eq!(summary.rows, 0);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn new_file_gets_default_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference");
        std::fs::File::create(&reference).unwrap();
        let path = dir.path().join("out.xlsx");

        export(&[], &path).unwrap();
        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&reference));
    }

    #[cfg(unix)]
    #[test]
    fn replaced_file_keeps_its_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        std::fs::write(&path, b"stale").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        export(&[], &path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
