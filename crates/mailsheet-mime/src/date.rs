//! `Date:` header parsing.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::error::{Error, Result};

/// Layouts tried after strict RFC 2822, for dates real mailers produce.
const ZONED_FALLBACKS: &[&str] = &[
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M %z",
    "%a %d %b %Y %H:%M:%S %z",
    "%a, %d %b %y %H:%M:%S %z",
    "%a, %d %B %Y %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%a %b %d %H:%M:%S %Y %z",
];

/// Layouts without a zone; the time is taken as UTC.
const NAIVE_FALLBACKS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a %b %d %H:%M:%S %Y",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a `Date:` header value.
///
/// Comments such as `(UTC)` or `(CEST)` are removed and runs of whitespace
/// collapsed before trying RFC 2822 and then a few common deviations
/// (missing weekday, missing seconds, ISO 8601, no zone).
///
/// # Errors
///
/// Returns `Error::InvalidDate` with the original value if no layout
/// matches.
pub fn parse_date(value: &str) -> Result<DateTime<FixedOffset>> {
    let cleaned = clean(value);

    if let Ok(date) = DateTime::parse_from_rfc2822(&cleaned) {
        return Ok(date);
    }
    for layout in ZONED_FALLBACKS {
        if let Ok(date) = DateTime::parse_from_str(&cleaned, layout) {
            return Ok(date);
        }
    }
    for layout in NAIVE_FALLBACKS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&cleaned, layout) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    Err(Error::InvalidDate(value.to_string()))
}

/// Drops `(comments)` (nested allowed) and collapses whitespace.
fn clean(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth > 0 => {}
            _ => out.push(c),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
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
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn rfc2822_with_offset() {
        let date = parse_date("Tue, 1 Jul 2003 10:52:37 +0200").unwrap();
        assert_eq!(date.offset().local_minus_utc(), 7200);
        assert_eq!(date.with_timezone(&Utc), utc(2003, 7, 1, 8, 52, 37));
    }

    #[test]
    fn trailing_zone_comment() {
        let date = parse_date("Mon, 15 Jan 2024 09:30:00 +0000 (UTC)").unwrap();
        assert_eq!(date.with_timezone(&Utc), utc(2024, 1, 15, 9, 30, 0));
    }

    #[test]
    fn extra_whitespace() {
        let date = parse_date("  Mon,  15 Jan 2024   09:30:00   -0500 ").unwrap();
        assert_eq!(date.with_timezone(&Utc), utc(2024, 1, 15, 14, 30, 0));
    }

    #[test]
    fn missing_weekday() {
        let date = parse_date("15 Jan 2024 09:30:00 +0100").unwrap();
        assert_eq!(date.with_timezone(&Utc), utc(2024, 1, 15, 8, 30, 0));
    }

    #[test]
    fn missing_seconds() {
        let date = parse_date("Mon, 15 Jan 2024 09:30 +0000").unwrap();
        assert_eq!(date.with_timezone(&Utc), utc(2024, 1, 15, 9, 30, 0));
    }

    #[test]
    fn obsolete_zone_name() {
        let date = parse_date("Mon, 15 Jan 2024 09:30:00 GMT").unwrap();
        assert_eq!(date.with_timezone(&Utc), utc(2024, 1, 15, 9, 30, 0));
    }

    #[test]
    fn no_zone_is_utc() {
        let date = parse_date("Mon, 15 Jan 2024 09:30:00").unwrap();
        assert_eq!(date.offset().local_minus_utc(), 0);
        assert_eq!(date.with_timezone(&Utc), utc(2024, 1, 15, 9, 30, 0));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(
            parse_date("sometime last week"),
            Err(Error::InvalidDate("sometime last week".to_string()))
        );
        assert!(parse_date("").is_err());
    }
}
