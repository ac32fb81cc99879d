//! Exported rows.

use chrono::{DateTime, FixedOffset};

/// Fields extracted from one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// `Date` header, with its original offset.
    pub date: DateTime<FixedOffset>,
    /// `From` header, unfolded but otherwise verbatim.
    pub from: String,
    /// `To` header, unfolded but otherwise verbatim.
    pub to: String,
    /// Decoded `Subject` header.
    pub subject: String,
    /// Text of the first `text/plain` part, `None` when there is none.
    pub body: Option<String>,
}

/// Sorts records by instant, oldest first. Records at the same instant keep
/// their relative order.
pub fn sort_by_date(records: &mut [MessageRecord]) {
    records.sort_by_key(|record| record.date);
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
    use proptest::prelude::*;

    fn record(date: &str, subject: &str) -> MessageRecord {
        MessageRecord {
            date: DateTime::parse_from_rfc2822(date).unwrap(),
            from: String::new(),
            to: String::new(),
            subject: subject.to_string(),
            body: None,
        }
    }

    #[test]
    fn sorts_by_instant_not_wall_clock() {
        let mut records = vec![
            record("Mon, 1 Jan 2024 10:00:00 +0000", "b"),
            record("Mon, 1 Jan 2024 10:30:00 +0200", "a"),
            record("Mon, 1 Jan 2024 09:00:00 -0500", "c"),
        ];
        sort_by_date(&mut records);
        let order: Vec<_> = records.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn ties_keep_server_order() {
        let mut records = vec![
            record("Mon, 1 Jan 2024 12:00:00 +0100", "first"),
            record("Mon, 1 Jan 2024 11:00:00 +0000", "second"),
            record("Sun, 31 Dec 2023 00:00:00 +0000", "oldest"),
        ];
        sort_by_date(&mut records);
        let order: Vec<_> = records.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(order, ["oldest", "first", "second"]);
    }

    proptest! {
        #[test]
        fn sorted_output_is_ordered_and_complete(
            stamps in proptest::collection::vec((0i64..4_000_000_000, -720i32..=840), 0..40)
        ) {
            let mut records: Vec<MessageRecord> = stamps
                .iter()
                .enumerate()
                .map(|(i, &(secs, minutes))| MessageRecord {
                    date: DateTime::from_timestamp(secs, 0)
                        .unwrap()
                        .with_timezone(&FixedOffset::east_opt(minutes * 60).unwrap()),
                    from: String::new(),
                    to: String::new(),
                    subject: i.to_string(),
                    body: None,
                })
                .collect();
            sort_by_date(&mut records);

            prop_assert_eq!(records.len(), stamps.len());
            for pair in records.windows(2) {
                prop_assert!(pair[0].date <= pair[1].date);
                if pair[0].date == pair[1].date {
                    let a: usize = pair[0].subject.parse().unwrap();
                    let b: usize = pair[1].subject.parse().unwrap();
                    prop_assert!(a < b);
                }
            }
        }
    }
}
