//! Header fields.

/// Header fields of a message or body part, in their original order.
///
/// Names are matched case-insensitively. Values are unfolded and trimmed but
/// otherwise kept verbatim (no RFC 2047 decoding).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// First value of the named field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of the named field, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a raw header block.
    ///
    /// Bytes are read as UTF-8 with invalid sequences replaced. Continuation
    /// lines (leading space or tab) are joined to the previous field with the
    /// line break removed. Lines without a colon are skipped.
    #[must_use]
    pub fn parse(block: &[u8]) -> Self {
        let text = String::from_utf8_lossy(block);
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(line);
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value.trim().to_string());
            }

            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim_end();
                if !name.is_empty() && !name.contains(' ') {
                    current = Some((name.to_string(), value.to_string()));
                }
            }
        }

        if let Some((name, value)) = current {
            headers.add(name, value.trim().to_string());
        }
        headers
    }
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

    #[test]
    fn lookup_is_case_insensitive() {
        let headers = Headers::parse(b"Subject: Hello\r\nFROM: a@example.com\r\n");
        assert_eq!(headers.get("subject"), Some("Hello"));
        assert_eq!(headers.get("From"), Some("a@example.com"));
        assert_eq!(headers.get("To"), None);
    }

    #[test]
    fn folded_values_are_unfolded() {
        let headers = Headers::parse(b"Subject: a long\r\n  subject line\r\nTo: x\r\n");
        assert_eq!(headers.get("subject"), Some("a long  subject line"));
        assert_eq!(headers.get("to"), Some("x"));
    }

    #[test]
    fn repeated_fields_keep_order() {
        let headers = Headers::parse(b"Received: one\nReceived: two\nX: y\n");
        let received: Vec<&str> = headers.get_all("received").collect();
        assert_eq!(received, vec!["one", "two"]);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let headers = Headers::parse(b"From sender Mon Jan 1\r\nnot a header\r\nDate: today\r\n");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("date"), Some("today"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let headers = Headers::parse(b"Subject: caf\xe9\r\n");
        assert_eq!(headers.get("subject"), Some("caf\u{fffd}"));
    }

    #[test]
    fn empty_value() {
        let headers = Headers::parse(b"Subject:\r\nTo: b\r\n");
        assert_eq!(headers.get("subject"), Some(""));
    }
}
