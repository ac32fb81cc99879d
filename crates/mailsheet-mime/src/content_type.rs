//! The Content-Type header (RFC 2045 section 5).

use crate::error::{Error, Result};

/// A parsed media type with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Top-level type, lowercase (`text`, `multipart`, ...).
    pub mime_type: String,
    /// Subtype, lowercase (`plain`, `alternative`, ...).
    pub subtype: String,
    /// Parameters with lowercase names and unquoted values.
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// `text/plain; charset=us-ascii`, the default for parts without a
    /// usable Content-Type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self {
            mime_type: "text".to_string(),
            subtype: "plain".to_string(),
            parameters: vec![("charset".to_string(), "us-ascii".to_string())],
        }
    }

    /// Parses a header value such as `multipart/mixed; boundary="abc"`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidContentType` if there is no `type/subtype`.
    pub fn parse(value: &str) -> Result<Self> {
        let mut segments = split_parameters(value).into_iter();
        let essence = segments.next().unwrap_or_default();

        let (mime_type, subtype) = essence
            .split_once('/')
            .map(|(t, s)| (t.trim(), s.trim()))
            .filter(|(t, s)| is_token(t) && is_token(s))
            .ok_or_else(|| Error::InvalidContentType(value.to_string()))?;

        let parameters = segments
            .filter_map(|segment| {
                let (name, value) = segment.split_once('=')?;
                let name = name.trim().to_ascii_lowercase();
                (!name.is_empty()).then(|| (name, unquote(value.trim())))
            })
            .collect();

        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters,
        })
    }

    /// Returns true if this is exactly `mime_type/subtype` (case-insensitive).
    #[must_use]
    pub fn is(&self, mime_type: &str, subtype: &str) -> bool {
        self.mime_type.eq_ignore_ascii_case(mime_type) && self.subtype.eq_ignore_ascii_case(subtype)
    }

    /// Returns true for any `multipart/*` type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.mime_type == "multipart"
    }

    /// Value of the named parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The multipart boundary, if present and non-empty.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary").filter(|b| !b.is_empty())
    }

    /// The declared charset.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.mime_type, self.subtype)
    }
}

/// Splits on `;` outside quoted strings and drops `(comments)`.
fn split_parameters(value: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut comment_depth = 0usize;
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => {
                current.push(c);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '"' if comment_depth == 0 => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '(' if !in_quotes => comment_depth += 1,
            ')' if !in_quotes && comment_depth > 0 => comment_depth -= 1,
            _ if comment_depth > 0 => {}
            ';' if !in_quotes => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"') else {
        return value.to_string();
    };
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b))
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
    fn simple_type_is_lowercased() {
        let ct = ContentType::parse("Text/PLAIN").unwrap();
        assert!(ct.is("text", "plain"));
        assert_eq!(ct.to_string(), "text/plain");
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn quoted_boundary_with_semicolon() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"a;b=c\"; charset=UTF-8").unwrap();
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("a;b=c"));
        assert_eq!(ct.charset(), Some("UTF-8"));
    }

    #[test]
    fn parameter_names_are_case_insensitive() {
        let ct = ContentType::parse("text/plain; Charset=\"iso-8859-1\"").unwrap();
        assert_eq!(ct.charset(), Some("iso-8859-1"));
    }

    #[test]
    fn comments_are_ignored() {
        let ct = ContentType::parse("text/plain (plain text); charset=us-ascii (ascii)").unwrap();
        assert!(ct.is("text", "plain"));
        assert_eq!(ct.charset(), Some("us-ascii"));
    }

    #[test]
    fn escaped_quote_in_value() {
        let ct = ContentType::parse(r#"text/plain; name="a \"b\".txt""#).unwrap();
        assert_eq!(ct.parameter("name"), Some("a \"b\".txt"));
    }

    #[test]
    fn missing_subtype_is_invalid() {
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("/plain").is_err());
    }

    #[test]
    fn empty_boundary_is_absent() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"\"").unwrap();
        assert_eq!(ct.boundary(), None);
    }
}
