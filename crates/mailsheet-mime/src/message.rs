//! Message structure: headers, body parts and the part tree.

use std::fmt;

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::header::Headers;

/// Nesting beyond this depth is treated as an opaque leaf.
const MAX_DEPTH: usize = 64;

/// Content-Transfer-Encoding of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEncoding {
    /// `7bit`, also the default.
    SevenBit,
    /// `8bit`.
    EightBit,
    /// `binary`.
    Binary,
    /// `quoted-printable`.
    QuotedPrintable,
    /// `base64`.
    Base64,
    /// Anything else; the body is passed through untouched.
    Other(String),
}

impl TransferEncoding {
    /// Parses a header value (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "" | "7bit" => Self::SevenBit,
            "8bit" => Self::EightBit,
            "binary" => Self::Binary,
            "quoted-printable" => Self::QuotedPrintable,
            "base64" => Self::Base64,
            _ => Self::Other(lower),
        }
    }

    /// Undoes the encoding.
    ///
    /// Base64 that cannot be decoded even leniently yields the raw bytes.
    #[must_use]
    pub fn decode(&self, raw: &[u8]) -> Vec<u8> {
        match self {
            Self::Base64 => decode_base64(raw).unwrap_or_else(|| raw.to_vec()),
            Self::QuotedPrintable => decode_quoted_printable(raw),
            _ => raw.to_vec(),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => f.write_str("7bit"),
            Self::EightBit => f.write_str("8bit"),
            Self::Binary => f.write_str("binary"),
            Self::QuotedPrintable => f.write_str("quoted-printable"),
            Self::Base64 => f.write_str("base64"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// One MIME entity.
///
/// Multipart entities hold their sub-parts in `children`; a `message/rfc822`
/// entity holds the enclosed message as its single child. Leaves keep their
/// raw (still transfer-encoded) body.
#[derive(Debug, Clone)]
pub struct Part {
    headers: Headers,
    content_type: ContentType,
    body: Vec<u8>,
    children: Vec<Part>,
}

impl Part {
    fn parse(raw: &[u8], default_type: &ContentType, depth: usize) -> Self {
        let (header_block, body) = split_head(raw);
        let headers = Headers::parse(header_block);
        let content_type = headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
            .unwrap_or_else(|| default_type.clone());

        let mut part = Self {
            headers,
            content_type,
            body: body.to_vec(),
            children: Vec::new(),
        };
        if depth >= MAX_DEPTH {
            return part;
        }

        if part.content_type.is_multipart() {
            if let Some(boundary) = part.content_type.boundary() {
                let child_default = if part.content_type.subtype == "digest" {
                    message_rfc822()
                } else {
                    ContentType::text_plain()
                };
                part.children = split_multipart(&part.body, boundary)
                    .into_iter()
                    .map(|chunk| Self::parse(chunk, &child_default, depth + 1))
                    .collect();
            }
        } else if part.content_type.is("message", "rfc822") {
            let inner = part.decoded_body();
            part.children = vec![Self::parse(&inner, &ContentType::text_plain(), depth + 1)];
        }
        part
    }

    /// Header fields of this part.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Effective content type (`text/plain` when missing or malformed).
    #[must_use]
    pub const fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Declared transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Raw body bytes, still transfer-encoded.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body with the transfer encoding undone.
    #[must_use]
    pub fn decoded_body(&self) -> Vec<u8> {
        self.transfer_encoding().decode(&self.body)
    }

    /// Direct sub-parts.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// This part and all its descendants, depth-first, parents before
    /// children.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Pre-order iterator over a part tree.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<&'a Part>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Part;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        self.stack.extend(part.children.iter().rev());
        Some(part)
    }
}

/// A parsed message: the root entity of the part tree.
#[derive(Debug, Clone)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses raw message bytes.
    ///
    /// Never fails: headers end at the first empty line, a missing or
    /// malformed Content-Type means `text/plain`, multipart bodies without a
    /// boundary stay leaves, and an unterminated multipart keeps its last
    /// part.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self {
            root: Part::parse(raw, &ContentType::text_plain(), 0),
        }
    }

    /// The top-level entity.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Top-level header fields.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// First value of a top-level header, unfolded but not decoded.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.root.headers.get(name)
    }

    /// All entities, depth-first in pre-order, starting with the message.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        self.root.walk()
    }

    /// The first entity whose content type is exactly `text/plain`.
    #[must_use]
    pub fn first_text_plain(&self) -> Option<&Part> {
        self.walk().find(|part| part.content_type.is("text", "plain"))
    }
}

fn message_rfc822() -> ContentType {
    ContentType {
        mime_type: "message".to_string(),
        subtype: "rfc822".to_string(),
        parameters: Vec::new(),
    }
}

/// Splits an entity at the first empty line into header block and body.
fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut pos = 0;
    while pos < raw.len() {
        let Some(offset) = raw[pos..].iter().position(|&b| b == b'\n') else {
            return (raw, &[]);
        };
        let line_end = pos + offset;
        let line = &raw[pos..line_end];
        if line.is_empty() || line == b"\r" {
            return (&raw[..pos], &raw[line_end + 1..]);
        }
        pos = line_end + 1;
    }
    (raw, &[])
}

/// Splits a multipart body into its encapsulated parts (RFC 2046 section
/// 5.1.1). Preamble and epilogue are dropped; the line break before each
/// delimiter belongs to the delimiter.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut pos = 0;

    loop {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |offset| pos + offset);
        let line = trim_line(&body[pos..line_end]);

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let closing = rest == b"--";
            if rest.is_empty() || closing {
                if let Some(start) = part_start {
                    parts.push(strip_line_break(&body[start..pos]));
                }
                if closing {
                    return parts;
                }
                part_start = Some((line_end + 1).min(body.len()));
            }
        }

        if line_end >= body.len() {
            break;
        }
        pos = line_end + 1;
    }

    if let Some(start) = part_start {
        parts.push(&body[start..]);
    }
    parts
}

fn trim_line(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &line[..end]
}

fn strip_line_break(chunk: &[u8]) -> &[u8] {
    let chunk = chunk.strip_suffix(b"\n").unwrap_or(chunk);
    chunk.strip_suffix(b"\r").unwrap_or(chunk)
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

    fn types(message: &Message) -> Vec<String> {
        message.walk().map(|p| p.content_type().to_string()).collect()
    }

    #[test]
    fn single_part_defaults_to_text_plain() {
        let message = Message::parse(b"Subject: hi\r\n\r\nHello\r\n");
        assert_eq!(message.header("subject"), Some("hi"));
        let part = message.first_text_plain().unwrap();
        assert_eq!(part.body(), b"Hello\r\n");
        assert_eq!(types(&message), vec!["text/plain"]);
    }

    #[test]
    fn malformed_content_type_defaults_to_text_plain() {
        let message = Message::parse(b"Content-Type: garbage\n\nbody");
        assert!(message.first_text_plain().is_some());
    }

    #[test]
    fn headers_only_message() {
        let message = Message::parse(b"Subject: no body");
        assert_eq!(message.header("subject"), Some("no body"));
        assert!(message.root().body().is_empty());
    }

    #[test]
    fn alternative_html_then_plain_picks_plain() {
        let raw = b"Content-Type: multipart/alternative; boundary=\"XX\"\r\n\
\r\n\
preamble\r\n\
--XX\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>hi</b>\r\n\
--XX\r\n\
Content-Type: text/plain; charset=iso-8859-1\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
caf=E9\r\n\
--XX--\r\n\
epilogue\r\n";
        let message = Message::parse(raw);
        assert_eq!(
            types(&message),
            vec!["multipart/alternative", "text/html", "text/plain"]
        );
        let plain = message.first_text_plain().unwrap();
        assert_eq!(plain.body(), b"caf=E9");
        assert_eq!(plain.decoded_body(), b"caf\xe9");
    }

    #[test]
    fn nested_multipart_is_walked_in_pre_order() {
        let raw = b"Content-Type: multipart/mixed; boundary=outer\n\
\n\
--outer\n\
Content-Type: multipart/alternative; boundary=inner\n\
\n\
--inner\n\
Content-Type: text/plain\n\
\n\
first\n\
--inner\n\
Content-Type: text/html\n\
\n\
<p>first</p>\n\
--inner--\n\
--outer\n\
Content-Type: text/plain\n\
Content-Disposition: attachment\n\
\n\
second\n\
--outer--\n";
        let message = Message::parse(raw);
        assert_eq!(
            types(&message),
            vec![
                "multipart/mixed",
                "multipart/alternative",
                "text/plain",
                "text/html",
                "text/plain"
            ]
        );
        assert_eq!(message.first_text_plain().unwrap().body(), b"first");
    }

    #[test]
    fn embedded_message_is_parsed() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\
\r\n\
--b\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>cover</p>\r\n\
--b\r\n\
Content-Type: message/rfc822\r\n\
\r\n\
Subject: inner\r\n\
\r\n\
forwarded text\r\n\
--b--\r\n";
        let message = Message::parse(raw);
        assert_eq!(
            types(&message),
            vec!["multipart/mixed", "text/html", "message/rfc822", "text/plain"]
        );
        let plain = message.first_text_plain().unwrap();
        assert_eq!(plain.headers().get("subject"), Some("inner"));
        assert_eq!(plain.body(), b"forwarded text");
    }

    #[test]
    fn no_text_plain_part() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\n\n--b\nContent-Type: text/html\n\nx\n--b\nContent-Type: image/png\nContent-Transfer-Encoding: base64\n\niVBORw0KGgo=\n--b--\n";
        let message = Message::parse(raw);
        assert!(message.first_text_plain().is_none());
    }

    #[test]
    fn unterminated_multipart_keeps_last_part() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\n\n--b\nContent-Type: text/plain\n\ntruncated";
        let message = Message::parse(raw);
        assert_eq!(message.first_text_plain().unwrap().body(), b"truncated");
    }

    #[test]
    fn multipart_without_boundary_is_a_leaf() {
        let message = Message::parse(b"Content-Type: multipart/mixed\n\n--b\n\nx\n");
        assert_eq!(types(&message), vec!["multipart/mixed"]);
        assert!(message.first_text_plain().is_none());
    }

    #[test]
    fn boundary_prefix_lines_are_not_delimiters() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\n\n--b\n\n--bx is text\n--b--\n";
        let message = Message::parse(raw);
        assert_eq!(message.first_text_plain().unwrap().body(), b"--bx is text");
    }

    #[test]
    fn base64_part_is_decoded() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\n\n--b\nContent-Type: text/plain\nContent-Transfer-Encoding: BASE64\n\nY2Fm6Q==\n--b--\n";
        let message = Message::parse(raw);
        assert_eq!(message.first_text_plain().unwrap().decoded_body(), b"caf\xe9");
    }

    #[test]
    fn transfer_encoding_names() {
        assert_eq!(TransferEncoding::parse(" Quoted-Printable "), TransferEncoding::QuotedPrintable);
        assert_eq!(TransferEncoding::parse("x-uuencode"), TransferEncoding::Other("x-uuencode".to_string()));
        assert_eq!(TransferEncoding::parse("8BIT").to_string(), "8bit");
    }

    #[test]
    fn base64_drops_dangling_symbols() {
        assert_eq!(TransferEncoding::Base64.decode(b"A"), b"");
        assert_eq!(TransferEncoding::Base64.decode(b"AAAAA"), [0, 0, 0]);
    }
}
