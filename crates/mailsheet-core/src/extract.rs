//! Message bytes to [`MessageRecord`].

use mailsheet_mime::{Message, decode_header_value, decode_latin1, parse_date};

use crate::error::ExtractError;
use crate::record::MessageRecord;

/// Extracts the exported fields from a raw RFC 5322 message.
///
/// `from` and `to` are kept verbatim, only `subject` is RFC 2047 decoded.
/// The body is the first `text/plain` part in pre-order, transfer-decoded
/// and read as ISO-8859-1.
///
/// # Errors
///
/// Returns `ExtractError::MissingDate` or `ExtractError::InvalidDate` for an
/// unusable `Date` header and `ExtractError::Decode` when the subject names
/// an unknown charset.
pub fn extract(raw: &[u8]) -> Result<MessageRecord, ExtractError> {
    let message = Message::parse(raw);

    let date_header = message.header("date").ok_or(ExtractError::MissingDate)?;
    let date = parse_date(date_header)
        .map_err(|_| ExtractError::InvalidDate(date_header.to_string()))?;

    let subject = message
        .header("subject")
        .map(decode_header_value)
        .transpose()?
        .unwrap_or_default();

    let body = message
        .first_text_plain()
        .map(|part| decode_latin1(&part.decoded_body()));

    Ok(MessageRecord {
        date,
        from: message.header("from").unwrap_or_default().to_string(),
        to: message.header("to").unwrap_or_default().to_string(),
        subject,
        body,
    })
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
    use chrono::{DateTime, Datelike, Timelike};

    #[test]
    fn simple_message() {
        let raw = b"Date: Tue, 2 Jan 2024 09:15:00 +0100\r\n\
From: Alice <alice@example.com>\r\n\
To: bob@example.com,\r\n carol@example.com\r\n\
Subject: =?UTF-8?Q?Caf=C3=A9?=\r\n\
\r\n\
Hello\r\n";
        let record = extract(raw).unwrap();
        assert_eq!(
            record.date,
            DateTime::parse_from_rfc2822("Tue, 2 Jan 2024 09:15:00 +0100").unwrap()
        );
        assert_eq!(record.from, "Alice <alice@example.com>");
        assert_eq!(record.to, "bob@example.com, carol@example.com");
        assert_eq!(record.subject, "Café");
        assert_eq!(record.body.as_deref(), Some("Hello\r\n"));
    }

    #[test]
    fn mixed_charset_subject_is_concatenated() {
        let raw = b"Date: Tue, 2 Jan 2024 09:15:00 +0000\r\n\
Subject: =?iso-8859-1?Q?R=E9sum=E9?= =?UTF-8?B?IOKAkyBkcmFmdA==?=\r\n\
\r\n";
        assert_eq!(extract(raw).unwrap().subject, "Résumé – draft");
    }

    #[test]
    fn encoded_from_is_not_decoded() {
        let raw = b"Date: Tue, 2 Jan 2024 09:15:00 +0000\r\n\
From: =?UTF-8?Q?J=C3=B6rg?= <j@example.com>\r\n\
\r\n";
        let record = extract(raw).unwrap();
        assert_eq!(record.from, "=?UTF-8?Q?J=C3=B6rg?= <j@example.com>");
        assert_eq!(record.to, "");
        assert_eq!(record.subject, "");
    }

    #[test]
    fn html_then_plain_takes_plain() {
        let raw = b"Date: Tue, 2 Jan 2024 09:15:00 +0000\r\n\
Content-Type: multipart/alternative; boundary=\"==b==\"\r\n\
\r\n\
--==b==\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>not this</p>\r\n\
--==b==\r\n\
Content-Type: text/plain; charset=iso-8859-1\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
VGjpIGJvZHk=\r\n\
--==b==--\r\n";
        assert_eq!(extract(raw).unwrap().body.as_deref(), Some("Thé body"));
    }

    #[test]
    fn no_plain_part_is_absent() {
        let raw = b"Date: Tue, 2 Jan 2024 09:15:00 +0000\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>html only</p>\r\n";
        assert_eq!(extract(raw).unwrap().body, None);
    }

    #[test]
    fn utf8_body_is_read_as_latin1() {
        let raw = "Date: Tue, 2 Jan 2024 09:15:00 +0000\r\n\r\né".as_bytes();
        assert_eq!(extract(raw).unwrap().body.as_deref(), Some("Ã©"));
    }

    #[test]
    fn date_with_comment() {
        let raw = b"Date: Wed, 3 Jan 2024 23:59:59 +0000 (UTC)\r\n\r\n";
        let date = extract(raw).unwrap().date;
        assert_eq!((date.day(), date.hour(), date.second()), (3, 23, 59));
    }

    #[test]
    fn date_errors() {
        assert_eq!(extract(b"Subject: x\r\n\r\n"), Err(ExtractError::MissingDate));
        assert_eq!(
            extract(b"Date: someday\r\n\r\n"),
            Err(ExtractError::InvalidDate("someday".to_string()))
        );
    }

    #[test]
    fn unknown_subject_charset() {
        let raw = b"Date: Tue, 2 Jan 2024 09:15:00 +0000\r\nSubject: =?x-klingon?Q?abc?=\r\n\r\n";
        assert!(matches!(
            extract(raw),
            Err(ExtractError::Decode(mailsheet_mime::Error::UnknownCharset(_)))
        ));
    }
}
