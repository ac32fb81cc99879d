//! Transfer decodings and header text decoding.
//!
//! Everything here is lenient: mail in the wild is frequently malformed, and
//! a best-effort value is more useful than an error. The one hard failure is
//! an encoded-word whose charset has no known decoder.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// Base64 engine that accepts missing or superfluous padding and non-zero
/// trailing bits.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes base64, ignoring line breaks, whitespace and any other byte
/// outside the alphabet.
///
/// Returns `None` if what remains still cannot be decoded.
#[must_use]
pub fn decode_base64(input: &[u8]) -> Option<Vec<u8>> {
    let mut clean: Vec<u8> = input
        .iter()
        .copied()
        .filter(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
        .collect();
    // A single dangling symbol carries fewer than 8 bits.
    if clean.len() % 4 == 1 {
        clean.pop();
    }
    LENIENT_BASE64.decode(&clean).ok()
}

/// Decodes a quoted-printable body (RFC 2045 section 6.7).
///
/// Soft line breaks are removed and `=XX` escapes decoded; an `=` that starts
/// neither is kept as a literal byte.
#[must_use]
pub fn decode_quoted_printable(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let b = input[i];
        if b == b'=' {
            if let Some(skip) = soft_line_break(&input[i + 1..]) {
                i += 1 + skip;
                continue;
            }
            if let Some(byte) = hex_pair(&input[i + 1..]) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(b);
        i += 1;
    }
    out
}

/// Length of the soft line break following an `=`, including any trailing
/// whitespace before the line end. An `=` at the very end also counts.
fn soft_line_break(rest: &[u8]) -> Option<usize> {
    let ws = rest.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
    match &rest[ws..] {
        [] => Some(ws),
        [b'\r', b'\n', ..] => Some(ws + 2),
        [b'\n', ..] => Some(ws + 1),
        _ => None,
    }
}

fn hex_pair(rest: &[u8]) -> Option<u8> {
    let hi = char::from(*rest.first()?).to_digit(16)?;
    let lo = char::from(*rest.get(1)?).to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}

/// Decodes the `Q` encoding of RFC 2047: quoted-printable with `_` as space.
fn decode_q(payload: &str) -> Vec<u8> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' => {
                if let Some(byte) = hex_pair(&bytes[i + 1..]) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
                out.push(b'=');
            }
            b => out.push(b),
        }
        i += 1;
    }
    out
}

/// A piece of a header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderFragment<'a> {
    /// Plain text outside any encoded-word.
    Text(&'a str),
    /// Decoded payload of an encoded-word, not yet converted to text.
    Encoded {
        /// Charset label, without any RFC 2231 language suffix.
        charset: String,
        /// Payload after undoing the B or Q encoding.
        bytes: Vec<u8>,
    },
}

/// Splits a header value into plain text and encoded-words
/// (`=?charset?B|Q?payload?=`, RFC 2047).
///
/// Malformed encoded-words stay in the surrounding text. Whitespace that only
/// separates two encoded-words is dropped.
#[must_use]
pub fn split_encoded_words(value: &str) -> Vec<HeaderFragment<'_>> {
    let mut fragments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = value[cursor..].find("=?") {
        let start = cursor + offset;
        match parse_encoded_word(&value[start..]) {
            Some((fragment, len)) => {
                if start > text_start {
                    fragments.push(HeaderFragment::Text(&value[text_start..start]));
                }
                fragments.push(fragment);
                cursor = start + len;
                text_start = cursor;
            }
            None => cursor = start + 2,
        }
    }
    if text_start < value.len() {
        fragments.push(HeaderFragment::Text(&value[text_start..]));
    }

    let mut kept: Vec<HeaderFragment<'_>> = Vec::with_capacity(fragments.len());
    let mut iter = fragments.into_iter().peekable();
    while let Some(fragment) = iter.next() {
        let between_words = matches!(fragment, HeaderFragment::Text(t) if t.trim().is_empty())
            && matches!(kept.last(), Some(HeaderFragment::Encoded { .. }))
            && matches!(iter.peek(), Some(HeaderFragment::Encoded { .. }));
        if !between_words {
            kept.push(fragment);
        }
    }
    kept
}

/// Parses one encoded-word at the start of `s`, returning it and its length.
fn parse_encoded_word(s: &str) -> Option<(HeaderFragment<'static>, usize)> {
    let rest = s.strip_prefix("=?")?;
    let (charset, rest) = rest.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let payload = &rest[..end];

    let charset_ok = !charset.is_empty()
        && !charset.contains(|c: char| c.is_whitespace() || c == '=' || c == '"');
    if !charset_ok || payload.contains(char::is_whitespace) {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(payload.as_bytes())?,
        "Q" | "q" => decode_q(payload),
        _ => return None,
    };

    let len = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    // RFC 2231 section 5: `charset*language`.
    let charset = charset.split('*').next().unwrap_or(charset).to_string();
    Some((HeaderFragment::Encoded { charset, bytes }, len))
}

/// Converts bytes in the named charset to text.
///
/// Malformed sequences become U+FFFD.
///
/// # Errors
///
/// Returns `Error::UnknownCharset` if the label is not recognized.
pub fn decode_charset(charset: &str, bytes: &[u8]) -> Result<String> {
    let encoding = Encoding::for_label(charset.trim().as_bytes())
        .ok_or_else(|| Error::UnknownCharset(charset.to_string()))?;
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    Ok(text.into_owned())
}

/// Decodes a header value containing RFC 2047 encoded-words into text.
///
/// Plain text passes through unchanged. Adjacent encoded-words in the same
/// charset are joined before decoding, so a character split across two words
/// survives. Fragments are concatenated without separators.
///
/// # Errors
///
/// Returns `Error::UnknownCharset` if an encoded-word names a charset with no
/// known decoder.
pub fn decode_header_value(value: &str) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut pending: Option<(String, Vec<u8>)> = None;

    for fragment in split_encoded_words(value) {
        match fragment {
            HeaderFragment::Encoded { charset, bytes } => match pending.as_mut() {
                Some((current, buf)) if current.eq_ignore_ascii_case(&charset) => {
                    buf.extend_from_slice(&bytes);
                }
                _ => {
                    if let Some((current, buf)) = pending.replace((charset, bytes)) {
                        out.push_str(&decode_charset(&current, &buf)?);
                    }
                }
            },
            HeaderFragment::Text(text) => {
                if let Some((current, buf)) = pending.take() {
                    out.push_str(&decode_charset(&current, &buf)?);
                }
                out.push_str(text);
            }
        }
    }
    if let Some((current, buf)) = pending {
        out.push_str(&decode_charset(&current, &buf)?);
    }
    Ok(out)
}

/// Decodes bytes as ISO-8859-1: each byte becomes the code point of the same
/// value. Never fails.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
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

    #[test]
    fn q_encoded_utf8() {
        assert_eq!(decode_header_value("=?UTF-8?Q?Caf=C3=A9?=").unwrap(), "Café");
    }

    #[test]
    fn b_encoded_latin1() {
        // "Grüße" in ISO-8859-1.
        assert_eq!(decode_header_value("=?iso-8859-1?B?R3L832U=?=").unwrap(), "Grüße");
    }

    #[test]
    fn two_charsets_concatenate_without_separator() {
        let value = "=?UTF-8?B?w6l0w6k=?= =?ISO-8859-1?Q?_caf=E9?=";
        assert_eq!(decode_header_value(value).unwrap(), "été café");
    }

    #[test]
    fn text_around_encoded_words_is_kept() {
        let value = "Re: =?utf-8?q?na=C3=AFve?= question";
        assert_eq!(decode_header_value(value).unwrap(), "Re: naïve question");
    }

    #[test]
    fn split_multibyte_character_survives() {
        // "é" is C3 A9; each word carries one byte.
        let value = "=?utf-8?Q?caf=C3?= =?utf-8?Q?=A9?=";
        assert_eq!(decode_header_value(value).unwrap(), "café");
    }

    #[test]
    fn unpadded_base64_word() {
        assert_eq!(decode_header_value("=?utf-8?b?aGk?=").unwrap(), "hi");
    }

    #[test]
    fn language_suffix_is_stripped() {
        let fragments = split_encoded_words("=?utf-8*en?q?hi?=");
        assert_eq!(
            fragments,
            vec![HeaderFragment::Encoded {
                charset: "utf-8".to_string(),
                bytes: b"hi".to_vec()
            }]
        );
        assert_eq!(decode_header_value("=?utf-8*en?q?hi?= there").unwrap(), "hi there");
    }

    #[test]
    fn malformed_words_stay_literal() {
        for value in ["=?utf-8?x?abc?=", "=?utf-8?q?no end", "=??q?abc?=", "a =? b", "=?utf-8?q?a b?="] {
            assert_eq!(decode_header_value(value).unwrap(), value);
        }
    }

    #[test]
    fn unknown_charset_is_an_error() {
        assert_eq!(
            decode_header_value("=?x-klingon?q?abc?="),
            Err(Error::UnknownCharset("x-klingon".to_string()))
        );
    }

    #[test]
    fn iso_8859_1_words_decode_as_windows_1252() {
        // Header charsets follow the WHATWG labels; bodies stay strict latin1.
        assert_eq!(decode_header_value("=?iso-8859-1?Q?=80=85?=").unwrap(), "\u{20ac}\u{2026}");
        assert_eq!(decode_latin1(&[0x80, 0x85]), "\u{80}\u{85}");
    }

    #[test]
    fn base64_body_with_line_breaks_and_junk() {
        assert_eq!(decode_base64(b"SGVs\r\nbG8s\r\nIHdvcmxkIQ==\r\n").unwrap(), b"Hello, world!");
        assert_eq!(decode_base64(b"SGVsbG8*").unwrap(), b"Hello");
        assert_eq!(decode_base64(b"SGVsbG8").unwrap(), b"Hello");
    }

    #[test]
    fn quoted_printable_body() {
        assert_eq!(decode_quoted_printable(b"caf=E9 =\r\nsoft"), b"caf\xe9 soft");
        assert_eq!(decode_quoted_printable(b"a=  \nb"), b"ab");
        assert_eq!(decode_quoted_printable(b"100=% sure=ZZ"), b"100=% sure=ZZ");
        assert_eq!(decode_quoted_printable(b"end="), b"end");
        assert_eq!(decode_quoted_printable(b"=3d=3D"), b"==");
    }

    #[test]
    fn latin1_maps_bytes_to_code_points() {
        assert_eq!(decode_latin1(b"caf\xe9"), "café");
        assert_eq!(decode_latin1(&[0x80, 0x9f, 0xff]), "\u{80}\u{9f}\u{ff}");
    }

    proptest! {
        #[test]
        fn values_without_encoded_words_are_unchanged(value in any::<String>().prop_filter("no encoded-word marker", |s| !s.contains("=?"))) {
            prop_assert_eq!(decode_header_value(&value).unwrap(), value);
        }

        #[test]
        fn latin1_is_total(bytes in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let text = decode_latin1(&bytes);
            prop_assert_eq!(text.chars().count(), bytes.len());
            for (c, b) in text.chars().zip(&bytes) {
                prop_assert_eq!(u32::from(c), u32::from(*b));
            }
        }

        #[test]
        fn quoted_printable_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = decode_quoted_printable(&bytes);
            let _ = decode_base64(&bytes);
        }
    }
}
