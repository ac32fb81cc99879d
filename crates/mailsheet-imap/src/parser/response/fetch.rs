//! FETCH response data items.

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;

use super::helpers::{parse_flag_list, skip_value};
use super::types::FetchItem;

/// Parses the parenthesized item list of `* n FETCH (...)`.
///
/// Items this client never requests are skipped.
pub fn parse_fetch_items(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;
    let mut items = Vec::new();

    loop {
        let name = match lexer.next_token()? {
            Token::RParen => return Ok(items),
            Token::Space => continue,
            Token::Atom(name) => name.to_ascii_uppercase(),
            token => return Err(lexer.error(&format!("expected fetch item name, got {token:?}"))),
        };

        let section = if lexer.peek() == Some(b'[') {
            lexer.expect(Token::LBracket)?;
            let raw = lexer.take_through(b']')?;
            // Partial fetch origin, e.g. BODY[]<0>.
            if lexer.peek() == Some(b'<') {
                lexer.take_through(b'>')?;
            }
            Some(String::from_utf8_lossy(raw).into_owned())
        } else {
            None
        };
        lexer.expect(Token::Space)?;

        match (name.as_str(), section) {
            ("BODY" | "BINARY", Some(section)) => {
                let data = read_nstring_bytes(lexer)?;
                items.push(FetchItem::Body { section, data });
            }
            ("RFC822", None) => {
                let data = read_nstring_bytes(lexer)?;
                items.push(FetchItem::Body {
                    section: String::new(),
                    data,
                });
            }
            ("UID", None) => {
                let n = lexer.read_number()?;
                if let Some(uid) = Uid::new(n) {
                    items.push(FetchItem::Uid(uid));
                }
            }
            ("RFC822.SIZE", None) => items.push(FetchItem::Rfc822Size(lexer.read_number()?)),
            ("FLAGS", None) => items.push(FetchItem::Flags(parse_flag_list(lexer)?)),
            _ => skip_value(lexer)?,
        }
    }
}

fn read_nstring_bytes(lexer: &mut Lexer<'_>) -> Result<Option<Vec<u8>>> {
    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::Literal(data) => Ok(Some(data.to_vec())),
        Token::QuotedString(s) => Ok(Some(s.into_bytes())),
        token => Err(lexer.error(&format!("expected string or NIL, got {token:?}"))),
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

    fn parse(input: &[u8]) -> Vec<FetchItem> {
        parse_fetch_items(&mut Lexer::new(input)).unwrap()
    }

    #[test]
    fn whole_body_literal() {
        let items = parse(b"(BODY[] {12}\r\nSubject: x\r\n)");
        assert_eq!(
            items,
            vec![FetchItem::Body {
                section: String::new(),
                data: Some(b"Subject: x\r\n".to_vec()),
            }]
        );
    }

    #[test]
    fn uid_flags_and_size_around_body() {
        let items = parse(b"(UID 77 FLAGS (\\Seen) RFC822.SIZE 5 BODY[] {5}\r\nhello)");
        assert_eq!(
            items,
            vec![
                FetchItem::Uid(Uid::new(77).unwrap()),
                FetchItem::Flags(vec!["\\Seen".to_string()]),
                FetchItem::Rfc822Size(5),
                FetchItem::Body {
                    section: String::new(),
                    data: Some(b"hello".to_vec()),
                },
            ]
        );
    }

    #[test]
    fn rfc822_item_is_a_whole_body() {
        let items = parse(b"(RFC822 {2}\r\nhi)");
        assert_eq!(
            items,
            vec![FetchItem::Body {
                section: String::new(),
                data: Some(b"hi".to_vec()),
            }]
        );
    }

    #[test]
    fn nil_body_and_sectioned_body() {
        let items = parse(b"(BODY[HEADER.FIELDS (SUBJECT)] NIL BODY[]<0> \"x\")");
        assert_eq!(
            items,
            vec![
                FetchItem::Body {
                    section: "HEADER.FIELDS (SUBJECT)".to_string(),
                    data: None,
                },
                FetchItem::Body {
                    section: String::new(),
                    data: Some(b"x".to_vec()),
                },
            ]
        );
    }

    #[test]
    fn unrequested_items_are_skipped() {
        let items = parse(
            b"(X-GM-THRID 1278455344230334865 X-GM-LABELS (\\Inbox \"My Label\") MODSEQ (12) UID 9)",
        );
        assert_eq!(items, vec![FetchItem::Uid(Uid::new(9).unwrap())]);
    }
}
