//! Response parser.

#![allow(clippy::missing_errors_doc)]

mod fetch;
mod helpers;
mod types;

pub use types::{FetchItem, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status, Tag};
use crate::{Error, Result};

use fetch::parse_fetch_items;
use helpers::{parse_capabilities, parse_flag_list, parse_resp_text};

/// One complete server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Completion of a command.
    Tagged {
        /// Tag of the completed command.
        tag: Tag,
        /// Completion status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Server data.
    Untagged(UntaggedResponse),
    /// Continuation request (`+ ...`).
    Continuation {
        /// Text after the `+`.
        text: String,
    },
}

/// Parses responses. Stateless; every call sees one complete response.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one response, literals included.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => {
                lexer.expect(Token::Space)?;
                Self::parse_untagged(&mut lexer).map(Response::Untagged)
            }
            Token::Plus => {
                lexer.skip_spaces();
                Ok(Response::Continuation {
                    text: lexer.read_text(),
                })
            }
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            Token::Number(tag) => Self::parse_tagged(&mut lexer, &tag.to_string()),
            token => Err(Error::Parse {
                position: 0,
                message: format!("expected '*', '+' or a tag, got {token:?}"),
            }),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag: &str) -> Result<Response> {
        lexer.expect(Token::Space)?;
        let status = Self::parse_status(lexer)?;
        let (code, text) = parse_resp_text(lexer)?;
        Ok(Response::Tagged {
            tag: Tag::new(tag),
            status,
            code,
            text,
        })
    }

    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        match lexer.next_token()? {
            Token::Atom(word) => match word.to_ascii_uppercase().as_str() {
                "OK" => Ok(Status::Ok),
                "NO" => Ok(Status::No),
                "BAD" => Ok(Status::Bad),
                "PREAUTH" => Ok(Status::PreAuth),
                "BYE" => Ok(Status::Bye),
                _ => Err(lexer.error(&format!("unknown status {word}"))),
            },
            token => Err(lexer.error(&format!("expected status, got {token:?}"))),
        }
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<UntaggedResponse> {
        match lexer.next_token()? {
            Token::Number(n) => {
                lexer.expect(Token::Space)?;
                Self::parse_message_data(lexer, n)
            }
            Token::Atom(word) => {
                let keyword = word.to_ascii_uppercase();
                match keyword.as_str() {
                    "OK" | "NO" | "BAD" | "PREAUTH" | "BYE" => {
                        let (code, text) = parse_resp_text(lexer)?;
                        Ok(match keyword.as_str() {
                            "OK" => UntaggedResponse::Ok { code, text },
                            "NO" => UntaggedResponse::No { code, text },
                            "BAD" => UntaggedResponse::Bad { code, text },
                            "PREAUTH" => UntaggedResponse::PreAuth { code, text },
                            _ => UntaggedResponse::Bye { code, text },
                        })
                    }
                    "CAPABILITY" => parse_capabilities(lexer).map(UntaggedResponse::Capability),
                    "FLAGS" => {
                        lexer.expect(Token::Space)?;
                        parse_flag_list(lexer).map(UntaggedResponse::Flags)
                    }
                    "SEARCH" => Self::parse_search(lexer).map(UntaggedResponse::Search),
                    _ => {
                        lexer.read_text();
                        Ok(UntaggedResponse::Other(keyword))
                    }
                }
            }
            token => Err(lexer.error(&format!("unexpected {token:?} after '*'"))),
        }
    }

    fn parse_message_data(lexer: &mut Lexer<'_>, n: u32) -> Result<UntaggedResponse> {
        let keyword = match lexer.next_token()? {
            Token::Atom(word) => word.to_ascii_uppercase(),
            token => return Err(lexer.error(&format!("expected keyword, got {token:?}"))),
        };
        let seq = SeqNum::new(n);

        match keyword.as_str() {
            "EXISTS" => Ok(UntaggedResponse::Exists(n)),
            "RECENT" => Ok(UntaggedResponse::Recent(n)),
            "EXPUNGE" => seq
                .map(UntaggedResponse::Expunge)
                .ok_or_else(|| lexer.error("sequence number 0")),
            "FETCH" => {
                let seq = seq.ok_or_else(|| lexer.error("sequence number 0"))?;
                lexer.expect(Token::Space)?;
                let items = parse_fetch_items(lexer)?;
                Ok(UntaggedResponse::Fetch { seq, items })
            }
            _ => {
                lexer.read_text();
                Ok(UntaggedResponse::Other(keyword))
            }
        }
    }

    fn parse_search(lexer: &mut Lexer<'_>) -> Result<Vec<SeqNum>> {
        let mut ids = Vec::new();
        loop {
            match lexer.next_token()? {
                Token::Crlf | Token::Eof => return Ok(ids),
                Token::Space => {}
                Token::Number(n) => ids.extend(SeqNum::new(n)),
                // CONDSTORE appends `(MODSEQ n)`.
                Token::LParen => {
                    lexer.take_through(b')')?;
                }
                token => return Err(lexer.error(&format!("unexpected {token:?} in SEARCH"))),
            }
        }
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
    use crate::types::Capability;

    fn untagged(input: &[u8]) -> UntaggedResponse {
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(u) => u,
            other => panic!("expected untagged response, got {other:?}"),
        }
    }

    #[test]
    fn greeting() {
        assert_eq!(
            untagged(b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] Gimap ready\r\n"),
            UntaggedResponse::Ok {
                code: Some(ResponseCode::Capability(vec![
                    Capability::Imap4Rev1,
                    Capability::Auth("PLAIN".to_string())
                ])),
                text: "Gimap ready".to_string(),
            }
        );
    }

    #[test]
    fn tagged_completion() {
        let response = ResponseParser::parse(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n").unwrap();
        assert_eq!(
            response,
            Response::Tagged {
                tag: Tag::new("A0001"),
                status: Status::No,
                code: Some(ResponseCode::AuthenticationFailed),
                text: "Invalid credentials".to_string(),
            }
        );
    }

    #[test]
    fn tagged_without_text() {
        match ResponseParser::parse(b"A0002 OK\r\n").unwrap() {
            Response::Tagged { status, text, .. } => {
                assert_eq!(status, Status::Ok);
                assert!(text.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn continuation() {
        assert_eq!(
            ResponseParser::parse(b"+ go ahead\r\n").unwrap(),
            Response::Continuation {
                text: "go ahead".to_string()
            }
        );
    }

    #[test]
    fn search_preserves_server_order() {
        let ids: Vec<u32> = match untagged(b"* SEARCH 4 2 9\r\n") {
            UntaggedResponse::Search(ids) => ids.into_iter().map(SeqNum::get).collect(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(ids, vec![4, 2, 9]);
    }

    #[test]
    fn empty_search() {
        assert_eq!(untagged(b"* SEARCH\r\n"), UntaggedResponse::Search(vec![]));
    }

    #[test]
    fn search_with_modseq() {
        assert_eq!(
            untagged(b"* SEARCH 2 5 (MODSEQ 917162500)\r\n"),
            UntaggedResponse::Search(vec![SeqNum::new(2).unwrap(), SeqNum::new(5).unwrap()])
        );
    }

    #[test]
    fn mailbox_sizes() {
        assert_eq!(untagged(b"* 172 EXISTS\r\n"), UntaggedResponse::Exists(172));
        assert_eq!(untagged(b"* 1 RECENT\r\n"), UntaggedResponse::Recent(1));
        assert_eq!(
            untagged(b"* 3 EXPUNGE\r\n"),
            UntaggedResponse::Expunge(SeqNum::new(3).unwrap())
        );
    }

    #[test]
    fn flags() {
        assert_eq!(
            untagged(b"* FLAGS (\\Answered \\Flagged $Forwarded)\r\n"),
            UntaggedResponse::Flags(vec![
                "\\Answered".to_string(),
                "\\Flagged".to_string(),
                "$Forwarded".to_string()
            ])
        );
    }

    #[test]
    fn fetch_with_literal() {
        match untagged(b"* 12 FETCH (BODY[] {4}\r\nabcd)\r\n") {
            UntaggedResponse::Fetch { seq, items } => {
                assert_eq!(seq.get(), 12);
                assert_eq!(
                    items,
                    vec![FetchItem::Body {
                        section: String::new(),
                        data: Some(b"abcd".to_vec())
                    }]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_untagged_data_is_tolerated() {
        assert_eq!(
            untagged(b"* ENABLED CONDSTORE\r\n"),
            UntaggedResponse::Other("ENABLED".to_string())
        );
        assert_eq!(
            untagged(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n"),
            UntaggedResponse::Other("LIST".to_string())
        );
    }

    #[test]
    fn bye() {
        assert!(matches!(
            untagged(b"* BYE Logging out\r\n"),
            UntaggedResponse::Bye { .. }
        ));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(ResponseParser::parse(b")\r\n").is_err());
    }
}
