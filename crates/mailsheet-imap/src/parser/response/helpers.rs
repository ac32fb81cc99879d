//! Shared parsing routines.

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::{Capability, ResponseCode, Uid};

/// Parses `[code] text` after a status keyword.
pub fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
    lexer.skip_spaces();
    let code = if lexer.peek() == Some(b'[') {
        lexer.expect(Token::LBracket)?;
        let code = parse_response_code(lexer)?;
        lexer.skip_spaces();
        Some(code)
    } else {
        None
    };
    Ok((code, lexer.read_text()))
}

/// Parses the inside of `[...]`, consuming the closing bracket.
fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    let name = match lexer.next_token()? {
        Token::Atom(name) => name.to_ascii_uppercase(),
        token => return Err(lexer.error(&format!("expected response code, got {token:?}"))),
    };

    let code = match name.as_str() {
        "ALERT" => ResponseCode::Alert,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "AUTHENTICATIONFAILED" => ResponseCode::AuthenticationFailed,
        "NONEXISTENT" => ResponseCode::NonExistent,
        "UIDNEXT" => {
            lexer.expect(Token::Space)?;
            let n = lexer.read_number()?;
            match Uid::new(n) {
                Some(uid) => ResponseCode::UidNext(uid),
                None => ResponseCode::Unknown(name),
            }
        }
        "UIDVALIDITY" => {
            lexer.expect(Token::Space)?;
            ResponseCode::UidValidity(lexer.read_number()?)
        }
        "UNSEEN" => {
            lexer.expect(Token::Space)?;
            ResponseCode::Unseen(lexer.read_number()?)
        }
        "PERMANENTFLAGS" => {
            lexer.expect(Token::Space)?;
            ResponseCode::PermanentFlags(parse_flag_list(lexer)?)
        }
        "CAPABILITY" => {
            let mut caps = Vec::new();
            while lexer.peek() == Some(b' ') {
                lexer.skip_spaces();
                if let Token::Atom(atom) = lexer.next_token()? {
                    caps.push(Capability::parse(atom));
                }
            }
            ResponseCode::Capability(caps)
        }
        _ => {
            lexer.take_through(b']')?;
            return Ok(ResponseCode::Unknown(name));
        }
    };

    lexer.skip_spaces();
    lexer.expect(Token::RBracket)?;
    Ok(code)
}

/// Parses `(flag flag ...)`.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Vec<String>> {
    lexer.expect(Token::LParen)?;
    let mut flags = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => return Ok(flags),
            Token::Space => {}
            Token::Atom(flag) => flags.push(flag.to_string()),
            token => return Err(lexer.error(&format!("unexpected {token:?} in flag list"))),
        }
    }
}

/// Parses the atoms of a CAPABILITY response up to the end of the line.
pub fn parse_capabilities(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::Crlf | Token::Eof => return Ok(caps),
            Token::Atom(atom) => caps.push(Capability::parse(atom)),
            _ => {}
        }
    }
}

/// Skips one value: a single token or a whole parenthesized list.
pub fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen if depth > 0 => depth -= 1,
            Token::Space if depth > 0 => continue,
            Token::Crlf | Token::Eof | Token::RParen => {
                return Err(lexer.error("unexpected end of value"));
            }
            Token::LBracket => {
                lexer.take_through(b']')?;
            }
            _ => {}
        }
        if depth == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn resp_text_with_and_without_code() {
        let mut lexer = Lexer::new(b"[READ-ONLY] EXAMINE completed\r\n");
        let (code, text) = parse_resp_text(&mut lexer).unwrap();
        assert_eq!(code, Some(ResponseCode::ReadOnly));
        assert_eq!(text, "EXAMINE completed");

        let mut lexer = Lexer::new(b"Logged in\r\n");
        assert_eq!(parse_resp_text(&mut lexer).unwrap(), (None, "Logged in".to_string()));
    }

    #[test]
    fn numeric_codes() {
        let mut lexer = Lexer::new(b"[UIDVALIDITY 3857529045] UIDs valid\r\n");
        let (code, _) = parse_resp_text(&mut lexer).unwrap();
        assert_eq!(code, Some(ResponseCode::UidValidity(3_857_529_045)));

        let mut lexer = Lexer::new(b"[UIDNEXT 4392] Predicted next UID\r\n");
        let (code, _) = parse_resp_text(&mut lexer).unwrap();
        assert_eq!(code, Some(ResponseCode::UidNext(Uid::new(4392).unwrap())));
    }

    #[test]
    fn permanent_flags_code() {
        let mut lexer = Lexer::new(b"[PERMANENTFLAGS (\\Deleted \\Seen \\*)] Limited\r\n");
        let (code, text) = parse_resp_text(&mut lexer).unwrap();
        assert_eq!(
            code,
            Some(ResponseCode::PermanentFlags(vec![
                "\\Deleted".to_string(),
                "\\Seen".to_string(),
                "\\*".to_string()
            ]))
        );
        assert_eq!(text, "Limited");
    }

    #[test]
    fn unknown_code_is_skipped_whole() {
        let mut lexer = Lexer::new(b"[HIGHESTMODSEQ 90060115205545359] Highest\r\n");
        let (code, text) = parse_resp_text(&mut lexer).unwrap();
        assert_eq!(code, Some(ResponseCode::Unknown("HIGHESTMODSEQ".to_string())));
        assert_eq!(text, "Highest");
    }

    #[test]
    fn skip_value_handles_nested_lists() {
        let mut lexer = Lexer::new(b"(\"a b\" (NIL {3}\r\nx)y) 5)");
        skip_value(&mut lexer).unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Number(5));
    }
}
