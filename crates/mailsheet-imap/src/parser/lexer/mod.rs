//! Tokenizer for server responses (RFC 3501 section 9).

mod token;

pub use token::Token;

use crate::{Error, Result};

/// Cursor over the bytes of one response.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Peeks at the next byte.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Reads the next token.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` on a byte that cannot start a token or on a
    /// malformed string or literal.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        let single = match byte {
            b' ' => Some(Token::Space),
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b'[' => Some(Token::LBracket),
            b']' => Some(Token::RBracket),
            b'*' => Some(Token::Asterisk),
            b'+' => Some(Token::Plus),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok(token);
        }

        match byte {
            b'\r' if self.peek_at(1) == Some(b'\n') => {
                self.pos += 2;
                Ok(Token::Crlf)
            }
            b'\n' => {
                self.pos += 1;
                Ok(Token::Crlf)
            }
            b'"' => self.quoted_string(),
            b'{' => self.literal(),
            _ if is_atom_char(byte) => self.atom(),
            _ => Err(self.error(&format!("unexpected byte {byte:#04x}"))),
        }
    }

    fn quoted_string(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => match self.bump() {
                    Some(c @ (b'"' | b'\\')) => bytes.push(c),
                    Some(c) => return Err(self.error(&format!("invalid escape \\{}", char::from(c)))),
                    None => return Err(self.error("unterminated quoted string")),
                },
                Some(b'\r' | b'\n') | None => return Err(self.error("unterminated quoted string")),
                Some(c) => bytes.push(c),
            }
        }
        Ok(Token::QuotedString(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn literal(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let size: usize = std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| self.error("invalid literal size"))?;

        if self.bump() != Some(b'}') {
            return Err(self.error("expected '}' after literal size"));
        }
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.bump() != Some(b'\n') {
            return Err(self.error("expected CRLF after literal size"));
        }

        let end = self
            .pos
            .checked_add(size)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("literal is shorter than announced"))?;
        let data = &self.input[self.pos..end];
        self.pos = end;
        Ok(Token::Literal(data))
    }

    fn atom(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        // `\*` appears in PERMANENTFLAGS.
        if self.peek() == Some(b'\\') && self.peek_at(1) == Some(b'*') {
            self.pos += 2;
        }
        while self.peek().is_some_and(is_atom_char) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("atom is not valid UTF-8"))?;

        if text.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else if text.bytes().all(|b| b.is_ascii_digit()) {
            text.parse()
                .map(Token::Number)
                .map_err(|_| self.error("number out of range"))
        } else {
            Ok(Token::Atom(text))
        }
    }

    /// Consumes the next token and checks it has the same kind as `expected`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if a different token is found.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {expected:?}, got {token:?}")))
        }
    }

    /// Reads a number.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the next token is not a number.
    pub fn read_number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("expected number, got {token:?}"))),
        }
    }

    /// Reads an atom, a string or a bare number as text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` for any other token.
    pub fn read_astring(&mut self) -> Result<String> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s.to_string()),
            Token::Number(n) => Ok(n.to_string()),
            Token::QuotedString(s) => Ok(s),
            Token::Literal(data) => Ok(String::from_utf8_lossy(data).into_owned()),
            token => Err(self.error(&format!("expected string, got {token:?}"))),
        }
    }

    /// Reads the remainder of the line as free text, consuming the CRLF.
    pub fn read_text(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\r' || b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek() == Some(b'\n') {
            self.pos += 1;
        }
        text
    }

    /// Returns the raw bytes up to `end` and consumes `end` itself.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if `end` does not occur before the line ends.
    pub fn take_through(&mut self, end: u8) -> Result<&'a [u8]> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == end {
                self.pos += 1;
                return Ok(&self.input[start..self.pos - 1]);
            }
            if b == b'\r' || b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        Err(self.error(&format!("expected '{}'", char::from(end))))
    }

    /// Skips any number of spaces.
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// Builds a parse error at the current position.
    #[must_use]
    pub fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }
}

/// Returns true for bytes allowed in an atom.
///
/// `\` is accepted so flags such as `\Seen` lex as one atom.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    matches!(b, 0x21..=0x7E)
        && !matches!(b, b'(' | b')' | b'{' | b'"' | b'%' | b'*' | b']' | b'[')
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

    fn tokens(input: &[u8]) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn untagged_status_line() {
        assert_eq!(
            tokens(b"* OK ready\r\n"),
            vec![
                Token::Asterisk,
                Token::Space,
                Token::Atom("OK"),
                Token::Space,
                Token::Atom("ready"),
                Token::Crlf
            ]
        );
    }

    #[test]
    fn numbers_and_nil() {
        assert_eq!(
            tokens(b"12 nil 4294967295"),
            vec![
                Token::Number(12),
                Token::Space,
                Token::Nil,
                Token::Space,
                Token::Number(u32::MAX)
            ]
        );
    }

    #[test]
    fn number_overflow_is_an_error() {
        let mut lexer = Lexer::new(b"99999999999");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn section_brackets_split_atoms() {
        assert_eq!(
            tokens(b"BODY[]"),
            vec![Token::Atom("BODY"), Token::LBracket, Token::RBracket]
        );
    }

    #[test]
    fn flags_and_wildcard_flag() {
        assert_eq!(
            tokens(b"(\\Seen \\*)"),
            vec![
                Token::LParen,
                Token::Atom("\\Seen"),
                Token::Space,
                Token::Atom("\\*"),
                Token::RParen
            ]
        );
    }

    #[test]
    fn quoted_string_with_escapes_and_latin1() {
        let mut lexer = Lexer::new(b"\"a \\\"b\\\" \xe9\"");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::QuotedString("a \"b\" \u{fffd}".to_string())
        );
    }

    #[test]
    fn literal_borrows_exact_bytes() {
        let mut lexer = Lexer::new(b"{7}\r\nab\r\ncd)");
        assert_eq!(lexer.next_token().unwrap(), Token::Literal(b"ab\r\ncd)".as_slice()));
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn short_literal_is_an_error() {
        let mut lexer = Lexer::new(b"{10}\r\nabc");
        assert!(matches!(lexer.next_token(), Err(Error::Parse { .. })));
    }

    #[test]
    fn take_through_returns_raw_section() {
        let mut lexer = Lexer::new(b"HEADER.FIELDS (DATE FROM)] rest");
        assert_eq!(lexer.take_through(b']').unwrap(), b"HEADER.FIELDS (DATE FROM)");
        assert_eq!(lexer.next_token().unwrap(), Token::Space);

        let mut lexer = Lexer::new(b"no bracket\r\n]");
        assert!(lexer.take_through(b']').is_err());
    }

    #[test]
    fn read_text_stops_at_line_end() {
        let mut lexer = Lexer::new(b"LOGIN completed (0.001 secs)\r\nnext");
        assert_eq!(lexer.read_text(), "LOGIN completed (0.001 secs)");
        assert_eq!(lexer.position(), 30);
    }
}
