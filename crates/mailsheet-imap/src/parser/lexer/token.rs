//! Lexer tokens.

/// A lexical unit of a server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Bare atom, including flags such as `\Seen`.
    Atom(&'a str),
    /// Unescaped contents of a quoted string.
    QuotedString(String),
    /// Literal payload (`{n}\r\n` followed by n bytes).
    Literal(&'a [u8]),
    /// Atom consisting only of digits.
    Number(u32),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Single space.
    Space,
    /// `*`, the untagged prefix.
    Asterisk,
    /// `+`, the continuation prefix.
    Plus,
    /// `NIL`
    Nil,
    /// Line terminator.
    Crlf,
    /// End of input.
    Eof,
}
