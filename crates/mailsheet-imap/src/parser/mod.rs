//! Sans-I/O response parser.
//!
//! [`Lexer`] splits one complete response (literals included) into tokens and
//! [`ResponseParser`] builds a [`Response`] from them. Neither touches the
//! network; the framing layer hands them whole responses.
//!
//! ```
//! use mailsheet_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* 3 EXISTS\r\n").unwrap();
//! assert!(matches!(response, Response::Untagged(UntaggedResponse::Exists(3))));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{FetchItem, Response, ResponseParser, UntaggedResponse};
