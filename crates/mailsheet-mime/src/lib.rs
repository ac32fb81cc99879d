//! # mailsheet-mime
//!
//! Read-side MIME handling for exported mail.
//!
//! - [`Message`]: splits a raw RFC 5322 message into a tree of [`Part`]s and
//!   walks it in pre-order
//! - [`encoding`]: base64 and quoted-printable transfer decodings, RFC 2047
//!   encoded-word decoding and ISO-8859-1 text decoding
//! - [`ContentType`] and [`Headers`]: header parsing with unfolding
//! - [`parse_date`]: tolerant `Date:` header parsing
//!
//! ## Example
//!
//! ```
//! use mailsheet_mime::{Message, encoding};
//!
//! let raw = b"Subject: =?UTF-8?Q?Caf=C3=A9?=\r\n\
//!             Content-Type: multipart/alternative; boundary=b\r\n\
//!             \r\n\
//!             --b\r\n\
//!             Content-Type: text/html\r\n\
//!             \r\n\
//!             <p>hi</p>\r\n\
//!             --b\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             hi\r\n\
//!             --b--\r\n";
//!
//! let message = Message::parse(raw);
//! let subject = encoding::decode_header_value(message.header("subject").unwrap()).unwrap();
//! assert_eq!(subject, "Café");
//!
//! let body = message.first_text_plain().unwrap().decoded_body();
//! assert_eq!(encoding::decode_latin1(&body), "hi");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod content_type;
mod date;
pub mod encoding;
pub mod error;
pub mod header;
pub mod message;

pub use content_type::ContentType;
pub use date::parse_date;
pub use encoding::{HeaderFragment, decode_header_value, decode_latin1};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding, Walk};
