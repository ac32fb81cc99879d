//! # mailsheet-imap
//!
//! A small async IMAP4rev1 client covering the read-only subset a mailbox
//! export needs: `LOGIN`, `EXAMINE`, `SEARCH`, `FETCH` and `LOGOUT`.
//!
//! ## Connection States
//!
//! Valid command sequences are enforced at compile time with the type-state
//! pattern:
//!
//! ```text
//! NotAuthenticated ── login() ──→ Authenticated ── examine() ──→ Selected
//!        │                              │                           │
//!        └──────────── logout() ────────┴───────────────────────────┘
//! ```
//!
//! A rejected transition hands the client back inside [`Rejected`] so the
//! caller can still log out cleanly.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsheet_imap::{Client, Config};
//!
//! let config = Config::new("imap.example.com");
//! let stream = mailsheet_imap::connection::connect(&config).await?;
//! let client = Client::from_stream(stream).await?;
//! let client = client.login("user@example.com", "secret").await?;
//! let (mut client, status) = client.examine("INBOX").await?;
//! println!("{} messages", status.exists);
//!
//! for seq in client.search("ALL").await? {
//!     let raw = client.fetch_message(seq).await?;
//!     println!("{seq}: {} bytes", raw.len());
//! }
//! client.logout().await?;
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command serialization and tag generation
//! - [`connection`]: transport, framing and the type-state client
//! - [`parser`]: sans-I/O response parser
//! - [`types`]: protocol value types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, TagGenerator};
pub use connection::{
    Authenticated, Client, Config, ConfigBuilder, FramedStream, ImapStream, NotAuthenticated,
    Rejected, Security, Selected,
};
pub use error::{Error, Result};
pub use parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
pub use types::{Capability, Mailbox, MailboxStatus, ResponseCode, SeqNum, Status, Tag, Uid};
