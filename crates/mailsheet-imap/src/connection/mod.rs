//! Transport and session handling.
//!
//! - [`Config`]: where to connect and how
//! - [`ImapStream`]: TLS or plaintext TCP behind one type
//! - [`FramedStream`]: reads whole responses, literals included
//! - [`Client`]: the type-state command interface

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated, Rejected, Selected};
pub use config::{Config, ConfigBuilder, Security};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect, tls_connector};
