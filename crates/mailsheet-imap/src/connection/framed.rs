//! Response framing.
//!
//! A response is one CRLF-terminated line, unless the line ends in a literal
//! announcement `{n}`, in which case the next n bytes and the rest of the
//! response belong to it too.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Upper bound for a single line outside literals.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Upper bound for one literal; a whole message body arrives as one.
const MAX_LITERAL_SIZE: usize = 256 * 1024 * 1024;

/// Buffered stream that reads whole responses and writes whole commands.
pub struct FramedStream<S> {
    reader: BufReader<S>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, stream),
        }
    }

    /// Reads one complete response including any literals.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` with `UnexpectedEof` if the server closes the
    /// connection mid-response and `Error::Protocol` if a line or literal
    /// exceeds the size limits.
    pub async fn read_response(&mut self) -> Result<Bytes> {
        let mut response = BytesMut::new();

        loop {
            let line_start = response.len();
            self.read_line_into(&mut response).await?;

            let Some(size) = literal_size(&response[line_start..]) else {
                return Ok(response.freeze());
            };
            if size > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal of {size} bytes exceeds the {MAX_LITERAL_SIZE} byte limit"
                )));
            }

            let literal_start = response.len();
            response.resize(literal_start + size, 0);
            self.reader
                .read_exact(&mut response[literal_start..])
                .await?;
        }
    }

    async fn read_line_into(&mut self, out: &mut BytesMut) -> Result<()> {
        let start = out.len();
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "server closed the connection",
                )));
            }

            if let Some(pos) = available.iter().position(|&b| b == b'\n') {
                out.extend_from_slice(&available[..=pos]);
                self.reader.consume(pos + 1);
                return Ok(());
            }

            let len = available.len();
            out.extend_from_slice(available);
            self.reader.consume(len);
            if out.len() - start > MAX_LINE_LENGTH {
                return Err(Error::Protocol("response line too long".to_string()));
            }
        }
    }

    /// Writes one serialized command and flushes it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the write fails.
    pub async fn write_command(&mut self, command: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(command).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Shuts down the write half of the connection.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the shutdown fails.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }
}

/// Size of the literal announced at the end of `line`, if any.
///
/// Accepts `{n}` and the non-synchronizing form `{n+}`.
fn literal_size(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\n")?;
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let line = line.strip_suffix(b"}")?;
    let line = line.strip_suffix(b"+").unwrap_or(line);
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
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
    use tokio_test::io::Builder;

    #[test]
    fn literal_size_detection() {
        assert_eq!(literal_size(b"* 1 FETCH (BODY[] {342}\r\n"), Some(342));
        assert_eq!(literal_size(b"A1 APPEND {5+}\r\n"), Some(5));
        assert_eq!(literal_size(b"* OK done\r\n"), None);
        assert_eq!(literal_size(b"* OK {abc}\r\n"), None);
        assert_eq!(literal_size(b"* OK {}\r\n"), None);
        assert_eq!(literal_size(b"* OK {12}"), None);
    }

    #[tokio::test]
    async fn reads_lines_one_response_at_a_time() {
        let mock = Builder::new().read(b"* 2 EXISTS\r\nA0001 OK done\r\n").build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(&framed.read_response().await.unwrap()[..], b"* 2 EXISTS\r\n");
        assert_eq!(&framed.read_response().await.unwrap()[..], b"A0001 OK done\r\n");
    }

    #[tokio::test]
    async fn literal_spanning_reads_stays_in_one_response() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {12}\r\nSubj")
            .read(b"ect: x\r\n)\r\n")
            .read(b"A0004 OK FETCH completed\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response().await.unwrap();
        assert_eq!(&response[..], b"* 1 FETCH (BODY[] {12}\r\nSubject: x\r\n)\r\n");
        let response = framed.read_response().await.unwrap();
        assert_eq!(&response[..], b"A0004 OK FETCH completed\r\n");
    }

    #[tokio::test]
    async fn literal_that_looks_like_an_announcement() {
        // The literal payload itself ends in "{3}\r\n"; it must not be
        // mistaken for a second literal.
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {5}\r\n{3}\r\n)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response().await.unwrap();
        assert_eq!(&response[..], b"* 1 FETCH (BODY[] {5}\r\n{3}\r\n)\r\n");
    }

    #[tokio::test]
    async fn eof_mid_response_is_an_error() {
        let mock = Builder::new().read(b"* 1 FETCH (BODY[] {100}\r\nshort").build();
        let mut framed = FramedStream::new(mock);
        assert!(matches!(framed.read_response().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn writes_command_bytes() {
        let mock = Builder::new().write(b"A0000 LOGOUT\r\n").build();
        let mut framed = FramedStream::new(mock);
        framed.write_command(b"A0000 LOGOUT\r\n").await.unwrap();
    }
}
