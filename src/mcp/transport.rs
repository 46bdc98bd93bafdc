//! Line-delimited transport for the MCP server.
//!
//! Implements the MCP stdio framing over any async reader/writer pair:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//!
//! [`stdio`] binds both halves to the process's stdin and stdout. Logging
//! goes to stderr and never through here.
//!
//! The halves are separate so the server can read on its main loop while a
//! dedicated task owns the writer.

use std::io;
use std::string::FromUtf8Error;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::mcp::protocol::Outgoing;

/// Reading half: yields one message line at a time.
///
/// Bytes of a partially read line are kept across calls, so a `read_line`
/// future dropped by `select!` loses nothing.
pub struct MessageReader<R> {
    reader: R,
    pending: Vec<u8>,
}

/// One input line: text, or the raw bytes' UTF-8 error.
pub type Line = Result<String, FromUtf8Error>;

/// Writing half: writes one message per line.
pub struct MessageWriter<W> {
    writer: W,
}

/// Reader over the process's stdin.
pub type StdinReader = MessageReader<BufReader<tokio::io::Stdin>>;

/// Writer over the process's stdout.
pub type StdoutWriter = MessageWriter<tokio::io::Stdout>;

/// Creates the stdio transport halves.
#[must_use]
pub fn stdio() -> (StdinReader, StdoutWriter) {
    (
        MessageReader::new(BufReader::new(tokio::io::stdin())),
        MessageWriter::new(tokio::io::stdout()),
    )
}

impl<R: AsyncBufRead + Unpin> MessageReader<R> {
    /// Wraps a buffered reader.
    #[must_use]
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
        }
    }

    /// Reads the next message line.
    ///
    /// Returns `None` at EOF. A line that is not valid UTF-8 is returned as
    /// `Some(Err(_))` and does not affect later lines.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn read_line(&mut self) -> io::Result<Option<Line>> {
        let bytes_read = self.reader.read_until(b'\n', &mut self.pending).await?;

        if bytes_read == 0 && self.pending.is_empty() {
            return Ok(None);
        }

        let mut bytes = std::mem::take(&mut self.pending);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }

        Ok(Some(String::from_utf8(bytes)))
    }
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    /// Wraps a writer.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a response or error as one line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write(&mut self, message: &Outgoing) -> io::Result<()> {
        let json = match message {
            Outgoing::Response(response) => serde_json::to_string(response),
            Outgoing::Error(error) => serde_json::to_string(error),
        }
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Flushes and shuts down the writer.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub async fn close(&mut self) -> io::Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await
    }
}
