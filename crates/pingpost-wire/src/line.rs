//! CRLF line I/O with per-operation timeouts.
//!
//! SMTP and IMAP both speak CRLF-terminated lines where a command is
//! answered by one or more response lines, the last of which carries a
//! correlating token (a reply code for SMTP, the command tag for IMAP).
//! `LineStream` provides the shared client half of that convention:
//! timed line writes with redacted logging, single timed chunk reads,
//! and accumulation until a completion predicate matches.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Longest prefix of a line echoed to the debug log.
const LOG_PREVIEW_LEN: usize = 96;

/// Tagged response suffixes that terminate an IMAP-style exchange.
pub const TAGGED_SUFFIXES: &[&str] = &["OK", "NO", "BAD"];

/// Buffered line-oriented stream with timeout-bounded operations.
pub struct LineStream<S> {
    reader: BufReader<S>,
    read_timeout: Duration,
    op_timeout: Duration,
}

impl<S> LineStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new line stream.
    ///
    /// `read_timeout` bounds each individual read; `op_timeout` bounds a
    /// whole accumulate-until-match exchange.
    pub fn new(stream: S, read_timeout: Duration, op_timeout: Duration) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            read_timeout,
            op_timeout,
        }
    }

    /// Returns the per-operation timeout.
    #[must_use]
    pub const fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Writes a line, appending CRLF, and logs a truncated copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or exceeds the read timeout.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        debug!(">> {}", preview(line));
        self.write_line_inner(line).await
    }

    /// Writes a line whose content must not reach the logs (credentials).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or exceeds the read timeout.
    pub async fn write_line_redacted(&mut self, line: &str) -> Result<()> {
        debug!(">> <redacted>");
        self.write_line_inner(line).await
    }

    async fn write_line_inner(&mut self, line: &str) -> Result<()> {
        let mut buf = BytesMut::with_capacity(line.len() + 2);
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(b"\r\n");
        self.write_raw(&buf).await
    }

    /// Writes raw bytes (message bodies and IMAP literals) and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or exceeds the read timeout.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let timeout = self.read_timeout;
        let stream = self.reader.get_mut();
        let fut = async {
            stream.write_all(data).await?;
            stream.flush().await?;
            Ok(())
        };
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }

    /// Reads one CRLF-terminated line, bounded by the read timeout.
    ///
    /// The trailing CRLF is stripped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] on EOF and [`Error::Timeout`] on budget
    /// expiry.
    pub async fn read_line(&mut self) -> Result<String> {
        let timeout = self.read_timeout;
        let fut = async {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await?;
            if n == 0 {
                return Err(Error::Closed);
            }
            Ok(line.trim_end().to_string())
        };
        let line = tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout(timeout))??;
        debug!("<< {}", preview(&line));
        Ok(line)
    }

    /// Performs one read of whatever bytes are available, bounded by the
    /// read timeout.
    ///
    /// Callers accumulate chunks until their completion predicate
    /// matches; see [`LineStream::await_match`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] on EOF and [`Error::Timeout`] on budget
    /// expiry.
    pub async fn read_chunk(&mut self) -> Result<String> {
        let timeout = self.read_timeout;
        let fut = async {
            let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];
            let n = self.reader.read(&mut buf).await?;
            if n == 0 {
                return Err(Error::Closed);
            }
            buf.truncate(n);
            Ok(String::from_utf8_lossy(&buf).into_owned())
        };
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }

    /// Accumulates chunks until `done` matches a complete line, bounded
    /// by the operation timeout.
    ///
    /// Returns the full accumulated transcript so the caller can inspect
    /// untagged data preceding the terminal line (search results, server
    /// hints embedded in rejection text).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the exchange as a whole exceeds the
    /// operation budget.
    pub async fn await_match<F>(&mut self, done: F) -> Result<String>
    where
        F: Fn(&str) -> bool,
    {
        let timeout = self.op_timeout;
        let fut = async {
            let mut transcript = String::new();
            loop {
                let chunk = self.read_chunk().await?;
                transcript.push_str(&chunk);
                if transcript
                    .lines()
                    .any(|line| done(line.trim_end_matches('\r')))
                {
                    return Ok::<_, Error>(transcript);
                }
            }
        };
        let transcript = tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout(timeout))??;
        debug!("<< {}", preview(&transcript));
        Ok(transcript)
    }

    /// Accumulates chunks until the tagged terminal line for `tag`
    /// appears.
    ///
    /// A line terminates the exchange when it starts with `<tag> <sfx>`
    /// for one of `suffixes` (defaults: OK, NO, BAD via
    /// [`TAGGED_SUFFIXES`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the exchange exceeds the operation
    /// budget.
    pub async fn await_tag(&mut self, tag: &str, suffixes: &[&str]) -> Result<String> {
        self.await_match(|line| is_tagged_line(line, tag, suffixes))
            .await
    }

    /// Gets a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.reader.get_mut()
    }

    /// Consumes the line stream and returns the inner stream.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Returns true if `line` is the tagged terminal line for `tag`.
#[must_use]
pub fn is_tagged_line(line: &str, tag: &str, suffixes: &[&str]) -> bool {
    let Some(rest) = line.strip_prefix(tag) else {
        return false;
    };
    let Some(rest) = rest.strip_prefix(' ') else {
        return false;
    };
    suffixes
        .iter()
        .any(|sfx| rest.starts_with(sfx))
}

fn preview(text: &str) -> String {
    text.chars()
        .take(LOG_PREVIEW_LEN)
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_tagged_line() {
        assert!(is_tagged_line("A0001 OK APPEND done", "A0001", TAGGED_SUFFIXES));
        assert!(is_tagged_line("A0001 NO no such mailbox", "A0001", TAGGED_SUFFIXES));
        assert!(is_tagged_line("A0001 BAD syntax", "A0001", TAGGED_SUFFIXES));
        assert!(!is_tagged_line("A0002 OK done", "A0001", TAGGED_SUFFIXES));
        assert!(!is_tagged_line("* SEARCH 42", "A0001", TAGGED_SUFFIXES));
        assert!(!is_tagged_line("A0001", "A0001", TAGGED_SUFFIXES));
    }

    #[tokio::test]
    async fn test_write_and_read_line() {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = LineStream::new(client, Duration::from_secs(1), Duration::from_secs(2));

        let mut server = LineStream::new(server, Duration::from_secs(1), Duration::from_secs(2));
        stream.write_line("EHLO localhost").await.unwrap();
        assert_eq!(server.read_line().await.unwrap(), "EHLO localhost");

        server.write_line("250 OK").await.unwrap();
        assert_eq!(stream.read_line().await.unwrap(), "250 OK");
    }

    #[tokio::test]
    async fn test_await_tag_accumulates_untagged_lines() {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = LineStream::new(client, Duration::from_secs(1), Duration::from_secs(2));
        let mut peer = LineStream::new(server, Duration::from_secs(1), Duration::from_secs(2));

        peer.write_line("* SEARCH 42 43").await.unwrap();
        peer.write_line("A0001 OK SEARCH completed").await.unwrap();

        let transcript = stream.await_tag("A0001", TAGGED_SUFFIXES).await.unwrap();
        assert!(transcript.contains("* SEARCH 42 43"));
        assert!(transcript.contains("A0001 OK"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout_is_distinct() {
        let (client, _server) = tokio::io::duplex(1024);
        let mut stream =
            LineStream::new(client, Duration::from_millis(100), Duration::from_secs(2));

        let err = stream.read_line().await.unwrap_err();
        assert!(err.is_timeout());
    }
}
