//! Type-state IMAP client.
//!
//! Sessions are short-lived and single-purpose: login, one or a few
//! transactional commands, logout. The state chain is
//! `NotAuthenticated` → `Authenticated` → `Selected`.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pingpost_wire::{connect_tls, is_tagged_line, LineStream, TagGenerator, WireStream, TAGGED_SUFFIXES};
use tracing::debug;

use crate::date::imap_date;
use crate::error::{Error, Result};

/// Type-state marker for a fresh connection.
#[derive(Debug)]
pub struct NotAuthenticated;

/// Type-state marker for an authenticated session.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for a session with a mailbox selected.
#[derive(Debug)]
pub struct Selected;

/// Outcome of an APPEND attempt.
#[derive(Debug, Clone)]
pub enum AppendOutcome {
    /// The server accepted the message.
    Accepted,
    /// The server refused; the full response text is preserved so the
    /// caller can look for an embedded mailbox-prefix hint.
    Rejected {
        /// Accumulated server response for the attempt.
        response: String,
    },
}

/// IMAP client with type-state pattern.
pub struct Client<State> {
    stream: LineStream<WireStream>,
    tags: TagGenerator,
    _state: PhantomData<State>,
}

impl<State> fmt::Debug for Client<State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &std::any::type_name::<State>())
            .finish_non_exhaustive()
    }
}

impl Client<NotAuthenticated> {
    /// Connects over implicit TLS and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, handshake, or greeting fails
    /// or exceeds its budget.
    pub async fn connect(
        host: &str,
        port: u16,
        read_timeout: Duration,
        op_timeout: Duration,
    ) -> Result<Self> {
        let stream = connect_tls(host, port, op_timeout).await?;
        Self::from_stream(stream, read_timeout, op_timeout).await
    }

    /// Creates a client from an existing stream and reads the greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is not `* OK`.
    pub async fn from_stream(
        stream: WireStream,
        read_timeout: Duration,
        op_timeout: Duration,
    ) -> Result<Self> {
        let mut stream = LineStream::new(stream, read_timeout, op_timeout);
        let greeting = stream.read_line().await?;
        if !greeting.starts_with("* OK") {
            return Err(Error::Protocol(format!("Unexpected greeting: {greeting}")));
        }

        Ok(Self {
            stream,
            tags: TagGenerator::default(),
            _state: PhantomData,
        })
    }

    /// Authenticates with LOGIN.
    ///
    /// A rejected login still sends LOGOUT before the error surfaces;
    /// the consuming transition would otherwise drop the connection
    /// without a goodbye.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoginRejected`] if the server answers NO or BAD.
    pub async fn login(mut self, username: &str, password: &str) -> Result<Client<Authenticated>> {
        let tag = self.tags.next();
        let cmd = format!("{tag} LOGIN {} {}", quote(username), quote(password));
        self.stream.write_line_redacted(&cmd).await?;

        let transcript = self.stream.await_tag(&tag, TAGGED_SUFFIXES).await?;
        match tagged_status(&transcript, &tag) {
            Some(TaggedStatus::Ok) => {
                debug!("logged in as {username}");
                Ok(Client {
                    stream: self.stream,
                    tags: self.tags,
                    _state: PhantomData,
                })
            }
            _ => {
                let err = Error::LoginRejected(terminal_line(&transcript, &tag));
                let _ = self.logout().await;
                Err(err)
            }
        }
    }
}

impl Client<Authenticated> {
    /// Selects a mailbox.
    ///
    /// Sessions here are single-purpose, so a refused SELECT ends the
    /// session: LOGOUT is sent before the error surfaces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] or [`Error::Bad`] if the mailbox cannot be
    /// selected.
    pub async fn select(mut self, mailbox: &str) -> Result<Client<Selected>> {
        let tag = self.tags.next();
        let cmd = format!("{tag} SELECT {}", quote(mailbox));
        self.stream.write_line(&cmd).await?;

        let transcript = self.stream.await_tag(&tag, TAGGED_SUFFIXES).await?;
        match tagged_status(&transcript, &tag) {
            Some(TaggedStatus::Ok) => Ok(Client {
                stream: self.stream,
                tags: self.tags,
                _state: PhantomData,
            }),
            Some(TaggedStatus::No) => {
                let err = Error::No(terminal_line(&transcript, &tag));
                let _ = self.logout().await;
                Err(err)
            }
            _ => {
                let err = Error::Bad(terminal_line(&transcript, &tag));
                let _ = self.logout().await;
                Err(err)
            }
        }
    }

    /// Appends `message` to `mailbox` using an exact byte-count literal.
    ///
    /// The literal body is only written after the server grants a `+`
    /// continuation; a rejection before that point never transmits the
    /// message. A refusal is an [`AppendOutcome::Rejected`] carrying the
    /// response text, not an error; the caller decides whether to try
    /// another candidate mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures (I/O, timeout) or
    /// protocol violations.
    pub async fn append(&mut self, mailbox: &str, message: &[u8]) -> Result<AppendOutcome> {
        let tag = self.tags.next();
        let cmd = format!("{tag} APPEND {} {{{}}}", quote(mailbox), message.len());
        self.stream.write_line(&cmd).await?;

        // Read until either a continuation prompt or a tagged terminal.
        let transcript = self
            .stream
            .await_match(|line| {
                line.starts_with('+') || is_tagged_line(line, &tag, TAGGED_SUFFIXES)
            })
            .await?;

        if let Some(status) = tagged_status(&transcript, &tag) {
            // Terminal without continuation: the server refused up front.
            return match status {
                TaggedStatus::Ok => Err(Error::Protocol(
                    "APPEND accepted without receiving the literal".into(),
                )),
                TaggedStatus::No | TaggedStatus::Bad => Ok(AppendOutcome::Rejected {
                    response: transcript,
                }),
            };
        }

        if !has_continuation(&transcript) {
            return Err(Error::Protocol("expected continuation for APPEND".into()));
        }

        self.stream.write_raw(message).await?;
        self.stream.write_raw(b"\r\n").await?;

        let transcript = self.stream.await_tag(&tag, TAGGED_SUFFIXES).await?;
        match tagged_status(&transcript, &tag) {
            Some(TaggedStatus::Ok) => Ok(AppendOutcome::Accepted),
            _ => Ok(AppendOutcome::Rejected {
                response: transcript,
            }),
        }
    }
}

impl Client<Selected> {
    /// Searches for messages from `sender` received since `since`.
    ///
    /// Returns the matched sequence numbers; an empty vector means no
    /// reply was found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] or [`Error::Bad`] if the server refuses the
    /// search.
    pub async fn search_from_since(
        &mut self,
        sender: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<u32>> {
        let tag = self.tags.next();
        let cmd = format!(
            "{tag} SEARCH FROM {} SINCE {}",
            quote(sender),
            imap_date(since)
        );
        self.stream.write_line(&cmd).await?;

        let transcript = self.stream.await_tag(&tag, TAGGED_SUFFIXES).await?;
        match tagged_status(&transcript, &tag) {
            Some(TaggedStatus::Ok) => Ok(search_ids(&transcript)),
            Some(TaggedStatus::No) => Err(Error::No(terminal_line(&transcript, &tag))),
            _ => Err(Error::Bad(terminal_line(&transcript, &tag))),
        }
    }
}

impl<S> Client<S> {
    /// Gracefully disconnects from the server.
    ///
    /// The response is not awaited strictly; a peer that drops the
    /// connection after BYE is fine.
    ///
    /// # Errors
    ///
    /// Returns an error if the LOGOUT command cannot be written.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tags.next();
        self.stream.write_line(&format!("{tag} LOGOUT")).await?;
        let _ = self.stream.await_tag(&tag, TAGGED_SUFFIXES).await;
        Ok(())
    }
}

/// Quotes a string per RFC 3501, escaping backslash and double-quote.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '\\' || c == '"' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaggedStatus {
    Ok,
    No,
    Bad,
}

/// Finds the tagged terminal line for `tag` and classifies it.
fn tagged_status(transcript: &str, tag: &str) -> Option<TaggedStatus> {
    for line in transcript.lines() {
        let line = line.trim_end_matches('\r');
        let Some(rest) = line.strip_prefix(tag) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(' ') else {
            continue;
        };
        if rest.starts_with("OK") {
            return Some(TaggedStatus::Ok);
        }
        if rest.starts_with("NO") {
            return Some(TaggedStatus::No);
        }
        if rest.starts_with("BAD") {
            return Some(TaggedStatus::Bad);
        }
    }
    None
}

/// Returns the tagged terminal line, or the whole transcript when the
/// tag is missing (diagnostics only).
fn terminal_line(transcript: &str, tag: &str) -> String {
    transcript
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .find(|l| l.starts_with(tag))
        .unwrap_or(transcript.trim_end())
        .to_string()
}

/// Returns true if the transcript contains a `+` continuation line.
fn has_continuation(transcript: &str) -> bool {
    transcript
        .lines()
        .any(|l| l.trim_end_matches('\r').starts_with('+'))
}

/// Extracts ids from `* SEARCH` result lines.
fn search_ids(transcript: &str) -> Vec<u32> {
    let mut ids = Vec::new();
    for line in transcript.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("* SEARCH") {
            ids.extend(rest.split_whitespace().filter_map(|t| t.parse::<u32>().ok()));
        }
    }
    ids
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("INBOX.Sent"), "\"INBOX.Sent\"");
        assert_eq!(quote("Sent Items"), "\"Sent Items\"");
        assert_eq!(quote("we\"ird"), "\"we\\\"ird\"");
        assert_eq!(quote("back\\slash"), "\"back\\\\slash\"");
    }

    #[test]
    fn test_tagged_status() {
        let transcript = "* SEARCH 1 2\r\nA0001 OK SEARCH completed\r\n";
        assert_eq!(tagged_status(transcript, "A0001"), Some(TaggedStatus::Ok));
        assert_eq!(tagged_status(transcript, "A0002"), None);

        let no = "A0003 NO [CANNOT] nope\r\n";
        assert_eq!(tagged_status(no, "A0003"), Some(TaggedStatus::No));
    }

    #[test]
    fn test_search_ids() {
        assert_eq!(search_ids("* SEARCH 42\r\nA0001 OK done\r\n"), vec![42]);
        assert_eq!(
            search_ids("* SEARCH 1 2 3\r\nA0001 OK done\r\n"),
            vec![1, 2, 3]
        );
        assert!(search_ids("* SEARCH\r\nA0001 OK done\r\n").is_empty());
        assert!(search_ids("A0001 OK done\r\n").is_empty());
    }

    #[test]
    fn test_has_continuation() {
        assert!(has_continuation("+ Ready for literal data\r\n"));
        assert!(!has_continuation("A0001 NO rejected\r\n"));
    }
}
