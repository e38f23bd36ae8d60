//! Type-state SMTP client.
//!
//! The state chain enforces the delivery sequence at compile time:
//! `Connected` → `Authenticated` → `MailTransaction` → `RecipientAdded`
//! → `Data` → back to `Authenticated`.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use base64::Engine;
use pingpost_wire::{connect_tls, LineStream, WireStream};
use tracing::debug;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::reply::{Reply, ReplyCode};

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
pub struct Client<State> {
    stream: LineStream<WireStream>,
    _state: PhantomData<State>,
}

impl<State> fmt::Debug for Client<State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &std::any::type_name::<State>())
            .finish_non_exhaustive()
    }
}

impl Client<Connected> {
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
    /// Used with a plaintext stream by the scripted-server tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is missing or not a 220.
    pub async fn from_stream(
        stream: WireStream,
        read_timeout: Duration,
        op_timeout: Duration,
    ) -> Result<Self> {
        let mut stream = LineStream::new(stream, read_timeout, op_timeout);
        let greeting = read_reply(&mut stream).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(Error::smtp_error(
                greeting.code.as_u16(),
                greeting.message_text(),
            ));
        }

        Ok(Self {
            stream,
            _state: PhantomData,
        })
    }

    /// Sends EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let reply = self
            .exchange(&Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }
        Ok(self)
    }

    /// Authenticates using the AUTH LOGIN challenge/response exchange:
    /// base64 username, base64 password, then a 235 acceptance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthRejected`] if any step of the exchange is
    /// refused.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let engine = base64::engine::general_purpose::STANDARD;

        let reply = self.exchange(&Command::AuthLogin).await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(auth_rejected(&reply));
        }

        self.stream
            .write_line_redacted(&engine.encode(username.as_bytes()))
            .await?;
        let reply = read_reply(&mut self.stream).await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(auth_rejected(&reply));
        }

        self.stream
            .write_line_redacted(&engine.encode(password.as_bytes()))
            .await?;
        let reply = read_reply(&mut self.stream).await?;
        if reply.code != ReplyCode::AUTH_SUCCESS {
            return Err(auth_rejected(&reply));
        }

        debug!("authenticated");
        Ok(Client {
            stream: self.stream,
            _state: PhantomData,
        })
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: &str) -> Result<Client<MailTransaction>> {
        let reply = self
            .exchange(&Command::MailFrom { from: from.into() })
            .await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            _state: PhantomData,
        })
    }
}

impl Client<MailTransaction> {
    /// Adds the recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecipientRejected`] if the server answers with
    /// anything other than 250.
    pub async fn rcpt_to(mut self, to: &str) -> Result<Client<RecipientAdded>> {
        let reply = self.exchange(&Command::RcptTo { to: to.into() }).await?;

        if reply.code != ReplyCode::OK {
            return Err(Error::RecipientRejected {
                code: reply.code.as_u16(),
                message: reply.message_text(),
            });
        }

        Ok(Client {
            stream: self.stream,
            _state: PhantomData,
        })
    }
}

impl Client<RecipientAdded> {
    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command is not answered with 354.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let reply = self.exchange(&Command::Data).await?;

        if reply.code != ReplyCode::START_DATA {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            _state: PhantomData,
        })
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, leading dots are stuffed,
    /// and the terminating `.` line is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails or the server rejects the
    /// message.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Authenticated>> {
        let mut wire = Vec::with_capacity(message.len() + 8);
        for line in message.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            // Byte-stuff lines starting with '.'
            if line.first() == Some(&b'.') {
                wire.push(b'.');
            }
            wire.extend_from_slice(line);
            wire.extend_from_slice(b"\r\n");
        }
        // A trailing newline in the input yields one empty split piece;
        // drop the line it produced so the message is not extended.
        if message.last() == Some(&b'\n') {
            wire.truncate(wire.len() - 2);
        }
        wire.extend_from_slice(b".\r\n");
        self.stream.write_raw(&wire).await?;

        let reply = read_reply(&mut self.stream).await?;
        if reply.code != ReplyCode::OK {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            _state: PhantomData,
        })
    }
}

// Common implementation for all states
impl<S> Client<S> {
    async fn exchange(&mut self, cmd: &Command) -> Result<Reply> {
        self.stream.write_line(&cmd.serialize()).await?;
        read_reply(&mut self.stream).await
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.exchange(&Command::Quit).await?;

        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }
        Ok(())
    }
}

async fn read_reply(stream: &mut LineStream<WireStream>) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

fn auth_rejected(reply: &Reply) -> Error {
    Error::AuthRejected {
        code: reply.code.as_u16(),
        message: reply.message_text(),
    }
}
