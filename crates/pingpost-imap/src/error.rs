//! Error types for the IMAP client.

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (socket, TLS, timeout).
    #[error(transparent)]
    Wire(#[from] pingpost_wire::Error),

    /// Login was refused.
    #[error("Login rejected: {0}")]
    LoginRejected(String),

    /// Server returned NO for a command.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD for a command.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns true if the underlying failure was a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Wire(e) if e.is_timeout())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
