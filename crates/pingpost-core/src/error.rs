//! Error types for the core library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (socket, TLS, timeout).
    #[error(transparent)]
    Wire(#[from] pingpost_wire::Error),

    /// SMTP exchange failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] pingpost_smtp::Error),

    /// IMAP exchange failed.
    #[error("IMAP error: {0}")]
    Imap(#[from] pingpost_imap::Error),

    /// Message construction failed.
    #[error("MIME error: {0}")]
    Mime(#[from] pingpost_mime::Error),

    /// Data store request failed at the HTTP layer.
    #[error("Store request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Data store answered with an error status.
    #[error("Store error {status}: {body}")]
    Store {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A referenced record does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Mailing has neither a text nor an HTML body.
    #[error("Mailing has no content")]
    NoContent,

    /// Message exceeds the configured size cap.
    #[error("Message too large: {size} bytes (limit {limit})")]
    MessageTooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Configured cap.
        limit: usize,
    },

    /// Request payload exceeds the configured size cap.
    #[error("Request too large: {size} bytes (limit {limit})")]
    RequestTooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Configured cap.
        limit: usize,
    },

    /// The whole handler exceeded its wall-clock budget.
    #[error("Handler timed out after {0:?}")]
    HandlerTimeout(Duration),

    /// Every candidate mailbox refused the APPEND.
    #[error("Archive failed after {attempts} mailbox attempts")]
    ArchiveExhausted {
        /// Number of APPEND attempts made.
        attempts: u32,
    },
}

impl Error {
    /// Returns true if the failure was a timeout at any layer.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        match self {
            Self::Wire(e) => e.is_timeout(),
            Self::Smtp(e) => e.is_timeout(),
            Self::Imap(e) => e.is_timeout(),
            Self::HandlerTimeout(_) => true,
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
