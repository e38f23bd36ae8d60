//! Error types for SMTP operations.

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (socket, TLS, timeout).
    #[error(transparent)]
    Wire(#[from] pingpost_wire::Error),

    /// Server returned an error response.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Server rejected the AUTH LOGIN exchange.
    #[error("Authentication rejected ({code}): {message}")]
    AuthRejected {
        /// Reply code from the failing step.
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Server rejected the recipient at RCPT TO.
    #[error("Recipient rejected ({code}): {message}")]
    RecipientRejected {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Protocol error (malformed or unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the underlying failure was a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Wire(e) if e.is_timeout())
    }
}
