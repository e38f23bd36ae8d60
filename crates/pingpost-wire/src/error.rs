//! Error types for the protocol driver.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while driving a tagged-line protocol session.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Operation exceeded its time budget.
    ///
    /// Kept distinct from [`Error::Protocol`] so that timeouts are
    /// visible as such in logs and per-unit failure records.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Peer closed the connection mid-exchange.
    #[error("Connection closed by peer")]
    Closed,

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns true if this error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
