//! Error types for MIME construction.

use thiserror::Error;

/// Errors that can occur while composing a message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Neither a plain-text nor an HTML body was provided.
    #[error("Message has no content: at least one of text or HTML body is required")]
    NoContent,

    /// A header value contains CR or LF.
    #[error("Header value contains line break: {0}")]
    InvalidHeader(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
