//! # pingpost-mime
//!
//! Hand-rolled MIME construction for outgoing mail.
//!
//! A message carries a plain-text body, an HTML body, or both. With one
//! body the message is a single part with a matching top-level
//! `Content-Type`; with both it becomes a `multipart/mixed` envelope
//! whose boundary token is derived from the current time and unique per
//! send.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod builder;
mod content_type;
mod error;

pub use builder::{time_boundary, OutgoingMail};
pub use content_type::ContentType;
pub use error::{Error, Result};
