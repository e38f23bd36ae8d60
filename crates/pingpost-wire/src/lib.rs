//! # pingpost-wire
//!
//! Shared client half of the tagged request/response convention SMTP
//! and IMAP both follow over a TLS socket: CRLF line I/O, per-operation
//! timeouts, and unique-tag command/response correlation.
//!
//! Every read and write is individually timeout-bounded; budget expiry
//! surfaces as [`Error::Timeout`], distinct from protocol errors, so
//! that operability tooling can tell a slow server from a hostile one.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod line;
mod stream;
mod tag;

pub use error::{Error, Result};
pub use line::{is_tagged_line, LineStream, TAGGED_SUFFIXES};
pub use stream::{connect_plain, connect_tls, create_tls_connector, WireStream};
pub use tag::TagGenerator;
