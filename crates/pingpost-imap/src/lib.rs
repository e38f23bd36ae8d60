//! # pingpost-imap
//!
//! Minimal IMAP client covering exactly what the archiver and reply
//! detector need: LOGIN, SELECT, SEARCH FROM/SINCE, APPEND with
//! byte-exact literal handling, LOGOUT.
//!
//! The sent-folder discovery helpers in [`mailbox`] are pure functions
//! so the adaptive prefix negotiation can be tested without a socket.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod date;
mod error;
pub mod mailbox;

pub use client::{AppendOutcome, Authenticated, Client, NotAuthenticated, Selected};
pub use date::imap_date;
pub use error::{Error, Result};
pub use mailbox::{apply_prefix, prefix_hint, sent_candidates};
