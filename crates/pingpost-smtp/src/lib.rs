//! # pingpost-smtp
//!
//! Minimal SMTP client for one-recipient bulk mail delivery.
//!
//! Implements the exact sequence the delivery engine needs over a
//! [`pingpost_wire`] line stream: implicit-TLS connect, EHLO, AUTH LOGIN
//! (base64 username, base64 password, 235 acceptance), MAIL FROM,
//! RCPT TO, DATA with dot-stuffing, QUIT.
//!
//! The type-state [`Client`] makes out-of-order commands unrepresentable:
//!
//! ```text
//! Connected ── auth_login() ──→ Authenticated ── mail_from() ──→
//! MailTransaction ── rcpt_to() ──→ RecipientAdded ── data() ──→ Data
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
mod client;
mod error;
pub mod parser;
mod reply;

pub use client::{Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded};
pub use error::{Error, Result};
pub use reply::{Reply, ReplyCode};
