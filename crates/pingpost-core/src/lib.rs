//! # pingpost-core
//!
//! Business logic for the bulk-mail pipeline: the outbound delivery
//! engine, the scheduled dispatcher, the sent-folder archiver, the
//! reply detector and the follow-up ping scheduler, plus the HTTP
//! data-store client they all share.
//!
//! The protocol plumbing lives in the sibling crates; this one decides
//! what to send, when, and what to record about it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use store::Store;
