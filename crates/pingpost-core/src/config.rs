//! Environment configuration.
//!
//! Every knob has a sane default so a bare deployment only needs the
//! store coordinates.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the HTTP data API.
    pub store_url: String,
    /// Service credential for the data API.
    pub store_service_key: String,
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (implicit TLS).
    pub smtp_port: u16,
    /// Whether SMTP uses TLS (disabled only by scripted-server tests).
    pub smtp_tls: bool,
    /// IMAP server hostname.
    pub imap_host: String,
    /// IMAP server port (implicit TLS).
    pub imap_port: u16,
    /// Whether IMAP uses TLS (disabled only by scripted-server tests).
    pub imap_tls: bool,
    /// Cap on an incoming request payload.
    pub max_request_bytes: usize,
    /// Cap on a message given to the archiver.
    pub max_message_bytes: usize,
    /// Budget for one protocol command exchange (`IMAP_OP_TIMEOUT_SECS`;
    /// the SMTP side adopts the same budget).
    pub op_timeout: Duration,
    /// Budget for one socket read (`IMAP_READ_TIMEOUT_SECS`).
    pub read_timeout: Duration,
    /// Wall-clock budget for a whole handler invocation.
    pub handler_timeout: Duration,
    /// Cap on sent-folder candidate APPEND attempts.
    pub max_mailbox_attempts: u32,
    /// Listen address for the HTTP surface.
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: String::new(),
            store_service_key: String::new(),
            smtp_host: "smtp.hostinger.com".into(),
            smtp_port: 465,
            smtp_tls: true,
            imap_host: "imap.hostinger.com".into(),
            imap_port: 993,
            imap_tls: true,
            max_request_bytes: 64 * 1024,
            max_message_bytes: 256 * 1024,
            op_timeout: Duration::from_secs(20),
            read_timeout: Duration::from_secs(8),
            handler_timeout: Duration::from_secs(50),
            max_mailbox_attempts: 8,
            bind_addr: "0.0.0.0:8080".into(),
        }
    }
}

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a numeric variable fails to parse
    /// or a required variable is missing.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            store_url: require("STORE_URL")?,
            store_service_key: require("STORE_SERVICE_KEY")?,
            smtp_host: var_or("SMTP_HOST", defaults.smtp_host),
            smtp_port: parse_or("SMTP_PORT", defaults.smtp_port)?,
            smtp_tls: parse_or("SMTP_TLS", defaults.smtp_tls)?,
            imap_host: var_or("IMAP_HOST", defaults.imap_host),
            imap_port: parse_or("IMAP_PORT", defaults.imap_port)?,
            imap_tls: parse_or("IMAP_TLS", defaults.imap_tls)?,
            max_request_bytes: parse_or("MAX_REQUEST_BYTES", defaults.max_request_bytes)?,
            max_message_bytes: parse_or("MAX_MESSAGE_BYTES", defaults.max_message_bytes)?,
            op_timeout: Duration::from_secs(parse_or(
                "IMAP_OP_TIMEOUT_SECS",
                defaults.op_timeout.as_secs(),
            )?),
            read_timeout: Duration::from_secs(parse_or(
                "IMAP_READ_TIMEOUT_SECS",
                defaults.read_timeout.as_secs(),
            )?),
            handler_timeout: Duration::from_secs(parse_or(
                "HANDLER_TIMEOUT_SECS",
                defaults.handler_timeout.as_secs(),
            )?),
            max_mailbox_attempts: parse_or("MAX_MAILBOX_ATTEMPTS", defaults.max_mailbox_attempts)?,
            bind_addr: var_or("BIND_ADDR", defaults.bind_addr),
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{name} must be set")))
}

fn var_or(name: &str, default: String) -> String {
    env::var(name).unwrap_or(default)
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{name} has invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}
