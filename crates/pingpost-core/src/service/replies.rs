//! Reply detector.
//!
//! Scans the inbox of every tracking still awaiting a response. Each
//! tracking is handled in isolation: a failing account or contact is
//! logged and counted, never aborts the run.

use chrono::Utc;
use pingpost_imap::{Client, NotAuthenticated};
use pingpost_wire::connect_plain;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::PingTracking;
use crate::store::Store;

/// Counts returned by one reply-detection run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReplyScanReport {
    /// Trackings examined.
    pub checked: usize,
    /// Trackings promoted to response-received.
    pub replies_found: usize,
    /// Trackings that failed to check.
    pub errors: usize,
}

/// Runs one reply-detection pass over all awaiting trackings.
///
/// # Errors
///
/// Returns an error only when the tracking scan itself fails.
pub async fn run_reply_scan(store: &Store, config: &Config) -> Result<ReplyScanReport> {
    let trackings = store.awaiting_trackings().await?;
    let mut report = ReplyScanReport::default();

    for tracking in trackings {
        report.checked += 1;
        match check_tracking(store, config, &tracking).await {
            Ok(true) => report.replies_found += 1,
            Ok(false) => {}
            Err(err) => {
                report.errors += 1;
                warn!(tracking_id = %tracking.id, error = %err, "reply check failed");
            }
        }
    }

    info!(
        checked = report.checked,
        replies = report.replies_found,
        errors = report.errors,
        "reply scan finished"
    );
    Ok(report)
}

/// Checks one tracking's inbox; returns true when a reply was found.
async fn check_tracking(store: &Store, config: &Config, tracking: &PingTracking) -> Result<bool> {
    let contact = store
        .contact(&tracking.contact_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("contact {}", tracking.contact_id)))?;
    let account = store
        .sender_account(&tracking.email_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("sender account {}", tracking.email_id)))?;

    // A refused LOGIN or SELECT logs out inside the client, so every
    // exit path here ends the session with a goodbye.
    let client = connect(config).await?;
    let client = client.login(&account.email, &account.password).await?;
    let mut client = client.select("INBOX").await?;

    let found = client
        .search_from_since(&contact.email, tracking.initial_sent_at)
        .await;
    let _ = client.logout().await;

    if found?.is_empty() {
        return Ok(false);
    }

    store.mark_response_received(&tracking.id, Utc::now()).await?;
    info!(tracking_id = %tracking.id, contact = %contact.email, "reply detected");
    Ok(true)
}

async fn connect(config: &Config) -> Result<Client<NotAuthenticated>> {
    if config.imap_tls {
        Ok(Client::connect(
            &config.imap_host,
            config.imap_port,
            config.read_timeout,
            config.op_timeout,
        )
        .await?)
    } else {
        // Plaintext path exists for scripted-server tests only.
        let stream = connect_plain(&config.imap_host, config.imap_port, config.op_timeout).await?;
        Ok(Client::from_stream(stream, config.read_timeout, config.op_timeout).await?)
    }
}
