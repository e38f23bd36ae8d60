//! Scheduled mailing dispatcher.
//!
//! Promotes due mailings from pending to sending and fans out one
//! delivery task per pending recipient. Deliveries are fire-and-forget:
//! their failures surface through recipient state, and duplicate
//! dispatch is harmless thanks to the delivery engine's idempotency
//! guard.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::model::MailingStatus;
use crate::service::delivery;
use crate::store::Store;

/// Counts returned by one dispatcher run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DispatchReport {
    /// Mailings promoted to sending.
    pub mailings: usize,
    /// Delivery tasks spawned.
    pub recipients: usize,
}

/// Runs one dispatcher pass.
///
/// # Errors
///
/// Returns an error if the due-mailing scan itself fails; per-mailing
/// failures are logged and skipped.
pub async fn run_dispatch(store: Arc<Store>, config: Arc<Config>) -> Result<DispatchReport> {
    let due = store.due_mailings(Utc::now()).await?;
    let mut report = DispatchReport::default();

    for mailing in due {
        if let Err(err) = store
            .set_mailing_status(&mailing.id, MailingStatus::Sending)
            .await
        {
            warn!(mailing_id = %mailing.id, error = %err, "failed to mark mailing sending");
            continue;
        }
        report.mailings += 1;

        let recipients = match store.pending_recipients(&mailing.id).await {
            Ok(recipients) => recipients,
            Err(err) => {
                warn!(mailing_id = %mailing.id, error = %err, "failed to load recipients");
                continue;
            }
        };

        info!(mailing_id = %mailing.id, count = recipients.len(), "dispatching mailing");
        for recipient in recipients {
            let store = Arc::clone(&store);
            let config = Arc::clone(&config);
            report.recipients += 1;
            tokio::spawn(async move {
                if let Err(err) =
                    delivery::deliver_recipient(&store, &config, &recipient.id).await
                {
                    warn!(recipient_id = %recipient.id, error = %err, "delivery task failed");
                }
            });
        }
    }

    Ok(report)
}
