//! Outbound delivery engine.
//!
//! Sends one mailing to one recipient and performs the bookkeeping on
//! both outcomes. The bookkeeping is an unconditional finalization step
//! keyed off ids captured before the attempt, so a failure mid-send
//! still lands in the store before the invocation returns.

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{MailingStatus, Recipient, RecipientStatus};
use crate::service::outbound;
use crate::store::Store;

/// Result of one delivery invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The message was delivered and the recipient marked sent.
    Sent,
    /// The recipient was no longer pending; nothing was done.
    AlreadyProcessed,
    /// The attempt failed; the recipient was marked failed.
    Failed {
        /// Error text recorded on the recipient.
        error: String,
    },
}

/// Delivers one recipient's mailing.
///
/// Invoking this twice for the same recipient is safe: the second call
/// observes the non-pending status and returns
/// [`DeliveryOutcome::AlreadyProcessed`] without touching the network.
///
/// # Errors
///
/// Returns an error only when the store itself is unreachable; send
/// failures are recorded on the recipient and reported as
/// [`DeliveryOutcome::Failed`].
pub async fn deliver_recipient(
    store: &Store,
    config: &Config,
    recipient_id: &str,
) -> Result<DeliveryOutcome> {
    let recipient = store
        .recipient(recipient_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("recipient {recipient_id}")))?;

    // Idempotency guard: exactly one invocation transitions a recipient
    // away from pending.
    if recipient.status != RecipientStatus::Pending {
        info!(recipient_id, status = ?recipient.status, "already processed");
        return Ok(DeliveryOutcome::AlreadyProcessed);
    }

    let attempt = attempt_send(store, config, &recipient).await;
    finalize(store, &recipient, attempt).await
}

/// Loads the related rows and runs the SMTP exchange.
async fn attempt_send(store: &Store, config: &Config, recipient: &Recipient) -> Result<()> {
    let mailing = store
        .mailing(&recipient.mailing_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("mailing {}", recipient.mailing_id)))?;
    let contact = store
        .contact(&recipient.contact_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("contact {}", recipient.contact_id)))?;
    let account = store
        .sender_account(&recipient.email_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("sender account {}", recipient.email_id)))?;

    if mailing.body_text.is_none() && mailing.body_html.is_none() {
        return Err(Error::NoContent);
    }

    outbound::send_mail(
        config,
        &account,
        &contact.email,
        &mailing.subject,
        mailing.body_text.as_deref(),
        mailing.body_html.as_deref(),
    )
    .await?;
    Ok(())
}

/// Records the attempt's outcome on the recipient, the sender account
/// and the mailing, then re-evaluates mailing completion.
async fn finalize(
    store: &Store,
    recipient: &Recipient,
    attempt: Result<()>,
) -> Result<DeliveryOutcome> {
    let now = Utc::now();
    let outcome = match attempt {
        Ok(()) => {
            store.set_recipient_sent(&recipient.id, now).await?;
            store
                .increment("emails", &recipient.email_id, &["sent_count", "success_count"])
                .await?;
            store
                .increment(
                    "mailings",
                    &recipient.mailing_id,
                    &["sent_count", "success_count"],
                )
                .await?;
            store.insert_tracking(recipient, now).await?;
            info!(recipient_id = %recipient.id, "recipient delivered");
            DeliveryOutcome::Sent
        }
        Err(err) => {
            let error = err.to_string();
            if err.is_timeout() {
                warn!(recipient_id = %recipient.id, %error, "delivery timed out");
            } else {
                warn!(recipient_id = %recipient.id, %error, "delivery failed");
            }
            store.set_recipient_failed(&recipient.id, &error).await?;
            store
                .increment("emails", &recipient.email_id, &["sent_count", "failed_count"])
                .await?;
            store
                .increment(
                    "mailings",
                    &recipient.mailing_id,
                    &["sent_count", "failed_count"],
                )
                .await?;
            DeliveryOutcome::Failed { error }
        }
    };

    // Completion is re-evaluated after every individual recipient, so
    // out-of-order completions still converge on the final status.
    if !store.has_pending_recipients(&recipient.mailing_id).await? {
        store
            .set_mailing_status(&recipient.mailing_id, MailingStatus::Completed)
            .await?;
        info!(mailing_id = %recipient.mailing_id, "mailing completed");
    }

    Ok(outcome)
}
