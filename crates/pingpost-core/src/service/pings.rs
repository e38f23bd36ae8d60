//! Follow-up ping scheduler.
//!
//! Sends a single follow-up to every contact who has not replied within
//! the configured wait window. The template comes from the contact's
//! first group when one defines it; otherwise a generic built-in is
//! used. `[NAME]` placeholders resolve to the contact's name, falling
//! back to their address.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Contact, PingTracking};
use crate::service::{archive, outbound};
use crate::store::Store;

/// Built-in follow-up used when the contact's group defines none.
const DEFAULT_SUBJECT: &str = "Just checking in";
const DEFAULT_TEXT: &str = "Hi [NAME],\n\n\
    I wanted to follow up on my previous email. Did you have a chance \
    to take a look?\n\nBest regards";

/// Counts returned by one ping-scheduler run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PingScanReport {
    /// Trackings examined.
    pub checked: usize,
    /// Follow-ups delivered.
    pub pings_sent: usize,
    /// Trackings still inside the wait window.
    pub skipped: usize,
    /// Trackings that failed to process.
    pub errors: usize,
}

/// Resolved follow-up content for one tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingContent {
    /// Subject line with placeholders resolved.
    pub subject: String,
    /// Text body, if the template defines one.
    pub text: Option<String>,
    /// HTML body, if the template defines one.
    pub html: Option<String>,
}

/// Runs one ping-scheduler pass over all awaiting trackings.
///
/// A send failure leaves its tracking awaiting so the next run retries;
/// per-tracking failures never abort the run.
///
/// # Errors
///
/// Returns an error only when the tracking scan or settings load fails.
pub async fn run_ping_scan(store: Arc<Store>, config: Arc<Config>) -> Result<PingScanReport> {
    let settings = store.ping_settings().await?;
    let wait = ChronoDuration::hours(settings.wait_time_hours);
    let trackings = store.awaiting_trackings().await?;
    let mut report = PingScanReport::default();

    for tracking in trackings {
        report.checked += 1;
        let elapsed = Utc::now() - tracking.initial_sent_at;
        if elapsed < wait {
            debug!(tracking_id = %tracking.id, "still inside wait window");
            report.skipped += 1;
            continue;
        }
        match send_ping(&store, &config, &tracking).await {
            Ok(()) => report.pings_sent += 1,
            Err(err) => {
                report.errors += 1;
                warn!(tracking_id = %tracking.id, error = %err, "ping failed");
            }
        }
    }

    info!(
        checked = report.checked,
        sent = report.pings_sent,
        skipped = report.skipped,
        errors = report.errors,
        "ping scan finished"
    );
    Ok(report)
}

/// Sends the follow-up for one overdue tracking and records it.
async fn send_ping(store: &Arc<Store>, config: &Arc<Config>, tracking: &PingTracking) -> Result<()> {
    let contact = store
        .contact(&tracking.contact_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("contact {}", tracking.contact_id)))?;
    let account = store
        .sender_account(&tracking.email_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("sender account {}", tracking.email_id)))?;

    let group = store.first_group_for_contact(&contact.id).await?;
    // A group without a subject has no usable template.
    let template = group.and_then(|g| Some((g.ping_subject?, g.ping_text, g.ping_html)));
    let content = resolve_content(&contact, template);

    let rendered = outbound::send_mail(
        config,
        &account,
        &contact.email,
        &content.subject,
        content.text.as_deref(),
        content.html.as_deref(),
    )
    .await?;

    store
        .mark_ping_sent(
            &tracking.id,
            Utc::now(),
            &content.subject,
            content.text.as_deref(),
            content.html.as_deref(),
        )
        .await?;
    info!(tracking_id = %tracking.id, contact = %contact.email, "ping sent");

    // Archive best-effort in the background; a full sent folder must
    // not cost us the recorded send.
    let config = Arc::clone(config);
    tokio::spawn(async move {
        if let Err(err) =
            archive::archive_to_sent(&config, &account.email, &account.password, &rendered).await
        {
            warn!(account = %account.email, error = %err, "ping archive failed");
        }
    });

    Ok(())
}

/// Resolves the follow-up content for a contact from an optional group
/// template `(subject, text, html)`.
fn resolve_content(
    contact: &Contact,
    template: Option<(String, Option<String>, Option<String>)>,
) -> PingContent {
    let name = contact.name.as_deref().unwrap_or(&contact.email);
    match template {
        Some((subject, text, html)) => PingContent {
            subject: substitute(&subject, name),
            text: text.map(|t| substitute(&t, name)),
            html: html.map(|h| substitute(&h, name)),
        },
        None => PingContent {
            subject: DEFAULT_SUBJECT.to_string(),
            text: Some(substitute(DEFAULT_TEXT, name)),
            html: None,
        },
    }
}

fn substitute(template: &str, name: &str) -> String {
    template.replace("[NAME]", name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn contact(name: Option<&str>) -> Contact {
        Contact {
            id: "c1".into(),
            name: name.map(String::from),
            email: "ada@example.com".into(),
        }
    }

    #[test]
    fn test_group_template_substitution() {
        let content = resolve_content(
            &contact(Some("Ada")),
            Some((
                "Re: [NAME]".into(),
                Some("Hello [NAME]!".into()),
                Some("<p>[NAME]</p>".into()),
            )),
        );
        assert_eq!(content.subject, "Re: Ada");
        assert_eq!(content.text.unwrap(), "Hello Ada!");
        assert_eq!(content.html.unwrap(), "<p>Ada</p>");
    }

    #[test]
    fn test_default_template_falls_back_to_email() {
        let content = resolve_content(&contact(None), None);
        assert_eq!(content.subject, DEFAULT_SUBJECT);
        assert!(content.text.unwrap().contains("ada@example.com"));
        assert!(content.html.is_none());
    }
}
