//! Store row types.
//!
//! These mirror the data API's tables. Status columns are lowercase
//! strings in the store; counters only ever grow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a mailing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailingStatus {
    /// Created, waiting for its schedule time.
    Pending,
    /// Picked up by the dispatcher; deliveries in flight.
    Sending,
    /// Every recipient has been processed.
    Completed,
    /// Marked failed by the dashboard.
    Failed,
}

/// One bulk-send campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mailing {
    /// Row id.
    pub id: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body, if any.
    pub body_text: Option<String>,
    /// HTML body, if any.
    pub body_html: Option<String>,
    /// When the mailing becomes due.
    pub scheduled_at: DateTime<Utc>,
    /// Timezone the schedule was entered in (informational).
    #[serde(default)]
    pub timezone: Option<String>,
    /// Lifecycle status.
    pub status: MailingStatus,
    /// Deliveries attempted.
    #[serde(default)]
    pub sent_count: i64,
    /// Deliveries that succeeded.
    #[serde(default)]
    pub success_count: i64,
    /// Deliveries that failed.
    #[serde(default)]
    pub failed_count: i64,
}

/// Lifecycle of one recipient of a mailing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientStatus {
    /// Not yet attempted.
    Pending,
    /// Delivered.
    Sent,
    /// Delivery failed.
    Failed,
}

/// Mailing × contact × sender-account pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// Row id.
    pub id: String,
    /// Parent mailing.
    pub mailing_id: String,
    /// Contact receiving the mail.
    pub contact_id: String,
    /// Sender account used for this delivery.
    pub email_id: String,
    /// Lifecycle status.
    pub status: RecipientStatus,
    /// When the delivery succeeded.
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    /// Error text when the delivery failed.
    #[serde(default)]
    pub error: Option<String>,
}

/// A sender account (table `emails`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderAccount {
    /// Row id.
    pub id: String,
    /// Account address.
    pub email: String,
    /// Account password (AUTH LOGIN / IMAP LOGIN).
    pub password: String,
    /// Deliveries attempted from this account.
    #[serde(default)]
    pub sent_count: i64,
    /// Deliveries that succeeded.
    #[serde(default)]
    pub success_count: i64,
    /// Deliveries that failed.
    #[serde(default)]
    pub failed_count: i64,
}

/// An address-book contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Row id.
    pub id: String,
    /// Display name, if known.
    #[serde(default)]
    pub name: Option<String>,
    /// Email address.
    pub email: String,
}

/// A contact group carrying an optional ping template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactGroup {
    /// Row id.
    pub id: String,
    /// Parent group, if nested.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Follow-up subject template.
    #[serde(default)]
    pub ping_subject: Option<String>,
    /// Follow-up text template.
    #[serde(default)]
    pub ping_text: Option<String>,
    /// Follow-up HTML template.
    #[serde(default)]
    pub ping_html: Option<String>,
}

/// Group membership row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactGroupMember {
    /// Member contact.
    pub contact_id: String,
    /// Group joined.
    pub group_id: String,
}

/// Reply-detection lifecycle of a delivered recipient.
///
/// Strictly forward-moving. `NoResponse` is reserved for expired,
/// unanswered pings; no code path assigns it yet (product decision
/// pending on the expiry window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    /// Sent, watching the inbox for a reply.
    AwaitingResponse,
    /// A reply was detected (terminal).
    ResponseReceived,
    /// The follow-up ping was sent (terminal for this subsystem).
    PingSent,
    /// Reserved: ping expired without an answer.
    NoResponse,
}

/// Row of `mailing_ping_tracking`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingTracking {
    /// Row id.
    pub id: String,
    /// Recipient this tracking belongs to.
    pub recipient_id: String,
    /// Contact watched for a reply.
    pub contact_id: String,
    /// Sender account whose inbox is polled.
    pub email_id: String,
    /// When the original mailing was delivered.
    pub initial_sent_at: DateTime<Utc>,
    /// Whether a reply was detected.
    #[serde(default)]
    pub response_received: bool,
    /// When the reply was detected.
    #[serde(default)]
    pub response_received_at: Option<DateTime<Utc>>,
    /// Whether the follow-up ping was sent.
    #[serde(default)]
    pub ping_sent: bool,
    /// When the ping was sent.
    #[serde(default)]
    pub ping_sent_at: Option<DateTime<Utc>>,
    /// Resolved ping subject, persisted for audit.
    #[serde(default)]
    pub ping_subject: Option<String>,
    /// Resolved ping text, persisted for audit.
    #[serde(default)]
    pub ping_text: Option<String>,
    /// Resolved ping HTML, persisted for audit.
    #[serde(default)]
    pub ping_html: Option<String>,
    /// Lifecycle status.
    pub status: TrackingStatus,
}

/// Singleton follow-up settings (read-only here).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PingSettings {
    /// How often the scanners run (informational; the scheduler that
    /// triggers the handlers owns the cadence).
    pub check_interval_minutes: i64,
    /// Hours to wait for a reply before pinging.
    pub wait_time_hours: i64,
}

impl Default for PingSettings {
    fn default() -> Self {
        Self {
            check_interval_minutes: 60,
            wait_time_hours: 48,
        }
    }
}
