//! HTTP data-store client.
//!
//! The persistent store is an external REST data API (CRUD over typed
//! tables with equality/range filters in the query string). Writes use
//! `Prefer: return=minimal` since callers never need the row back.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    Contact, ContactGroup, ContactGroupMember, Mailing, MailingStatus, PingSettings, PingTracking,
    Recipient, SenderAccount, TrackingStatus,
};

/// Client for the HTTP data API.
#[derive(Debug, Clone)]
pub struct Store {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl Store {
    /// Creates a store client.
    #[must_use]
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            service_key: service_key.into(),
        }
    }

    /// Creates a store client from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.store_url.clone(), config.store_service_key.clone())
    }

    fn request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{table}", self.base_url.trim_end_matches('/'));
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self
            .request(Method::GET, table)
            .query(query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    async fn write(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        body: &impl Serialize,
    ) -> Result<()> {
        let response = self
            .request(method, table)
            .query(query)
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        table: &str,
        mut query: Vec<(&str, String)>,
    ) -> Result<Option<T>> {
        query.push(("limit", "1".into()));
        Ok(self.select(table, &query).await?.into_iter().next())
    }

    // --- mailings ---

    /// Loads one mailing.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn mailing(&self, id: &str) -> Result<Option<Mailing>> {
        self.fetch_one("mailings", vec![("id", format!("eq.{id}"))])
            .await
    }

    /// Loads pending mailings due at or before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn due_mailings(&self, now: DateTime<Utc>) -> Result<Vec<Mailing>> {
        self.select(
            "mailings",
            &[
                ("status", "eq.pending".into()),
                ("scheduled_at", format!("lte.{}", now.to_rfc3339())),
            ],
        )
        .await
    }

    /// Sets a mailing's lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn set_mailing_status(&self, id: &str, status: MailingStatus) -> Result<()> {
        self.write(
            Method::PATCH,
            "mailings",
            &[("id", format!("eq.{id}"))],
            &json!({ "status": status }),
        )
        .await
    }

    // --- recipients ---

    /// Loads one recipient.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn recipient(&self, id: &str) -> Result<Option<Recipient>> {
        self.fetch_one("mailing_recipients", vec![("id", format!("eq.{id}"))])
            .await
    }

    /// Loads a mailing's pending recipients.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn pending_recipients(&self, mailing_id: &str) -> Result<Vec<Recipient>> {
        self.select(
            "mailing_recipients",
            &[
                ("mailing_id", format!("eq.{mailing_id}")),
                ("status", "eq.pending".into()),
            ],
        )
        .await
    }

    /// Returns true if the mailing still has pending recipients.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn has_pending_recipients(&self, mailing_id: &str) -> Result<bool> {
        let rows: Vec<Recipient> = self
            .select(
                "mailing_recipients",
                &[
                    ("mailing_id", format!("eq.{mailing_id}")),
                    ("status", "eq.pending".into()),
                    ("limit", "1".into()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Marks a recipient delivered.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn set_recipient_sent(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.write(
            Method::PATCH,
            "mailing_recipients",
            &[("id", format!("eq.{id}"))],
            &json!({ "status": "sent", "sent_at": at.to_rfc3339() }),
        )
        .await
    }

    /// Marks a recipient failed with the error text.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn set_recipient_failed(&self, id: &str, error: &str) -> Result<()> {
        self.write(
            Method::PATCH,
            "mailing_recipients",
            &[("id", format!("eq.{id}"))],
            &json!({ "status": "failed", "error": error }),
        )
        .await
    }

    // --- contacts / accounts / groups ---

    /// Loads one contact.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn contact(&self, id: &str) -> Result<Option<Contact>> {
        self.fetch_one("contacts", vec![("id", format!("eq.{id}"))])
            .await
    }

    /// Loads one sender account.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn sender_account(&self, id: &str) -> Result<Option<SenderAccount>> {
        self.fetch_one("emails", vec![("id", format!("eq.{id}"))])
            .await
    }

    /// Finds the contact's first group, if any.
    ///
    /// Only the first direct membership is consulted; no inheritance
    /// walk is performed for ping templates.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn first_group_for_contact(&self, contact_id: &str) -> Result<Option<ContactGroup>> {
        let membership: Option<ContactGroupMember> = self
            .fetch_one(
                "contact_group_members",
                vec![("contact_id", format!("eq.{contact_id}"))],
            )
            .await?;
        let Some(membership) = membership else {
            return Ok(None);
        };
        self.fetch_one(
            "contact_groups",
            vec![("id", format!("eq.{}", membership.group_id))],
        )
        .await
    }

    // --- counters ---

    /// Increments the named counter columns of one row by one.
    ///
    /// The data API offers no atomic increment, so this is a read then a
    /// patch; concurrent writers can lose updates. Kept behind this one
    /// method so a server-side increment RPC can replace it wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the row is gone, or a store error.
    pub async fn increment(&self, table: &str, id: &str, fields: &[&str]) -> Result<()> {
        let row: Option<Value> = self
            .fetch_one(
                table,
                vec![
                    ("id", format!("eq.{id}")),
                    ("select", fields.join(",")),
                ],
            )
            .await?;
        let row = row.ok_or_else(|| Error::NotFound(format!("{table}/{id}")))?;

        let mut patch = serde_json::Map::new();
        for field in fields {
            let current = row.get(*field).and_then(Value::as_i64).unwrap_or(0);
            patch.insert((*field).to_string(), Value::from(current + 1));
        }
        debug!(table, id, ?fields, "incrementing counters");
        self.write(
            Method::PATCH,
            table,
            &[("id", format!("eq.{id}"))],
            &Value::Object(patch),
        )
        .await
    }

    // --- ping tracking ---

    /// Creates a tracking row for a delivered recipient.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn insert_tracking(
        &self,
        recipient: &Recipient,
        initial_sent_at: DateTime<Utc>,
    ) -> Result<()> {
        self.write(
            Method::POST,
            "mailing_ping_tracking",
            &[],
            &json!({
                "recipient_id": recipient.id,
                "contact_id": recipient.contact_id,
                "email_id": recipient.email_id,
                "initial_sent_at": initial_sent_at.to_rfc3339(),
                "response_received": false,
                "ping_sent": false,
                "status": TrackingStatus::AwaitingResponse,
            }),
        )
        .await
    }

    /// Loads all trackings still awaiting a response.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn awaiting_trackings(&self) -> Result<Vec<PingTracking>> {
        self.select(
            "mailing_ping_tracking",
            &[("status", "eq.awaiting_response".into())],
        )
        .await
    }

    /// Records a detected reply.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn mark_response_received(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.write(
            Method::PATCH,
            "mailing_ping_tracking",
            &[("id", format!("eq.{id}"))],
            &json!({
                "response_received": true,
                "response_received_at": at.to_rfc3339(),
                "status": TrackingStatus::ResponseReceived,
            }),
        )
        .await
    }

    /// Records a sent ping along with the resolved template for audit.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn mark_ping_sent(
        &self,
        id: &str,
        at: DateTime<Utc>,
        subject: &str,
        text: Option<&str>,
        html: Option<&str>,
    ) -> Result<()> {
        self.write(
            Method::PATCH,
            "mailing_ping_tracking",
            &[("id", format!("eq.{id}"))],
            &json!({
                "ping_sent": true,
                "ping_sent_at": at.to_rfc3339(),
                "ping_subject": subject,
                "ping_text": text,
                "ping_html": html,
                "status": TrackingStatus::PingSent,
            }),
        )
        .await
    }

    /// Loads the singleton ping settings, falling back to defaults when
    /// the table is empty.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure.
    pub async fn ping_settings(&self) -> Result<PingSettings> {
        Ok(self
            .fetch_one("ping_settings", vec![])
            .await?
            .unwrap_or_default())
    }
}
