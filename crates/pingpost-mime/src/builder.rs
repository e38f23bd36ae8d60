//! Outgoing message assembly.
//!
//! Messages are built by hand: a header block (From, To, Subject,
//! MIME-Version), then either a single text part or a `multipart/mixed`
//! envelope holding the plain-text and HTML variants. Every line is
//! CRLF-terminated.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::content_type::ContentType;
use crate::error::{Error, Result};

/// An outgoing email message.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body, if any.
    pub body_text: Option<String>,
    /// HTML body, if any.
    pub body_html: Option<String>,
}

impl OutgoingMail {
    /// Creates a message with neither body set.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body_text: None,
            body_html: None,
        }
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body_text = Some(body.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.body_html = Some(body.into());
        self
    }

    /// Renders the complete RFC 5322 message with a fresh boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoContent`] if neither body is set, or
    /// [`Error::InvalidHeader`] if a header value embeds a line break.
    pub fn render(&self) -> Result<String> {
        self.render_with_boundary(&time_boundary())
    }

    /// Renders the message using the given multipart boundary.
    ///
    /// The boundary is only used when both bodies are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoContent`] if neither body is set, or
    /// [`Error::InvalidHeader`] if a header value embeds a line break.
    pub fn render_with_boundary(&self, boundary: &str) -> Result<String> {
        for value in [&self.from, &self.to, &self.subject] {
            if value.contains('\r') || value.contains('\n') {
                return Err(Error::InvalidHeader(value.clone()));
            }
        }

        let content_type = match (&self.body_text, &self.body_html) {
            (Some(_), Some(_)) => ContentType::MultipartMixed {
                boundary: boundary.to_string(),
            },
            (Some(_), None) => ContentType::TextPlain,
            (None, Some(_)) => ContentType::TextHtml,
            (None, None) => return Err(Error::NoContent),
        };

        let mut message = String::new();
        let _ = write!(message, "From: {}\r\n", self.from);
        let _ = write!(message, "To: {}\r\n", self.to);
        let _ = write!(message, "Subject: {}\r\n", self.subject);
        message.push_str("MIME-Version: 1.0\r\n");
        let _ = write!(message, "Content-Type: {content_type}\r\n");
        message.push_str("\r\n");

        if content_type.is_multipart() {
            if let Some(text) = &self.body_text {
                let _ = write!(message, "--{boundary}\r\n");
                let _ = write!(message, "Content-Type: {}\r\n\r\n", ContentType::TextPlain);
                push_body(&mut message, text);
            }
            if let Some(html) = &self.body_html {
                let _ = write!(message, "--{boundary}\r\n");
                let _ = write!(message, "Content-Type: {}\r\n\r\n", ContentType::TextHtml);
                push_body(&mut message, html);
            }
            let _ = write!(message, "--{boundary}--\r\n");
        } else if let Some(body) = self.body_text.as_ref().or(self.body_html.as_ref()) {
            push_body(&mut message, body);
        }

        Ok(message)
    }
}

/// Appends a body, normalizing line endings to CRLF and ensuring a
/// trailing CRLF.
fn push_body(message: &mut String, body: &str) {
    for line in body.split('\n') {
        message.push_str(line.trim_end_matches('\r'));
        message.push_str("\r\n");
    }
}

/// Generates a boundary token from the current time.
///
/// Nanosecond resolution makes collisions negligible at this volume; the
/// token stays unique per send.
#[must_use]
pub fn time_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    format!("=_pingpost_{nanos:x}")
}
