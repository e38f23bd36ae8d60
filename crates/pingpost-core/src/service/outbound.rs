//! Shared SMTP delivery sequence.
//!
//! Used by the delivery engine for mailing sends and by the ping
//! scheduler for follow-ups; both drive the same exchange: implicit-TLS
//! connect, EHLO, AUTH LOGIN, MAIL FROM, RCPT TO, DATA, QUIT.

use pingpost_mime::OutgoingMail;
use pingpost_smtp::{Client, Connected};
use pingpost_wire::connect_plain;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::model::SenderAccount;

/// Hostname announced in EHLO.
const CLIENT_HOSTNAME: &str = "pingpost";

/// Composes and sends one message, returning the rendered message so
/// callers can archive the exact bytes that went out.
///
/// # Errors
///
/// Returns a MIME error if neither body is set, or an SMTP/transport
/// error from any stage of the exchange.
pub async fn send_mail(
    config: &Config,
    account: &SenderAccount,
    to: &str,
    subject: &str,
    body_text: Option<&str>,
    body_html: Option<&str>,
) -> Result<String> {
    let mut mail = OutgoingMail::new(&account.email, to, subject);
    if let Some(text) = body_text {
        mail = mail.text(text);
    }
    if let Some(html) = body_html {
        mail = mail.html(html);
    }
    let rendered = mail.render()?;

    let client = connect(config).await?;
    let client = client.ehlo(CLIENT_HOSTNAME).await?;
    let client = client.auth_login(&account.email, &account.password).await?;
    let client = client.mail_from(&account.email).await?;
    let client = client.rcpt_to(to).await?;
    let client = client.data().await?;
    let client = client.send_message(rendered.as_bytes()).await?;
    client.quit().await?;

    debug!(from = %account.email, to, "message delivered");
    Ok(rendered)
}

async fn connect(config: &Config) -> Result<Client<Connected>> {
    if config.smtp_tls {
        Ok(Client::connect(
            &config.smtp_host,
            config.smtp_port,
            config.read_timeout,
            config.op_timeout,
        )
        .await?)
    } else {
        // Plaintext path exists for scripted-server tests only.
        let stream = connect_plain(&config.smtp_host, config.smtp_port, config.op_timeout).await?;
        Ok(Client::from_stream(stream, config.read_timeout, config.op_timeout).await?)
    }
}
