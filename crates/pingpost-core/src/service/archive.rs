//! Sent-folder archiver.
//!
//! Copies an already-delivered message into the account's sent folder
//! over IMAP. Mailbox naming varies by provider, so the archiver walks
//! a candidate list and adapts: when a rejection text names a required
//! namespace prefix, a corrected candidate is built and tried next.

use std::collections::HashSet;
use std::collections::VecDeque;

use pingpost_imap::{
    apply_prefix, prefix_hint, sent_candidates, AppendOutcome, Authenticated, Client,
};
use pingpost_wire::connect_plain;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// Outcome of a successful archive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Mailbox that accepted the message.
    pub mailbox: String,
    /// APPEND attempts made, including the successful one.
    pub attempts: u32,
}

/// Archives `message` into the account's sent folder.
///
/// The whole run, login included, is bounded by the handler budget.
///
/// # Errors
///
/// Returns [`Error::MessageTooLarge`] before any I/O when the message
/// exceeds the cap, [`Error::HandlerTimeout`] when the budget expires,
/// and [`Error::ArchiveExhausted`] when every candidate refuses.
pub async fn archive_to_sent(
    config: &Config,
    email: &str,
    password: &str,
    message: &str,
) -> Result<ArchiveOutcome> {
    if message.len() > config.max_message_bytes {
        return Err(Error::MessageTooLarge {
            size: message.len(),
            limit: config.max_message_bytes,
        });
    }
    let message = normalize_crlf(message);

    let budget = config.handler_timeout;
    tokio::time::timeout(budget, archive_inner(config, email, password, message.as_bytes()))
        .await
        .map_err(|_| Error::HandlerTimeout(budget))?
}

async fn archive_inner(
    config: &Config,
    email: &str,
    password: &str,
    message: &[u8],
) -> Result<ArchiveOutcome> {
    let client = connect(config).await?;
    let mut client = client.login(email, password).await?;

    let result = try_candidates(config, &mut client, message).await;
    // Logout regardless of outcome; the session is single-purpose.
    let _ = client.logout().await;
    result
}

/// Walks the candidate queue, inserting hint-corrected names at the
/// front as rejections reveal them.
async fn try_candidates(
    config: &Config,
    client: &mut Client<Authenticated>,
    message: &[u8],
) -> Result<ArchiveOutcome> {
    let mut queue: VecDeque<String> = sent_candidates().into();
    let mut tried: HashSet<String> = HashSet::new();
    let mut attempts = 0u32;

    while let Some(mailbox) = queue.pop_front() {
        if attempts >= config.max_mailbox_attempts {
            break;
        }
        if !tried.insert(mailbox.clone()) {
            continue;
        }
        attempts += 1;

        match client.append(&mailbox, message).await? {
            AppendOutcome::Accepted => {
                info!(mailbox, attempts, "message archived");
                return Ok(ArchiveOutcome { mailbox, attempts });
            }
            AppendOutcome::Rejected { response } => {
                debug!(mailbox, response = response.trim_end(), "mailbox refused");
                if let Some(hint) = prefix_hint(&response) {
                    let corrected = apply_prefix(&hint, &mailbox);
                    if !tried.contains(&corrected) {
                        debug!(corrected, "retrying with hinted prefix");
                        queue.push_front(corrected);
                    }
                }
            }
        }
    }

    warn!(attempts, "no candidate mailbox accepted the message");
    Err(Error::ArchiveExhausted { attempts })
}

/// Normalizes line endings to CRLF as IMAP literals require.
///
/// The result always ends with a single CRLF.
fn normalize_crlf(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for line in message.split('\n') {
        out.push_str(line.trim_end_matches('\r'));
        out.push_str("\r\n");
    }
    // split('\n') yields a trailing empty piece when the input ends
    // with a newline; drop the spurious CRLF it produced.
    if message.ends_with('\n') {
        out.truncate(out.len() - 2);
    }
    out
}

async fn connect(config: &Config) -> Result<Client<pingpost_imap::NotAuthenticated>> {
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_crlf() {
        assert_eq!(normalize_crlf("a\nb"), "a\r\nb\r\n");
        assert_eq!(normalize_crlf("a\r\nb"), "a\r\nb\r\n");
        assert_eq!(normalize_crlf("a\nb\n"), "a\r\nb\r\n");
        assert_eq!(normalize_crlf("a\r\nb\r\n"), "a\r\nb\r\n");
        assert_eq!(
            normalize_crlf("mixed\r\nlines\nhere"),
            "mixed\r\nlines\r\nhere\r\n"
        );
    }

    #[test]
    fn test_normalize_crlf_is_terminated_exactly_once() {
        for input in ["body", "body\n", "body\r\n"] {
            let out = normalize_crlf(input);
            assert!(out.ends_with("\r\n"), "{input:?} -> {out:?}");
            assert!(!out.ends_with("\r\n\r\n"), "{input:?} -> {out:?}");
        }
    }

    #[tokio::test]
    async fn test_oversized_message_rejected_without_io() {
        let config = Config {
            max_message_bytes: 8,
            ..Config::default()
        };
        let err = archive_to_sent(&config, "a@b.c", "pw", "far too large")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { size: 13, limit: 8 }));
    }
}
