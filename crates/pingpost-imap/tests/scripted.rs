//! Integration tests driving the client against a scripted in-process
//! IMAP server over plaintext TCP.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use pingpost_imap::{AppendOutcome, Client};
use pingpost_wire::connect_plain;

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Scripted server: LOGIN always succeeds; APPEND to a bare name is
/// refused with a prefix hint; APPEND to an `INBOX.`-prefixed name takes
/// the literal and succeeds; SEARCH returns `search_reply`.
async fn scripted_server(search_reply: &'static str) -> (SocketAddr, oneshot::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut stream = BufReader::new(socket);
        let mut appended = Vec::new();

        stream
            .get_mut()
            .write_all(b"* OK test server ready\r\n")
            .await
            .unwrap();

        loop {
            let mut line = String::new();
            if stream.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let line = line.trim_end().to_string();
            let mut parts = line.splitn(2, ' ');
            let tag = parts.next().unwrap_or_default().to_string();
            let rest = parts.next().unwrap_or_default().to_string();

            let reply = if rest.starts_with("LOGIN") {
                format!("{tag} OK LOGIN completed\r\n")
            } else if rest.starts_with("SELECT") {
                format!("* 3 EXISTS\r\n{tag} OK [READ-WRITE] SELECT completed\r\n")
            } else if rest.starts_with("SEARCH") {
                format!("{search_reply}\r\n{tag} OK SEARCH completed\r\n")
            } else if rest.starts_with("APPEND") {
                let size: usize = rest
                    .rsplit('{')
                    .next()
                    .and_then(|s| s.trim_end_matches('}').parse().ok())
                    .unwrap_or(0);
                if rest.contains("\"INBOX.") {
                    stream
                        .get_mut()
                        .write_all(b"+ Ready for literal data\r\n")
                        .await
                        .unwrap();
                    let mut body = vec![0u8; size + 2]; // literal + trailing CRLF
                    stream.read_exact(&mut body).await.unwrap();
                    body.truncate(size);
                    appended = body;
                    format!("{tag} OK APPEND completed\r\n")
                } else {
                    format!("{tag} NO [CANNOT] Mailbox names must be prefixed with: INBOX.\r\n")
                }
            } else if rest.starts_with("LOGOUT") {
                let _ = stream
                    .get_mut()
                    .write_all(format!("* BYE\r\n{tag} OK LOGOUT completed\r\n").as_bytes())
                    .await;
                break;
            } else {
                format!("{tag} BAD unknown command\r\n")
            };

            stream.get_mut().write_all(reply.as_bytes()).await.unwrap();
        }

        let _ = tx.send(appended);
    });

    (addr, rx)
}

/// Server that answers `deny` commands with NO and reports whether a
/// LOGOUT arrived before the connection closed.
async fn denying_server(deny: &'static str) -> (SocketAddr, oneshot::Receiver<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut stream = BufReader::new(socket);
        let mut saw_logout = false;

        stream
            .get_mut()
            .write_all(b"* OK test server ready\r\n")
            .await
            .unwrap();

        loop {
            let mut line = String::new();
            if stream.read_line(&mut line).await.unwrap_or(0) == 0 {
                break;
            }
            let line = line.trim_end().to_string();
            let mut parts = line.splitn(2, ' ');
            let tag = parts.next().unwrap_or_default().to_string();
            let rest = parts.next().unwrap_or_default().to_string();

            let reply = if rest.starts_with(deny) {
                format!("{tag} NO [CANNOT] refused\r\n")
            } else if rest.starts_with("LOGIN") {
                format!("{tag} OK LOGIN completed\r\n")
            } else if rest.starts_with("LOGOUT") {
                saw_logout = true;
                let _ = stream
                    .get_mut()
                    .write_all(format!("* BYE\r\n{tag} OK LOGOUT completed\r\n").as_bytes())
                    .await;
                break;
            } else {
                format!("{tag} BAD unknown command\r\n")
            };

            stream.get_mut().write_all(reply.as_bytes()).await.unwrap();
        }

        let _ = tx.send(saw_logout);
    });

    (addr, rx)
}

async fn login(addr: SocketAddr) -> Client<pingpost_imap::Authenticated> {
    let stream = connect_plain(&addr.ip().to_string(), addr.port(), OP_TIMEOUT)
        .await
        .unwrap();
    let client = Client::from_stream(stream, READ_TIMEOUT, OP_TIMEOUT)
        .await
        .unwrap();
    client.login("user@example.com", "password").await.unwrap()
}

#[tokio::test]
async fn append_literal_only_after_continuation() {
    let (addr, appended_rx) = scripted_server("* SEARCH").await;
    let mut client = login(addr).await;

    let message = b"Subject: archived\r\n\r\nbody\r\n";
    let outcome = client.append("INBOX.Sent", message).await.unwrap();
    assert!(matches!(outcome, AppendOutcome::Accepted));

    client.logout().await.unwrap();
    assert_eq!(appended_rx.await.unwrap(), message);
}

#[tokio::test]
async fn append_rejection_preserves_hint_text() {
    let (addr, _rx) = scripted_server("* SEARCH").await;
    let mut client = login(addr).await;

    let outcome = client.append("Sent", b"x\r\n").await.unwrap();
    match outcome {
        AppendOutcome::Rejected { response } => {
            assert_eq!(
                pingpost_imap::prefix_hint(&response).as_deref(),
                Some("INBOX.")
            );
        }
        AppendOutcome::Accepted => panic!("expected rejection"),
    }

    // The corrected candidate succeeds on the same session.
    let corrected = pingpost_imap::apply_prefix("INBOX.", "Sent");
    let outcome = client.append(&corrected, b"x\r\n").await.unwrap();
    assert!(matches!(outcome, AppendOutcome::Accepted));
    client.logout().await.unwrap();
}

#[tokio::test]
async fn search_finds_reply_ids() {
    let (addr, _rx) = scripted_server("* SEARCH 42").await;
    let client = login(addr).await;
    let mut client = client.select("INBOX").await.unwrap();

    let ids = client
        .search_from_since("contact@example.com", chrono::Utc::now())
        .await
        .unwrap();
    assert_eq!(ids, vec![42]);
    client.logout().await.unwrap();
}

#[tokio::test]
async fn search_empty_means_no_reply() {
    let (addr, _rx) = scripted_server("* SEARCH").await;
    let client = login(addr).await;
    let mut client = client.select("INBOX").await.unwrap();

    let ids = client
        .search_from_since("contact@example.com", chrono::Utc::now())
        .await
        .unwrap();
    assert!(ids.is_empty());
    client.logout().await.unwrap();
}

#[tokio::test]
async fn rejected_select_still_logs_out() {
    let (addr, logout_rx) = denying_server("SELECT").await;
    let client = login(addr).await;

    let err = client.select("INBOX").await.unwrap_err();
    assert!(matches!(err, pingpost_imap::Error::No(_)));
    assert!(logout_rx.await.unwrap());
}

#[tokio::test]
async fn rejected_login_still_logs_out() {
    let (addr, logout_rx) = denying_server("LOGIN").await;
    let stream = connect_plain(&addr.ip().to_string(), addr.port(), OP_TIMEOUT)
        .await
        .unwrap();
    let client = Client::from_stream(stream, READ_TIMEOUT, OP_TIMEOUT)
        .await
        .unwrap();

    let err = client
        .login("user@example.com", "password")
        .await
        .unwrap_err();
    assert!(matches!(err, pingpost_imap::Error::LoginRejected(_)));
    assert!(logout_rx.await.unwrap());
}
