//! Route table and request handlers.
//!
//! Every handler answers a JSON envelope: `{"success": true, ...}` with
//! run counts on success, `{"success": false, "error": ...}` otherwise.
//! Input problems (unknown ids, oversized payloads, missing content)
//! map to 400; everything else is a 500.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use pingpost_core::service::{self, DeliveryOutcome};
use pingpost_core::{Config, Error, Store};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    config: Arc<Config>,
}

/// Builds the application router.
pub fn router(store: Arc<Store>, config: Arc<Config>) -> Router {
    Router::new()
        .route("/send", post(send))
        .route("/dispatch", post(dispatch))
        .route("/archive", post(archive))
        .route("/check-replies", post(check_replies))
        .route("/send-pings", post(send_pings))
        .layer(CorsLayer::permissive())
        .with_state(AppState { store, config })
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    recipient_id: String,
}

#[derive(Debug, Deserialize)]
struct ArchiveRequest {
    email: String,
    password: String,
    message: String,
}

/// Delivers one recipient's mailing.
async fn send(State(state): State<AppState>, Json(req): Json<SendRequest>) -> Response {
    let result = bounded(&state.config, async {
        service::deliver_recipient(&state.store, &state.config, &req.recipient_id).await
    })
    .await;

    match result {
        Ok(DeliveryOutcome::Sent) => ok(json!({ "message": "delivered" })),
        Ok(DeliveryOutcome::AlreadyProcessed) => ok(json!({ "message": "already processed" })),
        // The failure is recorded on the recipient; the invocation
        // itself did its job.
        Ok(DeliveryOutcome::Failed { error }) => ok(json!({
            "message": "delivery failed",
            "delivery_error": error,
        })),
        Err(err) => fail(&err),
    }
}

/// Promotes due mailings and fans out deliveries.
async fn dispatch(State(state): State<AppState>) -> Response {
    let result = bounded(&state.config, async {
        service::run_dispatch(Arc::clone(&state.store), Arc::clone(&state.config)).await
    })
    .await;

    match result {
        Ok(report) => ok(json!({
            "mailings": report.mailings,
            "recipients": report.recipients,
        })),
        Err(err) => fail(&err),
    }
}

/// Archives a delivered message into the account's sent folder.
///
/// Takes the raw body so the request-size cap applies before any JSON
/// work; archive payloads carry whole rendered messages.
async fn archive(State(state): State<AppState>, body: Bytes) -> Response {
    if body.len() > state.config.max_request_bytes {
        return fail(&Error::RequestTooLarge {
            size: body.len(),
            limit: state.config.max_request_bytes,
        });
    }
    let req: ArchiveRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(err) => return bad_request(&format!("invalid request body: {err}")),
    };

    // archive_to_sent applies the handler budget itself.
    match service::archive_to_sent(&state.config, &req.email, &req.password, &req.message).await {
        Ok(outcome) => ok(json!({
            "mailbox": outcome.mailbox,
            "attempts": outcome.attempts,
        })),
        Err(err) => fail(&err),
    }
}

/// Scans inboxes for replies to delivered mailings.
async fn check_replies(State(state): State<AppState>) -> Response {
    let result = bounded(&state.config, async {
        service::run_reply_scan(&state.store, &state.config).await
    })
    .await;

    match result {
        Ok(report) => ok(json!({
            "checked": report.checked,
            "replies_found": report.replies_found,
            "errors": report.errors,
        })),
        Err(err) => fail(&err),
    }
}

/// Sends follow-up pings for overdue trackings.
async fn send_pings(State(state): State<AppState>) -> Response {
    let result = bounded(&state.config, async {
        service::run_ping_scan(Arc::clone(&state.store), Arc::clone(&state.config)).await
    })
    .await;

    match result {
        Ok(report) => ok(json!({
            "checked": report.checked,
            "pings_sent": report.pings_sent,
            "skipped": report.skipped,
            "errors": report.errors,
        })),
        Err(err) => fail(&err),
    }
}

/// Applies the wall-clock budget to a handler body.
async fn bounded<T>(
    config: &Config,
    fut: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    tokio::time::timeout(config.handler_timeout, fut)
        .await
        .map_err(|_| Error::HandlerTimeout(config.handler_timeout))?
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

fn ok(mut body: serde_json::Value) -> Response {
    if let Some(map) = body.as_object_mut() {
        map.insert("success".into(), json!(true));
    }
    (StatusCode::OK, Json(body)).into_response()
}

fn fail(err: &Error) -> Response {
    let status = match err {
        Error::NotFound(_)
        | Error::NoContent
        | Error::RequestTooLarge { .. }
        | Error::MessageTooLarge { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(%err, %status, "handler failed");
    (
        status,
        Json(json!({ "success": false, "error": err.to_string() })),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_map_to_400() {
        let err = Error::NotFound("recipient r1".into());
        assert_eq!(fail(&err).status(), StatusCode::BAD_REQUEST);

        let err = Error::RequestTooLarge {
            size: 100,
            limit: 10,
        };
        assert_eq!(fail(&err).status(), StatusCode::BAD_REQUEST);

        let err = Error::Config("STORE_URL must be set".into());
        assert_eq!(fail(&err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_success_envelope_carries_flag() {
        let response = ok(json!({ "message": "delivered" }));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
