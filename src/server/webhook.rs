//! Sync webhook endpoint handler.
//!
//! Accepts change-event deliveries from the content store, normalizes them,
//! and runs them through the orchestrator synchronously: the delivery's
//! verdict is the HTTP response.
//!
//! # Request
//!
//! - Method: POST, body: JSON in either accepted envelope shape
//!
//! # Response
//!
//! - 200 `{"success": true, "message": ..., "data": ...}` on completion
//! - 400 `{"error": ...}` for validation failures (malformed payload,
//!   missing fields, unsupported event kind), issued before any external
//!   call or audit write
//! - 500 `{"error": ...}` for upstream or store failures, carrying the
//!   upstream status and body verbatim

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::debug;

use crate::effects::RemoteInterpreter;
use crate::store::{ArticleStore, AuditStore};
use crate::sync::SyncOutcome;
use crate::webhooks::parse_change_event;

use super::AppState;

/// Webhook handler. One delivery in, one verdict out.
pub async fn sync_handler<R, A, S>(
    State(state): State<AppState<R, A, S>>,
    body: Bytes,
) -> Response
where
    R: RemoteInterpreter + Send + Sync + 'static,
    A: AuditStore + Send + Sync + 'static,
    S: ArticleStore + Send + Sync + 'static,
{
    let event = match parse_change_event(&body) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "rejected webhook payload");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    match state.orchestrator().handle(event).await {
        Ok(outcome) => success_response(outcome),
        Err(e) => {
            let status = if e.is_validation() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            error_response(status, &e.to_string())
        }
    }
}

fn success_response(outcome: SyncOutcome) -> Response {
    Json(json!({
        "success": true,
        "message": outcome.message,
        "data": outcome.data,
    }))
    .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
