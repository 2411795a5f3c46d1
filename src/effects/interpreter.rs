//! Remote effect interpreter trait and its error type.
//!
//! The trait-based design enables:
//! - Mock interpreters for testing the orchestrator without a network
//! - Logging/tracing interpreters
//!
//! There is deliberately no retry layer here: a failed call aborts the
//! remaining steps of the current delivery, and redelivery is the caller's
//! concern.

use std::fmt;
use std::future::Future;

use thiserror::Error;

use super::{RemoteEffect, RemoteResponse};

/// An error from the remote content API.
///
/// Carries the upstream status and body verbatim so they can be surfaced to
/// the webhook caller and to the audit log. Transport-level failures (DNS,
/// connect, body read) have no status.
#[derive(Debug, Error)]
pub struct RemoteApiError {
    /// The upstream HTTP status, if a response was received.
    pub status: Option<u16>,

    /// The upstream response body, or a transport error description.
    pub body: String,

    /// The underlying transport error, if any.
    #[source]
    pub source: Option<reqwest::Error>,
}

impl fmt::Display for RemoteApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "remote API error (HTTP {}): {}", code, self.body),
            None => write!(f, "remote API error: {}", self.body),
        }
    }
}

impl RemoteApiError {
    /// Creates an error from an upstream non-2xx response.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
            source: None,
        }
    }

    /// Creates an error from a transport-level failure.
    pub fn transport(source: reqwest::Error) -> Self {
        Self {
            status: source.status().map(|s| s.as_u16()),
            body: source.to_string(),
            source: Some(source),
        }
    }
}

/// Interprets remote effects against the publishing platform's API.
///
/// Implementations are constructed with the collection and site ids, so all
/// effects executed through one interpreter instance target that surface.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockRemote {
///     calls: Mutex<Vec<RemoteEffect>>,
/// }
///
/// impl RemoteInterpreter for MockRemote {
///     async fn interpret(&self, effect: RemoteEffect) -> Result<RemoteResponse, RemoteApiError> {
///         self.calls.lock().unwrap().push(effect.clone());
///         match effect {
///             RemoteEffect::CreateItem { .. } => Ok(RemoteResponse::Created {
///                 id: Some(RemoteItemId::new("wf-1")),
///                 item: serde_json::json!({"id": "wf-1"}),
///             }),
///             _ => Ok(RemoteResponse::SitePublished),
///         }
///     }
/// }
/// ```
pub trait RemoteInterpreter {
    /// Execute a remote effect and return its response.
    fn interpret(
        &self,
        effect: RemoteEffect,
    ) -> impl Future<Output = Result<RemoteResponse, RemoteApiError>> + Send;
}
