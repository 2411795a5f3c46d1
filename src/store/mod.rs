//! Durable stores behind the sync engine.
//!
//! Two concerns live here, both backed by the content store's REST layer in
//! production ([`rest::PostgrestStore`]):
//!
//! - the append-only audit log of sync attempts, and
//! - the write-back of a newly discovered remote item id onto the source row.
//!
//! Audit writes are best-effort: the orchestrator logs their failures and
//! carries on, so a broken audit store can never change a delivery's verdict.
//! Linking the remote id is different: it is part of the primary path, and
//! its failure aborts the delivery before any publish call.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::effects::RemoteApiError;
use crate::types::{ArticleId, ChangeEvent, EventKind, RemoteItemId};

pub mod rest;

pub use rest::PostgrestStore;

/// Errors from the durable stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store rejected the write.
    #[error("store rejected write (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// One append-only audit row describing a point in a delivery's lifecycle.
///
/// Rows are never updated or deleted by this system.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub article_id: ArticleId,
    #[serde(rename = "webflow_id")]
    pub remote_id: Option<RemoteItemId>,
    pub status: String,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    fn new(
        article_id: ArticleId,
        remote_id: Option<RemoteItemId>,
        status: String,
        details: Value,
    ) -> Self {
        Self {
            article_id,
            remote_id,
            status,
            details,
            created_at: Utc::now(),
        }
    }

    /// Entry written before dispatch. Logs the full webhook payload so a
    /// failed delivery can be replayed by hand.
    pub fn started(event: &ChangeEvent) -> Self {
        Self::new(
            event.record.id.clone(),
            event.record.remote_id.clone(),
            format!("{}_started", event.kind.label()),
            json!({
                "article_name": event.record.display_name(),
                "operation": event.kind.as_wire(),
                "webhook_payload": event.payload,
            }),
        )
    }

    /// Terminal entry for a delivery that ran to completion.
    pub fn completed(event: &ChangeEvent, remote_id: Option<RemoteItemId>, result: &Value) -> Self {
        Self::new(
            event.record.id.clone(),
            remote_id,
            format!("{}_completed", event.kind.label()),
            json!({
                "operation": event.kind.as_wire(),
                "result": result,
            }),
        )
    }

    /// Terminal entry for a delivery that failed before its remote write.
    pub fn failed(event: &ChangeEvent, remote_id: Option<RemoteItemId>, error: &str) -> Self {
        Self::new(
            event.record.id.clone(),
            remote_id,
            format!("{}_failed", event.kind.label()),
            json!({
                "operation": event.kind.as_wire(),
                "error": error,
            }),
        )
    }

    /// Terminal entry for the half-committed case: the remote write
    /// succeeded but a publish call failed. Recorded under its own status so
    /// a reconciliation job can find items that exist remotely without being
    /// live, along with the id needed to resume.
    pub fn written_unpublished(
        event: &ChangeEvent,
        remote_id: Option<RemoteItemId>,
        error: &RemoteApiError,
    ) -> Self {
        Self::new(
            event.record.id.clone(),
            remote_id,
            format!("{}_written_unpublished", event.kind.label()),
            json!({
                "operation": event.kind.as_wire(),
                "error": error.to_string(),
                "upstream_status": error.status,
            }),
        )
    }

    /// The delivery kind this entry belongs to, recovered from `details`.
    pub fn operation(&self) -> Option<EventKind> {
        self.details
            .get("operation")
            .and_then(|v| v.as_str())
            .map(EventKind::from_wire)
    }
}

/// Appends lifecycle entries to the audit log.
pub trait AuditStore {
    /// Append one entry. Implementations must not retry or block the
    /// delivery beyond the single write attempt.
    fn record(&self, entry: &AuditEntry) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Writes back onto source article rows.
pub trait ArticleStore {
    /// Persist a newly assigned remote item id onto the article row, so
    /// every subsequent delivery for this article updates instead of
    /// recreating.
    fn link_remote_id(
        &self,
        article: &ArticleId,
        remote: &RemoteItemId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
