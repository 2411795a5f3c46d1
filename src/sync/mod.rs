//! The sync orchestrator: one delivery in, one verdict out.
//!
//! A delivery runs as a single sequential unit of work: per-article lock →
//! started audit entry → dispatch by event kind → remote write → remote-id
//! link (first create only) → publish-item → publish-site → terminal audit
//! entry. All remote calls are awaited in order; publish-item depends on the
//! write, and publish-site is idempotent over the whole remote surface.
//!
//! There is no retry and no rollback. The first failed remote call aborts
//! the remaining steps; "written but not published" is recorded as its own
//! terminal audit status so a reconciliation pass can resume half-committed
//! syncs (the remote item exists, the caller saw a failure, and the remote
//! id is already linked locally so a redelivery updates instead of
//! duplicating).

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::effects::{
    RemoteApiError, RemoteEffect, RemoteInterpreter, RemoteItemFields, RemoteResponse,
};
use crate::store::{ArticleStore, AuditEntry, AuditStore, StoreError};
use crate::types::{ArticleId, ChangeEvent, EventKind, RemoteItemId};
use crate::webhooks::ParseError;

pub mod slug;


pub use slug::derive_slug;

/// Failures a delivery can end in.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The body never became a [`ChangeEvent`]; nothing was dispatched.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Insert/Update without an article name.
    #[error("Article name is required")]
    MissingName,

    /// An event kind this engine does not handle.
    #[error("Unsupported event type: {0}")]
    UnsupportedEventKind(String),

    /// The remote write (create/update/delete) was rejected.
    #[error(transparent)]
    RemoteApi(RemoteApiError),

    /// A publish call failed after the remote write had already succeeded.
    #[error("Error publishing to Webflow: {0}")]
    Publish(RemoteApiError),

    /// The newly assigned remote id could not be written back onto the
    /// article row. Aborts before any publish call: an unlinked-but-live
    /// item would be recreated by the next delivery.
    #[error("failed to link remote item {remote} to article {article}: {source}")]
    Link {
        article: ArticleId,
        remote: RemoteItemId,
        source: StoreError,
    },
}

impl SyncError {
    /// True for failures the caller can fix by changing the request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SyncError::Parse(_) | SyncError::MissingName | SyncError::UnsupportedEventKind(_)
        )
    }
}

/// A completed delivery: what the caller is told plus the remote id the
/// terminal audit entry should carry.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub message: String,
    pub data: Value,
    pub remote_id: Option<RemoteItemId>,
}

/// Internal failure record. Keeps the remote id and whether the remote write
/// had already happened, so the terminal audit entry can be chosen without
/// widening the public error type.
struct Failure {
    error: SyncError,
    remote_id: Option<RemoteItemId>,
    written: bool,
}

impl Failure {
    fn before_write(error: SyncError, remote_id: Option<RemoteItemId>) -> Self {
        Self {
            error,
            remote_id,
            written: false,
        }
    }

    fn after_write(error: SyncError, remote_id: Option<RemoteItemId>) -> Self {
        Self {
            error,
            remote_id,
            written: true,
        }
    }
}

/// Per-article delivery locks.
///
/// Entries are created on first sight of an article id and never reclaimed;
/// the map's cardinality is the number of distinct articles the process has
/// seen.
#[derive(Default)]
struct LockMap {
    inner: StdMutex<HashMap<ArticleId, Arc<AsyncMutex<()>>>>,
}

impl LockMap {
    fn for_article(&self, id: &ArticleId) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(id.clone()).or_default().clone()
    }
}

/// Composes the normalizer's output with the remote interpreter and the
/// durable stores, one delivery at a time.
pub struct SyncOrchestrator<R, A, S> {
    remote: R,
    audit: A,
    articles: S,
    locks: LockMap,
}

impl<R, A, S> SyncOrchestrator<R, A, S>
where
    R: RemoteInterpreter + Send + Sync,
    A: AuditStore + Send + Sync,
    S: ArticleStore + Send + Sync,
{
    pub fn new(remote: R, audit: A, articles: S) -> Self {
        Self {
            remote,
            audit,
            articles,
            locks: LockMap::default(),
        }
    }

    /// Runs one delivery to completion, success, or first failure.
    ///
    /// Deliveries for the same article id are serialized; once started, a
    /// delivery is never cancelled.
    pub async fn handle(&self, event: ChangeEvent) -> Result<SyncOutcome, SyncError> {
        let lock = self.locks.for_article(&event.record.id);
        let _serialized = lock.lock().await;

        info!(
            article_id = %event.record.id,
            kind = %event.kind,
            remote_id = event.record.remote_id.as_ref().map(|id| id.as_str()),
            "sync delivery started"
        );
        self.record_audit(AuditEntry::started(&event)).await;

        match self.dispatch(&event).await {
            Ok(outcome) => {
                info!(
                    article_id = %event.record.id,
                    kind = %event.kind,
                    remote_id = outcome.remote_id.as_ref().map(|id| id.as_str()),
                    "sync delivery completed"
                );
                self.record_audit(AuditEntry::completed(
                    &event,
                    outcome.remote_id.clone(),
                    &outcome.data,
                ))
                .await;
                Ok(outcome)
            }
            Err(failure) => {
                warn!(
                    article_id = %event.record.id,
                    kind = %event.kind,
                    error = %failure.error,
                    written = failure.written,
                    "sync delivery failed"
                );
                let entry = match (&failure.error, failure.written) {
                    (SyncError::Publish(e), true) => {
                        AuditEntry::written_unpublished(&event, failure.remote_id.clone(), e)
                    }
                    (SyncError::Link { source, .. }, true) => {
                        let publish_never_ran = RemoteApiError {
                            status: None,
                            body: format!("remote id link failed before publish: {}", source),
                            source: None,
                        };
                        AuditEntry::written_unpublished(
                            &event,
                            failure.remote_id.clone(),
                            &publish_never_ran,
                        )
                    }
                    (error, _) => AuditEntry::failed(
                        &event,
                        failure.remote_id.clone(),
                        &error.to_string(),
                    ),
                };
                self.record_audit(entry).await;
                Err(failure.error)
            }
        }
    }

    async fn dispatch(&self, event: &ChangeEvent) -> Result<SyncOutcome, Failure> {
        match &event.kind {
            EventKind::Insert | EventKind::Update => self.upsert(event).await,
            EventKind::Delete => self.delete(event).await,
            EventKind::Unsupported(kind) => Err(Failure::before_write(
                SyncError::UnsupportedEventKind(kind.clone()),
                event.record.remote_id.clone(),
            )),
        }
    }

    /// Insert and Update share one path: the remote write is chosen by
    /// whether the record already has a remote id, never by the event kind,
    /// so a record that was created once is always updated afterwards.
    async fn upsert(&self, event: &ChangeEvent) -> Result<SyncOutcome, Failure> {
        let record = &event.record;
        let name = match &record.name {
            Some(name) => name.clone(),
            None => {
                return Err(Failure::before_write(
                    SyncError::MissingName,
                    record.remote_id.clone(),
                ))
            }
        };

        let fields = RemoteItemFields {
            name,
            content: record.content.clone().unwrap_or_default(),
            source_id: record.id.clone(),
            slug: derive_slug(record),
        };

        match &record.remote_id {
            Some(item) => {
                let item = item.clone();
                let response = self
                    .remote
                    .interpret(RemoteEffect::UpdateItem {
                        item: item.clone(),
                        fields,
                    })
                    .await
                    .map_err(|e| {
                        Failure::before_write(SyncError::RemoteApi(e), Some(item.clone()))
                    })?;
                let data = match response {
                    RemoteResponse::Updated { item } => item,
                    other => {
                        return Err(Failure::before_write(
                            unexpected_response("UpdateItem", &other),
                            Some(item),
                        ))
                    }
                };

                self.publish_written_item(Some(item.clone())).await?;
                Ok(self.success(event, data, Some(item)))
            }
            None => {
                let response = self
                    .remote
                    .interpret(RemoteEffect::CreateItem { fields })
                    .await
                    .map_err(|e| Failure::before_write(SyncError::RemoteApi(e), None))?;
                let (id, data) = match response {
                    RemoteResponse::Created { id, item } => (id, item),
                    other => {
                        return Err(Failure::before_write(
                            unexpected_response("CreateItem", &other),
                            None,
                        ))
                    }
                };

                // Link before publishing: a publish failure must never leave
                // a remote item with no local pointer back to it.
                if let Some(id) = &id {
                    self.articles
                        .link_remote_id(&record.id, id)
                        .await
                        .map_err(|source| {
                            Failure::after_write(
                                SyncError::Link {
                                    article: record.id.clone(),
                                    remote: id.clone(),
                                    source,
                                },
                                Some(id.clone()),
                            )
                        })?;
                }

                self.publish_written_item(id.clone()).await?;
                Ok(self.success(event, data, id))
            }
        }
    }

    async fn delete(&self, event: &ChangeEvent) -> Result<SyncOutcome, Failure> {
        let Some(item) = event.record.remote_id.clone() else {
            // Deleting a record that was never synced is not a failure.
            return Ok(SyncOutcome {
                message: "Article was never synced; nothing to delete".to_string(),
                data: json!({ "deleted": false, "reason": "no remote id" }),
                remote_id: None,
            });
        };

        self.remote
            .interpret(RemoteEffect::DeleteItem { item: item.clone() })
            .await
            .map_err(|e| Failure::before_write(SyncError::RemoteApi(e), Some(item.clone())))?;

        // Item-level publish is meaningless for a deleted item; only the
        // site publish propagates the removal.
        self.remote
            .interpret(RemoteEffect::PublishSite)
            .await
            .map_err(|e| Failure::after_write(SyncError::Publish(e), Some(item.clone())))?;

        let data = json!({ "deleted": true, "webflow_id": item });
        Ok(self.success(event, data, Some(item)))
    }

    /// Runs the two-step publish protocol after a successful write:
    /// publish-item (when an item id is known), then publish-site. A failure
    /// of either is a failure of the whole delivery: the caller's visible
    /// state, the live site, did not change.
    async fn publish_written_item(&self, item: Option<RemoteItemId>) -> Result<(), Failure> {
        if let Some(item) = &item {
            self.remote
                .interpret(RemoteEffect::PublishItem { item: item.clone() })
                .await
                .map_err(|e| Failure::after_write(SyncError::Publish(e), Some(item.clone())))?;
        }

        self.remote
            .interpret(RemoteEffect::PublishSite)
            .await
            .map_err(|e| Failure::after_write(SyncError::Publish(e), item.clone()))?;

        Ok(())
    }

    fn success(
        &self,
        event: &ChangeEvent,
        data: Value,
        remote_id: Option<RemoteItemId>,
    ) -> SyncOutcome {
        SyncOutcome {
            message: format!(
                "Article successfully {} in Webflow",
                event.kind.past_tense()
            ),
            data,
            remote_id,
        }
    }

    /// Audit writes are best-effort: failures are logged and swallowed, and
    /// never change the delivery's verdict.
    async fn record_audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.record(&entry).await {
            warn!(
                article_id = %entry.article_id,
                status = %entry.status,
                error = %e,
                "audit write failed; continuing"
            );
        }
    }
}

fn unexpected_response(effect: &str, response: &RemoteResponse) -> SyncError {
    SyncError::RemoteApi(RemoteApiError {
        status: None,
        body: format!("interpreter returned {:?} for {}", response, effect),
        source: None,
    })
}
