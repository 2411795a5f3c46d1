//! HTTP server for the sync service.
//!
//! # Endpoints
//!
//! - `POST /sync` - Accepts change-event webhook deliveries and runs them to
//!   completion, success, or first failure
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

use crate::effects::RemoteInterpreter;
use crate::store::{ArticleStore, AuditStore};
use crate::sync::SyncOrchestrator;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::sync_handler;

/// Shared application state, passed to handlers via Axum's `State`
/// extractor. Generic over the orchestrator's collaborators so router tests
/// can run against mock interpreters and in-memory stores.
pub struct AppState<R, A, S> {
    orchestrator: Arc<SyncOrchestrator<R, A, S>>,
}

impl<R, A, S> AppState<R, A, S> {
    pub fn new(orchestrator: SyncOrchestrator<R, A, S>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn orchestrator(&self) -> &SyncOrchestrator<R, A, S> {
        &self.orchestrator
    }
}

// Manual impl: `derive(Clone)` would demand Clone of the type parameters.
impl<R, A, S> Clone for AppState<R, A, S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<R, A, S>(state: AppState<R, A, S>) -> axum::Router
where
    R: RemoteInterpreter + Send + Sync + 'static,
    A: AuditStore + Send + Sync + 'static,
    S: ArticleStore + Send + Sync + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/sync", post(sync_handler::<R, A, S>))
        .route("/health", get(health_handler))
        .with_state(state)
}

#[cfg(test)]
mod integration_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::effects::{RemoteApiError, RemoteEffect, RemoteInterpreter, RemoteResponse};
    use crate::store::{ArticleStore, AuditEntry, AuditStore, StoreError};
    use crate::sync::SyncOrchestrator;
    use crate::types::{ArticleId, RemoteItemId};

    use super::*;

    /// Happy-path remote stub; counts calls so validation tests can assert
    /// none were made.
    #[derive(Clone, Default)]
    struct StubRemote {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl RemoteInterpreter for StubRemote {
        async fn interpret(&self, effect: RemoteEffect) -> Result<RemoteResponse, RemoteApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RemoteApiError::upstream(503, "collection is locked"));
            }
            Ok(match effect {
                RemoteEffect::CreateItem { .. } => RemoteResponse::Created {
                    id: Some(RemoteItemId::new("wf-1")),
                    item: json!({ "id": "wf-1" }),
                },
                RemoteEffect::UpdateItem { .. } => RemoteResponse::Updated {
                    item: json!({ "id": "wf-1" }),
                },
                RemoteEffect::DeleteItem { .. } => RemoteResponse::Deleted,
                RemoteEffect::PublishItem { .. } => RemoteResponse::ItemPublished,
                RemoteEffect::PublishSite => RemoteResponse::SitePublished,
            })
        }
    }

    #[derive(Clone, Default)]
    struct StubStore {
        audit_writes: Arc<AtomicUsize>,
    }

    impl AuditStore for StubStore {
        async fn record(&self, _entry: &AuditEntry) -> Result<(), StoreError> {
            self.audit_writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl ArticleStore for StubStore {
        async fn link_remote_id(
            &self,
            _article: &ArticleId,
            _remote: &RemoteItemId,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct TestApp {
        router: axum::Router,
        remote_calls: Arc<AtomicUsize>,
        audit_writes: Arc<AtomicUsize>,
    }

    fn test_app(fail_remote: bool) -> TestApp {
        let remote = StubRemote {
            fail: fail_remote,
            ..StubRemote::default()
        };
        let store = StubStore::default();
        let remote_calls = remote.calls.clone();
        let audit_writes = store.audit_writes.clone();
        let state = AppState::new(SyncOrchestrator::new(remote, store.clone(), store));
        TestApp {
            router: build_router(state),
            remote_calls,
            audit_writes,
        }
    }

    fn sync_request(body: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/sync")
            .header("content-type", "application/json")
            .body(Body::from(body.to_vec()))
            .unwrap()
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_200() {
        let app = test_app(false);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn valid_insert_returns_success_envelope() {
        let app = test_app(false);

        let body = br#"{
            "eventType": "INSERT",
            "record": { "id": "a-1", "name": "Hello World" }
        }"#;
        let response = app.router.oneshot(sync_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Article successfully inserted in Webflow");
        assert_eq!(json["data"]["id"], "wf-1");
    }

    #[tokio::test]
    async fn delete_of_unsynced_record_reports_nothing_to_delete() {
        let app = test_app(false);

        let body = br#"{
            "type": "DELETE",
            "table": "articles",
            "record": { "id": 9 }
        }"#;
        let response = app.router.oneshot(sync_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["data"]["deleted"], false);
        assert_eq!(app.remote_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_rejected_before_any_side_effect() {
        let app = test_app(false);

        let response = app
            .router
            .oneshot(sync_request(b"this is not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert!(json["error"].is_string());
        assert_eq!(app.remote_calls.load(Ordering::SeqCst), 0);
        assert_eq!(app.audit_writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_record_id_is_rejected_before_any_side_effect() {
        let app = test_app(false);

        let body = br#"{"eventType": "INSERT", "record": {"name": "No id"}}"#;
        let response = app.router.oneshot(sync_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "missing record ID");
        assert_eq!(app.remote_calls.load(Ordering::SeqCst), 0);
        assert_eq!(app.audit_writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_event_kind_returns_400_after_audit() {
        let app = test_app(false);

        let body = br#"{"eventType": "TRUNCATE", "record": {"id": "a-1"}}"#;
        let response = app.router.oneshot(sync_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Unsupported event type: TRUNCATE");
        assert_eq!(app.remote_calls.load(Ordering::SeqCst), 0);
        // Started and failed entries bracket the rejected dispatch.
        assert_eq!(app.audit_writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn upstream_failure_surfaces_status_and_body() {
        let app = test_app(true);

        let body = br#"{
            "eventType": "UPDATE",
            "record": { "id": "a-1", "name": "Hello", "webflow_id": "wf-1" }
        }"#;
        let response = app.router.oneshot(sync_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        let message = json["error"].as_str().unwrap();
        assert!(message.contains("503"), "{}", message);
        assert!(message.contains("collection is locked"), "{}", message);
    }
}
