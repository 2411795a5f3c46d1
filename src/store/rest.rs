//! PostgREST-backed store implementation.
//!
//! The content store exposes its tables over PostgREST; both store traits
//! talk to it with plain HTTP:
//!
//! - audit entries: `POST {base}/rest/v1/sync_log`, with the
//!   `Content-Profile` header selecting the `webflow_sync` schema;
//! - remote-id linking: `PATCH {base}/rest/v1/articles?id=eq.{id}`.
//!
//! Writes authenticate with the service-role key, sent both as `apikey` and
//! as a bearer token.

use serde_json::json;

use crate::types::{ArticleId, RemoteItemId};

use super::{ArticleStore, AuditEntry, AuditStore, StoreError};

/// Schema holding the sync audit table.
const AUDIT_SCHEMA: &str = "webflow_sync";

/// PostgREST client for the audit log and the articles table.
#[derive(Clone)]
pub struct PostgrestStore {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl PostgrestStore {
    /// Creates a store client for the given PostgREST base URL.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            service_key: service_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            // We never consume representations of what we wrote.
            .header("Prefer", "return=minimal")
    }

    async fn check(response: reqwest::Response) -> Result<(), StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

impl AuditStore for PostgrestStore {
    async fn record(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        let response = self
            .authed(self.http.post(self.table_url("sync_log")))
            .header("Content-Profile", AUDIT_SCHEMA)
            .json(&[entry])
            .send()
            .await?;

        Self::check(response).await
    }
}

impl ArticleStore for PostgrestStore {
    async fn link_remote_id(
        &self,
        article: &ArticleId,
        remote: &RemoteItemId,
    ) -> Result<(), StoreError> {
        let response = self
            .authed(self.http.patch(self.table_url("articles")))
            .query(&[("id", format!("eq.{}", article))])
            .json(&json!({ "webflow_id": remote }))
            .send()
            .await?;

        Self::check(response).await
    }
}

impl std::fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
