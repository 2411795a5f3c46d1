//! Webflow API client.
//!
//! Executes [`RemoteEffect`]s against the Webflow content API. The client is
//! scoped to one collection and one site, matching the effect design (effects
//! don't carry collection or site ids).
//!
//! Every call is a single HTTP request with no retry: a failed call aborts
//! the remaining steps of the delivery that issued it.

use serde::Serialize;
use serde_json::{json, Value};

use crate::effects::{
    RemoteApiError, RemoteEffect, RemoteInterpreter, RemoteItemFields, RemoteResponse,
};
use crate::types::RemoteItemId;

/// Production API base. Item and publish endpoints are all rooted here.
const DEFAULT_BASE_URL: &str = "https://api.webflow.com/beta";

/// API version pinned via the `accept-version` header.
const ACCEPT_VERSION: &str = "2.0.0";

/// A Webflow API client scoped to a specific collection and site.
#[derive(Clone)]
pub struct WebflowClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    collection_id: String,
    site_id: String,
}

impl WebflowClient {
    /// Creates a client for the given collection and site.
    pub fn new(
        token: impl Into<String>,
        collection_id: impl Into<String>,
        site_id: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            collection_id: collection_id.into(),
            site_id: site_id.into(),
        }
    }

    /// Overrides the API base URL. Intended for tests against a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn items_url(&self) -> String {
        format!("{}/collections/{}/items", self.base_url, self.collection_id)
    }

    fn item_url(&self, item: &RemoteItemId) -> String {
        format!("{}/{}", self.items_url(), item)
    }

    fn publish_item_url(&self, item: &RemoteItemId) -> String {
        format!("{}/live", self.item_url(item))
    }

    fn publish_site_url(&self) -> String {
        format!("{}/sites/{}/publish", self.base_url, self.site_id)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header("accept-version", ACCEPT_VERSION)
    }

    async fn create_item(&self, fields: RemoteItemFields) -> Result<RemoteResponse, RemoteApiError> {
        let response = self
            .request(reqwest::Method::POST, self.items_url())
            .json(&ItemWriteBody {
                field_data: &fields,
            })
            .send()
            .await
            .map_err(RemoteApiError::transport)?;

        let item = read_json_body(response).await?;
        let id = extract_item_id(&item);
        if id.is_none() {
            tracing::warn!(
                source_id = %fields.source_id,
                "create response carried no item id; skipping link and item publish"
            );
        }

        Ok(RemoteResponse::Created { id, item })
    }

    async fn update_item(
        &self,
        item: RemoteItemId,
        fields: RemoteItemFields,
    ) -> Result<RemoteResponse, RemoteApiError> {
        let response = self
            .request(reqwest::Method::PATCH, self.item_url(&item))
            .json(&ItemWriteBody {
                field_data: &fields,
            })
            .send()
            .await
            .map_err(RemoteApiError::transport)?;

        let item = read_json_body(response).await?;
        Ok(RemoteResponse::Updated { item })
    }

    async fn delete_item(&self, item: RemoteItemId) -> Result<RemoteResponse, RemoteApiError> {
        let response = self
            .request(reqwest::Method::DELETE, self.item_url(&item))
            .send()
            .await
            .map_err(RemoteApiError::transport)?;

        check_status(response).await?;
        Ok(RemoteResponse::Deleted)
    }

    async fn publish_item(&self, item: RemoteItemId) -> Result<RemoteResponse, RemoteApiError> {
        let response = self
            .request(reqwest::Method::PUT, self.publish_item_url(&item))
            .send()
            .await
            .map_err(RemoteApiError::transport)?;

        check_status(response).await?;
        Ok(RemoteResponse::ItemPublished)
    }

    async fn publish_site(&self) -> Result<RemoteResponse, RemoteApiError> {
        let response = self
            .request(reqwest::Method::POST, self.publish_site_url())
            .json(&json!({ "domains": ["all"] }))
            .send()
            .await
            .map_err(RemoteApiError::transport)?;

        check_status(response).await?;
        Ok(RemoteResponse::SitePublished)
    }
}

impl RemoteInterpreter for WebflowClient {
    async fn interpret(&self, effect: RemoteEffect) -> Result<RemoteResponse, RemoteApiError> {
        match effect {
            RemoteEffect::CreateItem { fields } => self.create_item(fields).await,
            RemoteEffect::UpdateItem { item, fields } => self.update_item(item, fields).await,
            RemoteEffect::DeleteItem { item } => self.delete_item(item).await,
            RemoteEffect::PublishItem { item } => self.publish_item(item).await,
            RemoteEffect::PublishSite => self.publish_site().await,
        }
    }
}

impl std::fmt::Debug for WebflowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebflowClient")
            .field("base_url", &self.base_url)
            .field("collection_id", &self.collection_id)
            .field("site_id", &self.site_id)
            .finish_non_exhaustive()
    }
}

/// Write-path request body: the API nests item fields under `fieldData`.
#[derive(Serialize)]
struct ItemWriteBody<'a> {
    #[serde(rename = "fieldData")]
    field_data: &'a RemoteItemFields,
}

/// Fails on non-2xx, surfacing the upstream status and body verbatim.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
    Err(RemoteApiError::upstream(status.as_u16(), body))
}

/// Checks the status and parses the body as JSON.
async fn read_json_body(response: reqwest::Response) -> Result<Value, RemoteApiError> {
    let response = check_status(response).await?;
    response.json().await.map_err(RemoteApiError::transport)
}

/// Pulls the assigned item id out of a create response body.
fn extract_item_id(item: &Value) -> Option<RemoteItemId> {
    item.get("id")
        .and_then(|v| v.as_str())
        .map(RemoteItemId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WebflowClient {
        WebflowClient::new("token", "col-1", "site-1")
    }

    #[test]
    fn urls_are_scoped_to_collection_and_site() {
        let client = client();
        let item = RemoteItemId::new("65a1");

        assert_eq!(
            client.items_url(),
            "https://api.webflow.com/beta/collections/col-1/items"
        );
        assert_eq!(
            client.item_url(&item),
            "https://api.webflow.com/beta/collections/col-1/items/65a1"
        );
        assert_eq!(
            client.publish_item_url(&item),
            "https://api.webflow.com/beta/collections/col-1/items/65a1/live"
        );
        assert_eq!(
            client.publish_site_url(),
            "https://api.webflow.com/beta/sites/site-1/publish"
        );
    }

    #[test]
    fn base_url_override_applies() {
        let client = client().with_base_url("http://127.0.0.1:9999");
        assert_eq!(
            client.publish_site_url(),
            "http://127.0.0.1:9999/sites/site-1/publish"
        );
    }

    #[test]
    fn extract_item_id_handles_missing_and_present() {
        assert_eq!(
            extract_item_id(&serde_json::json!({"id": "wf-1"})),
            Some(RemoteItemId::new("wf-1"))
        );
        assert_eq!(extract_item_id(&serde_json::json!({"ok": true})), None);
        assert_eq!(extract_item_id(&serde_json::json!({"id": 7})), None);
    }

    #[test]
    fn debug_does_not_leak_token() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("token"), "{}", rendered);
    }
}
