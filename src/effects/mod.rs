//! Effects-as-data for remote content-API operations.
//!
//! These types describe calls against the publishing platform without
//! executing them. The interpreter (implemented in [`crate::webflow`])
//! executes them against the real API; tests substitute a mock interpreter
//! and assert on the exact sequence of effects the orchestrator emits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ArticleId, RemoteItemId};

pub mod interpreter;

pub use interpreter::{RemoteApiError, RemoteInterpreter};

/// The field set written to a remote item on create and update.
///
/// `source_id` always carries the originating article id, making the remote
/// item traceable back to its source row even if the local link is lost.
/// The slug is recomputed on every write, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItemFields {
    pub name: String,
    pub content: String,
    #[serde(rename = "sourceId")]
    pub source_id: ArticleId,
    pub slug: String,
}

/// A remote content-API effect.
///
/// Effects are scoped to one collection and one site: the interpreter is
/// constructed with the collection and site ids, so effects don't carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteEffect {
    /// Create a new remote item.
    CreateItem { fields: RemoteItemFields },

    /// Overwrite the fields of an existing remote item.
    UpdateItem {
        item: RemoteItemId,
        fields: RemoteItemFields,
    },

    /// Delete a remote item.
    DeleteItem { item: RemoteItemId },

    /// Make a single remote item live.
    PublishItem { item: RemoteItemId },

    /// Propagate all pending changes across the whole remote surface.
    PublishSite,
}

/// Response from a remote effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteResponse {
    /// Response to `CreateItem`.
    ///
    /// `id` is the identifier the platform assigned to the new item. The API
    /// has been observed to return 2xx bodies without an `id`; that case is
    /// represented as `None` rather than treated as a failure.
    Created {
        id: Option<RemoteItemId>,
        item: Value,
    },

    /// Response to `UpdateItem`, carrying the platform's item representation.
    Updated { item: Value },

    /// Response to `DeleteItem`.
    Deleted,

    /// Response to `PublishItem`.
    ItemPublished,

    /// Response to `PublishSite`.
    SitePublished,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fields_serialize_with_wire_key_names() {
        let fields = RemoteItemFields {
            name: "A Title".to_string(),
            content: "<p>body</p>".to_string(),
            source_id: ArticleId::new("42"),
            slug: "a-title".to_string(),
        };

        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "A Title",
                "content": "<p>body</p>",
                "sourceId": "42",
                "slug": "a-title"
            })
        );
    }

    #[test]
    fn effect_serde_roundtrip() {
        let effect = RemoteEffect::UpdateItem {
            item: RemoteItemId::new("65a1"),
            fields: RemoteItemFields {
                name: "n".to_string(),
                content: String::new(),
                source_id: ArticleId::new("1"),
                slug: "n".to_string(),
            },
        };

        let json = serde_json::to_string(&effect).unwrap();
        let parsed: RemoteEffect = serde_json::from_str(&json).unwrap();
        assert_eq!(effect, parsed);
    }
}
