//! Canonical change-event types.
//!
//! A [`ChangeEvent`] is built once per webhook delivery by the payload
//! normalizer and stays immutable for the life of the request. It owns no
//! long-lived resources and is discarded after the response is sent.

use std::fmt;

use serde_json::Value;

use super::ids::{ArticleId, RemoteItemId};

/// The kind of row-level change a delivery describes.
///
/// Unrecognized wire strings are preserved in [`EventKind::Unsupported`]
/// rather than rejected at parse time: the orchestrator still writes a
/// started audit entry for them before failing the delivery, and the audit
/// trail wants the verbatim string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Insert,
    Update,
    Delete,
    Unsupported(String),
}

impl EventKind {
    /// Classifies a wire-format event kind (`"INSERT"`, `"UPDATE"`, `"DELETE"`).
    pub fn from_wire(s: &str) -> Self {
        match s {
            "INSERT" => EventKind::Insert,
            "UPDATE" => EventKind::Update,
            "DELETE" => EventKind::Delete,
            other => EventKind::Unsupported(other.to_string()),
        }
    }

    /// The wire-format string this kind was parsed from.
    pub fn as_wire(&self) -> &str {
        match self {
            EventKind::Insert => "INSERT",
            EventKind::Update => "UPDATE",
            EventKind::Delete => "DELETE",
            EventKind::Unsupported(s) => s,
        }
    }

    /// Lower-case label used as the prefix of audit status strings
    /// (`insert_started`, `delete_completed`, ...).
    pub fn label(&self) -> String {
        self.as_wire().to_lowercase()
    }

    /// Past-tense verb for the success message shown to the caller.
    pub fn past_tense(&self) -> &str {
        match self {
            EventKind::Insert => "inserted",
            EventKind::Update => "updated",
            EventKind::Delete => "deleted",
            EventKind::Unsupported(_) => "processed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// The article row carried inside a webhook delivery.
///
/// `remote_id` mirrors the `webflow_id` column on the articles table; it is
/// the only link between a local row and its remote item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub id: ArticleId,
    pub name: Option<String>,
    pub content: Option<String>,
    pub remote_id: Option<RemoteItemId>,
}

impl ArticleRecord {
    /// Display name for audit entries; articles can arrive unnamed.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed article")
    }
}

/// One normalized webhook delivery.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: EventKind,
    pub record: ArticleRecord,
    /// The raw webhook body, retained verbatim for the started audit entry.
    pub payload: Value,
}
