//! Webhook payload normalizer.
//!
//! Deliveries arrive in one of two envelope shapes and are normalized into a
//! single canonical [`ChangeEvent`]:
//!
//! - `{"eventType": "...", "record": {...}}` for direct invocations of the
//!   sync endpoint;
//! - `{"type": "...", "table": "...", "record": {...}}` for database
//!   change-notification deliveries, which use `type` instead of `eventType`.
//!
//! Normalization has no side effects. Every error here short-circuits the
//! delivery before any external call or audit write is made.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{ArticleId, ArticleRecord, ChangeEvent, EventKind, RemoteItemId};

/// Error type for payload normalization failures.
///
/// All variants map to HTTP 400 at the server layer.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not valid JSON.
    #[error("invalid JSON in request body: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The body is valid JSON but matches neither accepted envelope shape.
    #[error("invalid webhook payload format")]
    UnrecognizedShape,

    /// The envelope carries an empty event kind.
    #[error("missing eventType parameter")]
    MissingEventKind,

    /// A recognized envelope without a record object.
    #[error("missing record data")]
    MissingRecord,

    /// A record object without an `id`.
    #[error("missing record ID")]
    MissingRecordId,
}

/// Raw envelope covering both accepted wire shapes.
///
/// Fields are all optional here; shape selection and required-field
/// validation happen explicitly in [`parse_change_event`].
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "eventType")]
    event_type: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    table: Option<String>,
    record: Option<Value>,
}

/// Raw record fields. The remote id arrives as the articles-table column
/// name `webflow_id`; the genericized `remoteId` spelling is accepted too.
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<Value>,
    name: Option<String>,
    content: Option<String>,
    #[serde(rename = "webflow_id", alias = "remoteId")]
    remote_id: Option<String>,
}

/// Normalizes a raw webhook body into a [`ChangeEvent`].
///
/// # Examples
///
/// ```
/// use webflow_sync::webhooks::parse_change_event;
/// use webflow_sync::types::EventKind;
///
/// let body = br#"{
///     "type": "INSERT",
///     "table": "articles",
///     "record": { "id": 42, "name": "Hello" }
/// }"#;
///
/// let event = parse_change_event(body).unwrap();
/// assert_eq!(event.kind, EventKind::Insert);
/// assert_eq!(event.record.id.as_str(), "42");
/// ```
pub fn parse_change_event(body: &[u8]) -> Result<ChangeEvent, ParseError> {
    let payload: Value = serde_json::from_slice(body)?;
    let envelope: RawEnvelope = serde_json::from_value(payload.clone())?;

    // Shape selection: the direct shape is keyed by `eventType`, the
    // database-notification shape by `type` + `table`.
    let kind_str = if envelope.event_type.is_some() {
        envelope.event_type
    } else if envelope.kind.is_some() && envelope.table.is_some() {
        envelope.kind
    } else {
        return Err(ParseError::UnrecognizedShape);
    };

    let kind_str = kind_str.filter(|s| !s.is_empty());
    let kind = match kind_str {
        Some(s) => EventKind::from_wire(&s),
        None => return Err(ParseError::MissingEventKind),
    };

    let record_value = match envelope.record {
        Some(Value::Object(map)) => Value::Object(map),
        _ => return Err(ParseError::MissingRecord),
    };
    let raw: RawRecord =
        serde_json::from_value(record_value).map_err(ParseError::MalformedPayload)?;

    let id = match raw.id {
        Some(Value::String(s)) if !s.is_empty() => ArticleId::new(s),
        // Database webhooks deliver integer primary keys.
        Some(Value::Number(n)) => ArticleId::new(n.to_string()),
        _ => return Err(ParseError::MissingRecordId),
    };

    Ok(ChangeEvent {
        kind,
        record: ArticleRecord {
            id,
            name: raw.name,
            content: raw.content,
            remote_id: raw.remote_id.map(RemoteItemId::new),
        },
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_direct_shape() {
        let body = br#"{
            "eventType": "INSERT",
            "record": { "id": "a1", "name": "First Post", "content": "<p>hi</p>" }
        }"#;

        let event = parse_change_event(body).unwrap();
        assert_eq!(event.kind, EventKind::Insert);
        assert_eq!(event.record.id, ArticleId::new("a1"));
        assert_eq!(event.record.name.as_deref(), Some("First Post"));
        assert_eq!(event.record.content.as_deref(), Some("<p>hi</p>"));
        assert!(event.record.remote_id.is_none());
    }

    #[test]
    fn parse_database_shape() {
        let body = br#"{
            "type": "UPDATE",
            "table": "articles",
            "record": { "id": 7, "name": "Edited", "webflow_id": "65a1b2c3" }
        }"#;

        let event = parse_change_event(body).unwrap();
        assert_eq!(event.kind, EventKind::Update);
        assert_eq!(event.record.id, ArticleId::new("7"));
        assert_eq!(event.record.remote_id, Some(RemoteItemId::new("65a1b2c3")));
    }

    #[test]
    fn parse_accepts_generic_remote_id_key() {
        let body = br#"{
            "eventType": "DELETE",
            "record": { "id": "9", "remoteId": "wf-9" }
        }"#;

        let event = parse_change_event(body).unwrap();
        assert_eq!(event.record.remote_id, Some(RemoteItemId::new("wf-9")));
    }

    #[test]
    fn parse_retains_raw_payload() {
        let body = br#"{"eventType":"INSERT","record":{"id":"1","name":"x"}}"#;

        let event = parse_change_event(body).unwrap();
        assert_eq!(event.payload["eventType"], "INSERT");
        assert_eq!(event.payload["record"]["id"], "1");
    }

    #[test]
    fn numeric_ids_are_coerced_to_strings() {
        let body = br#"{"type":"DELETE","table":"articles","record":{"id":12345}}"#;

        let event = parse_change_event(body).unwrap();
        assert_eq!(event.record.id, ArticleId::new("12345"));
    }

    #[test]
    fn unknown_kind_survives_as_unsupported() {
        let body = br#"{"type":"TRUNCATE","table":"articles","record":{"id":"1"}}"#;

        let event = parse_change_event(body).unwrap();
        assert_eq!(event.kind, EventKind::Unsupported("TRUNCATE".to_string()));
    }

    #[test]
    fn malformed_json_returns_error() {
        let result = parse_change_event(b"not valid json");
        assert!(matches!(result, Err(ParseError::MalformedPayload(_))));
    }

    #[test]
    fn unrecognized_shape_returns_error() {
        // `type` without `table` matches neither shape.
        let body = br#"{"type":"INSERT","record":{"id":"1"}}"#;
        let result = parse_change_event(body);
        assert!(matches!(result, Err(ParseError::UnrecognizedShape)));

        let result = parse_change_event(b"{}");
        assert!(matches!(result, Err(ParseError::UnrecognizedShape)));
    }

    #[test]
    fn empty_event_kind_returns_error() {
        let body = br#"{"eventType":"","record":{"id":"1"}}"#;
        let result = parse_change_event(body);
        assert!(matches!(result, Err(ParseError::MissingEventKind)));
    }

    #[test]
    fn missing_record_returns_error() {
        let body = br#"{"eventType":"INSERT"}"#;
        assert!(matches!(
            parse_change_event(body),
            Err(ParseError::MissingRecord)
        ));

        // A non-object record is treated as missing.
        let body = br#"{"eventType":"INSERT","record":null}"#;
        assert!(matches!(
            parse_change_event(body),
            Err(ParseError::MissingRecord)
        ));
    }

    #[test]
    fn missing_record_id_returns_error() {
        let body = br#"{"eventType":"INSERT","record":{"name":"No id"}}"#;
        let result = parse_change_event(body);
        assert!(matches!(result, Err(ParseError::MissingRecordId)));

        let body = br#"{"eventType":"INSERT","record":{"id":""}}"#;
        let result = parse_change_event(body);
        assert!(matches!(result, Err(ParseError::MissingRecordId)));
    }
}
