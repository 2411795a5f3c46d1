//! Core domain types for the sync service.

pub mod event;
pub mod ids;

pub use event::{ArticleRecord, ChangeEvent, EventKind};
pub use ids::{ArticleId, RemoteItemId};
