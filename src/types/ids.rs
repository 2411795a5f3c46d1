//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of the two ID spaces in play (the
//! content store's article ids and the remote platform's item ids) and make
//! the code more self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The primary key of an article row in the content store.
///
/// Always carried as a string; numeric database ids are coerced to their
/// decimal form during payload normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub String);

impl ArticleId {
    pub fn new(s: impl Into<String>) -> Self {
        ArticleId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ArticleId {
    fn from(s: String) -> Self {
        ArticleId(s)
    }
}

impl From<&str> for ArticleId {
    fn from(s: &str) -> Self {
        ArticleId(s.to_string())
    }
}

/// The remote platform's identifier for a synced collection item.
///
/// Absent on a local record until its first successful create; the only
/// foreign key linking an article to its remote item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteItemId(pub String);

impl RemoteItemId {
    pub fn new(s: impl Into<String>) -> Self {
        RemoteItemId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RemoteItemId {
    fn from(s: String) -> Self {
        RemoteItemId(s)
    }
}

impl From<&str> for RemoteItemId {
    fn from(s: &str) -> Self {
        RemoteItemId(s.to_string())
    }
}
