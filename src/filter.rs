//! Metadata filtering for similarity search.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::Metadata;

/// An exact subset-containment predicate over record metadata.
///
/// A record matches when every key in the filter is present in the record's
/// metadata with an equal value. An empty filter matches every record. This
/// is deliberately not a query language: the semantics are the same across
/// every store backend.
///
/// # Example
///
/// ```rust
/// use docrag::MetadataFilter;
///
/// let filter = MetadataFilter::new().with("storage_type", "GoogleDrive");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataFilter(HashMap<String, String>);

impl MetadataFilter {
    /// Create an empty filter that matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required key-value pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Whether this filter has no constraints.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluate the predicate against a record's metadata.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.0.iter().all(|(k, v)| metadata.get(k) == Some(v))
    }

    /// The filter as a JSON object, for backends with native containment
    /// operators (pgvector's `metadata @> $1::jsonb`).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_else(|_| serde_json::json!({}))
    }
}

impl From<HashMap<String, String>> for MetadataFilter {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}
