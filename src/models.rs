//! Core data models used throughout docsync.
//!
//! These types represent the retrievable units, indexed records, and
//! reconciliation plans that flow through the sync pipeline.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One indexable item of content: a Markdown chunk, an API operation
/// rendering, or a spec summary.
///
/// Units start life without an `identity_key`; the identity assigner
/// fills it in once the final unit order is known (see
/// [`crate::identity::assign_identity_keys`]).
#[derive(Debug, Clone)]
pub struct DocUnit {
    /// Text body that gets embedded and stored.
    pub content: String,
    /// Stable logical path of the originating file or operation
    /// (e.g. `docs/index.mdx`, `catalog/get-product-by-id`). `None` is
    /// tolerated and keyed as the literal string `"None"`.
    pub source_path: Option<String>,
    /// Last commit timestamp of the underlying source. `None` means the
    /// history is unknown and sorts as oldest.
    pub freshness_marker: Option<DateTime<Utc>>,
    /// Composite storage id `"{source_path}:{ordinal}"`. Empty until
    /// assigned.
    pub identity_key: String,
    /// Open-ended metadata carried to storage, ignored by reconciliation.
    pub extra: Map<String, Value>,
}

impl DocUnit {
    pub fn new(content: String, source_path: Option<String>) -> Self {
        Self {
            content,
            source_path,
            freshness_marker: None,
            identity_key: String::new(),
            extra: Map::new(),
        }
    }

    /// The path string used for grouping and key derivation. A missing
    /// path is rendered as the literal `"None"` so keys stay stable for
    /// sources that never carried one.
    pub fn source_path_str(&self) -> &str {
        self.source_path.as_deref().unwrap_or("None")
    }
}

/// The durable counterpart of a [`DocUnit`] already in the store.
///
/// Only the projection needed by reconciliation: content and vectors are
/// never read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedRecord {
    pub identity_key: String,
    pub source_path: String,
    pub freshness_marker: Option<DateTime<Utc>>,
}

/// Ephemeral output of the reconciliation engine: the minimal operation
/// set that brings the index in line with the current scan. Computed
/// fresh every run, never persisted.
#[derive(Debug, Default)]
pub struct ReconciliationPlan {
    /// Identity keys to remove before (re-)adding.
    pub to_delete: BTreeSet<String>,
    /// Units to add, in production order.
    pub to_upsert: Vec<DocUnit>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_upsert.is_empty()
    }
}
