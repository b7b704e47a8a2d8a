//! In-memory [`VectorStore`] implementation for testing.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety. No
//! embedding is performed; every added unit counts as pending when a
//! provider would have been enabled.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{DocUnit, IndexedRecord};

use super::{VectorStore, WriteReport};

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub record: IndexedRecord,
    pub content: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored records, sorted by identity key.
    pub fn snapshot(&self) -> Vec<StoredRecord> {
        let records = self.records.read().unwrap();
        let mut out: Vec<StoredRecord> = records.values().cloned().collect();
        out.sort_by(|a, b| a.record.identity_key.cmp(&b.record.identity_key));
        out
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn read_records(&self) -> Result<Vec<IndexedRecord>> {
        let records = self.records.read().unwrap();
        let mut out: Vec<IndexedRecord> =
            records.values().map(|s| s.record.clone()).collect();
        out.sort_by(|a, b| a.identity_key.cmp(&b.identity_key));
        Ok(out)
    }

    async fn delete_many(&self, keys: &BTreeSet<String>) -> Result<()> {
        let mut records = self.records.write().unwrap();
        for key in keys {
            records.remove(key);
        }
        Ok(())
    }

    async fn add_documents(&self, units: &[DocUnit]) -> Result<WriteReport> {
        let mut records = self.records.write().unwrap();
        let mut report = WriteReport::default();
        for unit in units {
            records.insert(
                unit.identity_key.clone(),
                StoredRecord {
                    record: IndexedRecord {
                        identity_key: unit.identity_key.clone(),
                        source_path: unit.source_path_str().to_string(),
                        freshness_marker: unit.freshness_marker,
                    },
                    content: unit.content.clone(),
                    metadata: unit.extra.clone(),
                },
            );
            report.added += 1;
        }
        Ok(report)
    }
}
