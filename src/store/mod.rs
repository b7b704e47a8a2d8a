//! Vector store abstraction.
//!
//! The [`VectorStore`] trait is the interface boundary the reconciliation
//! engine plans against: a projection read of what is indexed, a batch
//! delete, and a batch add that embeds content on the way in. The
//! SQLite-backed [`sqlite::SqliteStore`] is the production backend; the
//! in-memory [`memory::MemoryStore`] backs tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::models::{DocUnit, IndexedRecord};

/// Counters reported by one [`VectorStore::add_documents`] call.
///
/// Embedding failures inside the write are non-fatal: rows still land,
/// vectorless, and show up in `embeddings_pending` for a later
/// `embed pending` run.
#[derive(Debug, Default, Clone, Copy)]
pub struct WriteReport {
    pub added: u64,
    pub embeddings_written: u64,
    pub embeddings_pending: u64,
}

/// Abstract vector store backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`read_records`](VectorStore::read_records) | Projection of indexed records (no content/vectors) |
/// | [`delete_many`](VectorStore::delete_many) | Remove records by identity key |
/// | [`add_documents`](VectorStore::add_documents) | Insert/overwrite units, embedding inline |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Read the reconciliation projection: identity key, freshness
    /// marker, and source path for every record in the collection.
    async fn read_records(&self) -> Result<Vec<IndexedRecord>>;

    /// Delete the records addressed by `keys`. Missing keys are not an
    /// error (re-running a crashed pass must not trip over its own
    /// earlier deletes).
    async fn delete_many(&self, keys: &BTreeSet<String>) -> Result<()>;

    /// Insert or overwrite `units`, keyed by their identity keys, with
    /// embedding generated inline where configured.
    async fn add_documents(&self, units: &[DocUnit]) -> Result<WriteReport>;
}
