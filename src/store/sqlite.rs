//! SQLite-backed [`VectorStore`].
//!
//! Records live in a single `records` table scoped by collection name,
//! with vectors stored as little-endian `f32` BLOBs alongside the text
//! they embed. One store connection serves both the read and the write
//! step of a pass; no transaction spans the two.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;

use crate::config::Config;
use crate::db;
use crate::embedding::{self, EmbeddingProvider};
use crate::gitlog;
use crate::models::{DocUnit, IndexedRecord};

use super::{VectorStore, WriteReport};

pub struct SqliteStore {
    pool: SqlitePool,
    collection: String,
    embedding_config: crate::config::EmbeddingConfig,
    provider: Box<dyn EmbeddingProvider>,
}

impl SqliteStore {
    /// Open the store once per pass.
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        let provider = embedding::create_provider(&config.embedding)?;
        Ok(Self {
            pool,
            collection: config.store.collection.clone(),
            embedding_config: config.embedding.clone(),
            provider,
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn read_records(&self) -> Result<Vec<IndexedRecord>> {
        let rows = sqlx::query(
            "SELECT identity_key, freshness_marker, source_path FROM records WHERE collection = ?",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let marker: Option<String> = row.get("freshness_marker");
            records.push(IndexedRecord {
                identity_key: row.get("identity_key"),
                source_path: row.get("source_path"),
                freshness_marker: marker
                    .as_deref()
                    .and_then(gitlog::parse_commit_timestamp),
            });
        }
        Ok(records)
    }

    async fn delete_many(&self, keys: &BTreeSet<String>) -> Result<()> {
        for key in keys {
            sqlx::query("DELETE FROM records WHERE collection = ? AND identity_key = ?")
                .bind(&self.collection)
                .bind(key)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn add_documents(&self, units: &[DocUnit]) -> Result<WriteReport> {
        let mut report = WriteReport::default();

        for batch in units.chunks(self.embedding_config.batch_size) {
            // Inline embedding (non-fatal): a failed batch lands
            // vectorless and is picked up later by `embed pending`.
            let vectors = if self.embedding_config.is_enabled() {
                let texts: Vec<String> = batch.iter().map(|u| u.content.clone()).collect();
                match embedding::embed_texts(
                    self.provider.as_ref(),
                    &self.embedding_config,
                    &texts,
                )
                .await
                {
                    Ok(vectors) => Some(vectors),
                    Err(e) => {
                        eprintln!("Warning: embedding batch failed: {}", e);
                        None
                    }
                }
            } else {
                None
            };

            for (i, unit) in batch.iter().enumerate() {
                let vector = vectors.as_ref().and_then(|vs| vs.get(i));
                let blob = vector.map(|v| embedding::vec_to_blob(v));
                let marker = unit.freshness_marker.map(|dt| dt.to_rfc3339());
                let metadata = serde_json::Value::Object(unit.extra.clone()).to_string();

                sqlx::query(
                    r#"
                    INSERT OR REPLACE INTO records
                        (identity_key, collection, source_path, freshness_marker,
                         content, metadata_json, embedding, embedding_model, embedding_dims)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&unit.identity_key)
                .bind(&self.collection)
                .bind(unit.source_path_str())
                .bind(&marker)
                .bind(&unit.content)
                .bind(&metadata)
                .bind(&blob)
                .bind(blob.as_ref().map(|_| self.provider.model_name()))
                .bind(blob.as_ref().map(|_| self.provider.dims() as i64))
                .execute(&self.pool)
                .await?;

                report.added += 1;
                if blob.is_some() {
                    report.embeddings_written += 1;
                } else if self.embedding_config.is_enabled() {
                    report.embeddings_pending += 1;
                }
            }
        }

        Ok(report)
    }
}
