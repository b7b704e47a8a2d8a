use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Create the records table and its indexes. Idempotent.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            identity_key TEXT NOT NULL,
            collection TEXT NOT NULL,
            source_path TEXT NOT NULL,
            freshness_marker TEXT,
            content TEXT NOT NULL,
            metadata_json TEXT NOT NULL DEFAULT '{}',
            embedding BLOB,
            embedding_model TEXT,
            embedding_dims INTEGER,
            PRIMARY KEY (collection, identity_key)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_records_source_path ON records(collection, source_path)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
