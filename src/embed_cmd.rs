use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::embedding;

/// Find and embed records that are missing a vector or carry one from a
/// different model. Repairs the pending rows left behind when an inline
/// embedding batch failed during sync.
pub async fn run_embed_pending(
    config: &Config,
    limit: Option<usize>,
    batch_size_override: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let provider = embedding::create_provider(&config.embedding)?;
    let model_name = provider.model_name().to_string();
    let pool = db::connect(config).await?;
    let batch_size = batch_size_override.unwrap_or(config.embedding.batch_size);

    let pending = find_pending_records(&pool, &config.store.collection, &model_name, limit).await?;

    if dry_run {
        println!("embed pending (dry-run)");
        println!("  records needing embeddings: {}", pending.len());
        return Ok(());
    }

    if pending.is_empty() {
        println!("embed pending");
        println!("  all records up to date");
        return Ok(());
    }

    let total = pending.len();
    let mut embedded = 0u64;
    let mut failed = 0u64;

    for batch in pending.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|p| p.content.clone()).collect();

        match embedding::embed_texts(provider.as_ref(), &config.embedding, &texts).await {
            Ok(vectors) => {
                for (item, vec) in batch.iter().zip(vectors.iter()) {
                    let blob = embedding::vec_to_blob(vec);
                    sqlx::query(
                        r#"
                        UPDATE records
                        SET embedding = ?, embedding_model = ?, embedding_dims = ?
                        WHERE collection = ? AND identity_key = ?
                        "#,
                    )
                    .bind(&blob)
                    .bind(&model_name)
                    .bind(provider.dims() as i64)
                    .bind(&config.store.collection)
                    .bind(&item.identity_key)
                    .execute(&pool)
                    .await?;
                    embedded += 1;
                }
            }
            Err(e) => {
                eprintln!("Warning: embedding batch failed: {}", e);
                failed += batch.len() as u64;
            }
        }
    }

    println!("embed pending");
    println!("  total pending: {}", total);
    println!("  embedded: {}", embedded);
    println!("  failed: {}", failed);

    pool.close().await;
    Ok(())
}

struct PendingRecord {
    identity_key: String,
    content: String,
}

async fn find_pending_records(
    pool: &SqlitePool,
    collection: &str,
    model_name: &str,
    limit: Option<usize>,
) -> Result<Vec<PendingRecord>> {
    let mut sql = String::from(
        "SELECT identity_key, content FROM records \
         WHERE collection = ? AND (embedding IS NULL OR embedding_model IS NOT ?) \
         ORDER BY identity_key",
    );
    if limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    let mut query = sqlx::query(&sql).bind(collection).bind(model_name);
    if let Some(lim) = limit {
        query = query.bind(lim as i64);
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| PendingRecord {
            identity_key: row.get("identity_key"),
            content: row.get("content"),
        })
        .collect())
}
