//! Sync pipeline orchestration.
//!
//! Coordinates the full flow for one site: extraction → chunking →
//! identity assignment → reconciliation → plan application. Each
//! configured subdirectory runs to completion before the next starts;
//! the store connection is opened once and shared by the read and write
//! steps of every pass.

use anyhow::{bail, Result};

use crate::chunk::chunk_unit;
use crate::config::{Config, SiteMode};
use crate::identity::assign_identity_keys;
use crate::markdown;
use crate::models::DocUnit;
use crate::openapi;
use crate::reconcile::{reconcile, reconcile_full};
use crate::store::sqlite::SqliteStore;
use crate::store::{VectorStore, WriteReport};

pub async fn run_sync(
    config: &Config,
    site_name: &str,
    full: bool,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let Some(site) = config.sites.get(site_name) else {
        let available: Vec<&str> = config.sites.keys().map(String::as_str).collect();
        bail!(
            "Unknown site: '{}'. Available: {}",
            site_name,
            available.join(", ")
        );
    };

    let store = SqliteStore::connect(config).await?;

    let mut total_units = 0u64;
    let mut total_deleted = 0u64;
    let mut report = WriteReport::default();

    for subdir in &site.subdirs {
        let mut units = scan_subdir(config, site.mode, subdir)?;
        if let Some(lim) = limit {
            units.truncate(lim);
        }
        assign_identity_keys(&mut units);
        total_units += units.len() as u64;

        let existing = store.read_records().await?;
        let plan = if full {
            reconcile_full(units, &existing)
        } else {
            reconcile(units, &existing)
        };

        println!(
            "  {}: {} existing, plan: -{} +{}",
            subdir,
            existing.len(),
            plan.to_delete.len(),
            plan.to_upsert.len()
        );

        if dry_run {
            continue;
        }

        store.delete_many(&plan.to_delete).await?;
        total_deleted += plan.to_delete.len() as u64;

        let pass_report = store.add_documents(&plan.to_upsert).await?;
        report.added += pass_report.added;
        report.embeddings_written += pass_report.embeddings_written;
        report.embeddings_pending += pass_report.embeddings_pending;
    }

    if dry_run {
        println!("sync {} (dry-run)", site_name);
        println!("  units scanned: {}", total_units);
        return Ok(());
    }

    println!("sync {}", site_name);
    println!("  units scanned: {}", total_units);
    println!("  deleted: {}", total_deleted);
    println!("  upserted: {}", report.added);
    if config.embedding.is_enabled() {
        println!("  embeddings written: {}", report.embeddings_written);
        println!("  embeddings pending: {}", report.embeddings_pending);
    }
    println!("ok");

    store.close().await;
    Ok(())
}

/// Scan one subdirectory in the site's mode, producing keyed-ready units.
///
/// Markdown files pass through the chunker; OpenAPI units are already
/// bounded renderings and go through as-is.
fn scan_subdir(config: &Config, mode: SiteMode, subdir: &str) -> Result<Vec<DocUnit>> {
    match mode {
        SiteMode::Markdown => {
            let files = markdown::scan_markdown(&config.repo.path, subdir)?;
            println!("  {}: {} markdown files", subdir, files.len());
            let mut units = Vec::new();
            for file in &files {
                units.extend(chunk_unit(file, config.chunking.chunk_size));
            }
            Ok(units)
        }
        SiteMode::Openapi => {
            let units = openapi::scan_specs(&config.repo.path, subdir)?;
            println!("  {}: {} spec units", subdir, units.len());
            Ok(units)
        }
    }
}
