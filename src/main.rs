//! # docsync CLI
//!
//! Commands for initializing the vector store, inspecting configured doc
//! sites, syncing a site into the index, and backfilling embeddings.
//!
//! ## Usage
//!
//! ```bash
//! docsync --config ./config/docsync.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docsync init` | Create the store database and schema |
//! | `docsync sites` | List configured sites and their health |
//! | `docsync sync <site>` | Incrementally sync one site into the index |
//! | `docsync embed pending` | Backfill missing or mismatched embeddings |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docsync::{config, embed_cmd, migrate, sites, sync};

/// docsync — incremental documentation-to-vector-index synchronizer.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file with the repository path, store parameters, and site definitions.
#[derive(Parser)]
#[command(
    name = "docsync",
    about = "Incrementally sync Markdown docs and OpenAPI specs into a vector search index",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docsync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store schema.
    ///
    /// Creates the SQLite database file and the records table. Idempotent.
    Init,

    /// List configured doc sites and whether their scan roots exist.
    Sites,

    /// Sync one site into the vector index.
    ///
    /// Scans the site's subdirectories, chunks and keys the content,
    /// reconciles against the store, and applies the resulting plan.
    Sync {
        /// Site name as configured under `[sites.<name>]`.
        site: String,

        /// Ignore freshness markers: rewrite every scanned source and
        /// delete all of its existing keys first (repairs shrunk
        /// documents the incremental pass leaves behind).
        #[arg(long)]
        full: bool,

        /// Show scan and plan counts without writing to the store.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of units to process per subdirectory.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Manage embedding vectors.
    Embed {
        #[command(subcommand)]
        action: EmbedAction,
    },
}

/// Embedding management subcommands.
#[derive(Subcommand)]
enum EmbedAction {
    /// Embed records that are missing a vector or carry one from a
    /// different model.
    Pending {
        /// Maximum number of records to embed in this run.
        #[arg(long)]
        limit: Option<usize>,

        /// Override the batch size from config.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Show counts without performing any embedding.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Store initialized successfully.");
        }
        Commands::Sites => {
            sites::list_sites(&cfg)?;
        }
        Commands::Sync {
            site,
            full,
            dry_run,
            limit,
        } => {
            sync::run_sync(&cfg, &site, full, dry_run, limit).await?;
        }
        Commands::Embed { action } => match action {
            EmbedAction::Pending {
                limit,
                batch_size,
                dry_run,
            } => {
                embed_cmd::run_embed_pending(&cfg, limit, batch_size, dry_run).await?;
            }
        },
    }

    Ok(())
}
