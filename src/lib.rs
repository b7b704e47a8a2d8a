//! # docsync
//!
//! Incremental synchronization of a documentation corpus (Markdown pages
//! and OpenAPI specs from a checked-out repository) into a vector search
//! index, so a retrieval layer can serve semantically relevant passages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌───────────────────┐   ┌────────────┐
//! │ Extractors  │──▶│ Chunk + Identity  │──▶│ Reconcile  │
//! │ md / yaml   │   │ {path}:{ordinal}  │   │ add/delete │
//! └─────────────┘   └───────────────────┘   └─────┬──────┘
//!                                                 ▼
//!                                          ┌────────────┐
//!                                          │ VectorStore│
//!                                          │ embed+write│
//!                                          └────────────┘
//! ```
//!
//! Re-runs are safe by construction: identity keys are deterministic,
//! equal freshness markers never re-index, and a crashed pass is
//! repaired by running again.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`markdown`] | Markdown source extraction |
//! | [`openapi`] | OpenAPI spec reduction |
//! | [`gitlog`] | Version-history freshness lookup |
//! | [`chunk`] | Text chunking |
//! | [`identity`] | Identity key assignment |
//! | [`reconcile`] | Incremental reconciliation engine |
//! | [`store`] | Vector store backends |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`sync`] | Pipeline orchestration |

pub mod chunk;
pub mod config;
pub mod db;
pub mod embed_cmd;
pub mod embedding;
pub mod gitlog;
pub mod identity;
pub mod markdown;
pub mod migrate;
pub mod models;
pub mod openapi;
pub mod reconcile;
pub mod sites;
pub mod store;
pub mod sync;
