use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration, loaded once and passed by reference into
/// every component. No module-level state anywhere.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub repo: RepoConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    pub sites: BTreeMap<String, SiteConfig>,
}

/// Location of the already-checked-out docs repository. Cloning is the
/// caller's concern; we only read the working tree and its history.
#[derive(Debug, Deserialize, Clone)]
pub struct RepoConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// SQLite database file backing the vector collection.
    pub path: PathBuf,
    /// Logical collection name; scopes records within one database.
    pub collection: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    3000
}

/// One named doc site: a scan mode plus the fixed list of repository
/// subdirectories belonging to it.
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub mode: SiteMode,
    pub subdirs: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    Markdown,
    Openapi,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Load and validate configuration. Every check fails fast, before any
/// I/O, with the offending setting named.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.store.collection.trim().is_empty() {
        anyhow::bail!("store.collection must not be empty");
    }

    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }

    if config.sites.is_empty() {
        anyhow::bail!("at least one [sites.<name>] section is required");
    }
    for (name, site) in &config.sites {
        if site.subdirs.is_empty() {
            anyhow::bail!("sites.{}.subdirs must not be empty", name);
        }
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const VALID: &str = r#"
[repo]
path = "/tmp/docs-repo"

[store]
path = "/tmp/docsync.sqlite"
collection = "docs"

[sites.commerce]
mode = "markdown"
subdirs = ["docs/commerce-manager"]

[sites.apis]
mode = "openapi"
subdirs = ["openapispecs"]
"#;

    #[test]
    fn test_valid_config_parses() {
        let file = write_config(VALID);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.chunking.chunk_size, 3000);
        assert_eq!(config.sites.len(), 2);
        assert_eq!(config.sites["apis"].mode, SiteMode::Openapi);
        assert!(!config.embedding.is_enabled());
    }

    #[test]
    fn test_missing_store_section_fails_with_name() {
        let file = write_config("[repo]\npath = \"/tmp\"\n");
        let err = format!("{:#}", load_config(file.path()).unwrap_err());
        assert!(err.contains("parse"), "unexpected error: {}", err);
    }

    #[test]
    fn test_empty_collection_rejected() {
        let config = VALID.replace("collection = \"docs\"", "collection = \"\"");
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err().to_string();
        assert!(err.contains("store.collection"));
    }

    #[test]
    fn test_enabled_embedding_requires_model_and_dims() {
        let config = format!("{}\n[embedding]\nprovider = \"openai\"\n", VALID);
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err().to_string();
        assert!(err.contains("embedding."));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = format!(
            "{}\n[embedding]\nprovider = \"quantum\"\nmodel = \"m\"\ndims = 4\n",
            VALID
        );
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err().to_string();
        assert!(err.contains("quantum"));
    }

    #[test]
    fn test_site_without_subdirs_rejected() {
        let config = VALID.replace("subdirs = [\"openapispecs\"]", "subdirs = []");
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err().to_string();
        assert!(err.contains("sites.apis.subdirs"));
    }
}
