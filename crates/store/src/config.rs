use crate::error::{Result, StoreError};
use crate::paths::config_path;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional per-project settings from `.context-aware/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub index: IndexSection,
    pub search: SearchSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    /// Worker fan-out for extraction; `None` picks a default from the host
    pub concurrency: Option<usize>,

    /// Files larger than this keep only their file symbol
    pub max_file_bytes: u64,

    /// Extra directory names to skip while scanning
    pub exclude: Vec<String>,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            concurrency: None,
            max_file_bytes: 1_048_576,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// Default number of results
    pub limit: usize,

    /// How many baseline hits the semantic reranker sees
    pub rerank_top_k: usize,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            limit: 20,
            rerank_top_k: 50,
        }
    }
}

impl ProjectConfig {
    /// Load the project config; a missing file yields defaults
    pub async fn load(root: &Path) -> Result<Self> {
        let path = config_path(root);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        Self::parse(&raw).map_err(|err| StoreError::Config(format!("{}: {err}", path.display())))
    }

    pub fn parse(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
