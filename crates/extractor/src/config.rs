use serde::{Deserialize, Serialize};

/// Configuration for symbol extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Files above this size keep only their file symbol
    pub max_file_bytes: usize,

    /// Keep docstrings and doc comments on symbols
    pub include_docstrings: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1_048_576,
            include_docstrings: true,
        }
    }
}
