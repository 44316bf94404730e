use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of one indexing pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Eligible files found by the scanner
    pub scanned: usize,

    /// Files parsed in this pass (new or changed hash)
    pub extracted: usize,

    /// Files skipped because their hash matched the stored record
    pub unchanged: usize,

    /// Files dropped because they no longer exist
    pub removed: usize,

    /// Store totals after the pass
    pub symbols: usize,
    pub edges: usize,

    pub pruned_edges: usize,

    /// Extracted files with parse notes
    pub degraded: usize,

    pub generation: u64,

    pub time_ms: u64,

    /// Extracted files per language
    pub languages: BTreeMap<String, usize>,

    /// Files that could not be read; the previous record is kept
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_extracted(&mut self, language: &str, degraded: bool) {
        self.extracted += 1;
        if degraded {
            self.degraded += 1;
        }
        *self.languages.entry(language.to_string()).or_insert(0) += 1;
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Whether the pass touched the stored graph
    pub fn has_changes(&self) -> bool {
        self.extracted > 0 || self.removed > 0
    }
}
