use crate::error::{Result, StoreError};
use context_extractor::{Diagnostic, Edge, PendingReference, Symbol};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Current on-disk format.
///
/// Version history:
/// - 1: symbols, edges and file records without `generation` and without the
///   per-file `references`/`notes`/`language` fields.
/// - 2: adds the generation counter and per-file reference/diagnostic lists.
///   A v1 snapshot is migrated on load: `generation` starts at 0, the new
///   file-record fields start empty and every `content_hash` is cleared, so
///   the next index pass re-extracts each file and rebuilds its references.
pub const SNAPSHOT_VERSION: u32 = 2;

/// Everything the store persists for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,

    /// Incremented on every committed indexing pass
    pub generation: u64,

    pub symbols: BTreeMap<String, Symbol>,

    /// Kept sorted so identical graphs serialize identically
    pub edges: BTreeSet<Edge>,

    pub files: BTreeMap<String, FileRecord>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            generation: 0,
            symbols: BTreeMap::new(),
            edges: BTreeSet::new(),
            files: BTreeMap::new(),
        }
    }
}

/// Per-file bookkeeping used for change detection and re-linking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,

    /// SHA-256 of the raw file bytes
    pub content_hash: String,

    /// Unix seconds
    pub last_indexed_at: u64,

    /// Ids of the symbols attributed to this file, in extraction order
    pub symbol_ids: Vec<String>,

    #[serde(default)]
    pub language: String,

    /// Unresolved names used by this file's symbols
    #[serde(default)]
    pub references: Vec<PendingReference>,

    /// Parse notes and unresolved references from the last pass
    #[serde(default)]
    pub notes: Vec<Diagnostic>,
}

impl Snapshot {
    /// Decode a stored snapshot, migrating older formats
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut value: Value = serde_json::from_slice(bytes)?;
        let found = value
            .get("version")
            .and_then(Value::as_u64)
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
            .unwrap_or(1);

        if found > SNAPSHOT_VERSION {
            return Err(StoreError::SchemaMismatch {
                found,
                supported: SNAPSHOT_VERSION,
            });
        }
        if found < SNAPSHOT_VERSION {
            log::info!("Migrating context snapshot from version {found} to {SNAPSHOT_VERSION}");
            migrate_v1(&mut value);
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Structural equality ignoring the generation counter
    pub fn same_content(&self, other: &Self) -> bool {
        self.symbols == other.symbols && self.edges == other.edges && self.files == other.files
    }
}

fn migrate_v1(value: &mut Value) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    object.insert("version".to_string(), Value::from(SNAPSHOT_VERSION));
    object
        .entry("generation")
        .or_insert_with(|| Value::from(0u64));
    for key in ["symbols", "files"] {
        object
            .entry(key)
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    object
        .entry("edges")
        .or_insert_with(|| Value::Array(Vec::new()));

    // v1 records carry no references; force every file to be re-extracted
    if let Some(files) = object.get_mut("files").and_then(Value::as_object_mut) {
        for record in files.values_mut().filter_map(Value::as_object_mut) {
            record.insert("content_hash".to_string(), Value::String(String::new()));
        }
    }
}
