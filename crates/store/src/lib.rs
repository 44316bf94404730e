//! # Context Store
//!
//! Versioned on-disk symbol graph for one project.
//!
//! ```text
//! <root>/.context-aware/
//!     snapshot.json   version, generation, symbols, edges, file records
//!     index.lock      advisory writer lock
//!     config.toml     optional project settings
//! ```
//!
//! Writes go through write-temp-then-rename, so readers only ever see a
//! fully committed snapshot.

mod config;
mod error;
mod lock;
mod overview;
mod paths;
mod snapshot;
mod store;

pub use config::{IndexSection, ProjectConfig, SearchSection};
pub use error::{Result, StoreError};
pub use lock::StoreLock;
pub use overview::{DirectorySummary, FileSummary, Hotspot, ProjectStructure, Totals};
pub use paths::{
    config_path, context_dir_for_project_root, is_context_dir_name, lock_path,
    normalize_relative, snapshot_path, CONTEXT_DIR_NAME,
};
pub use snapshot::{FileRecord, Snapshot, SNAPSHOT_VERSION};
pub use store::ContextStore;
