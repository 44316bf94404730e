//! # Context Indexer
//!
//! Brings a project's context store up to date with the files on disk.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> File Scanner (.gitignore aware, parseable extensions only)
//!     │
//!     ├──> Hash check against stored FileRecords
//!     │      └─> unchanged files are skipped without parsing
//!     │
//!     ├──> Symbol Extractor (bounded worker fan-out)
//!     │
//!     ├──> Dependency Linker (all stored references, full symbol table)
//!     │
//!     └──> Prune dangling edges, bump generation, atomic save
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_indexer::ProjectIndexer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let indexer = ProjectIndexer::new("/path/to/project").await?;
//!     let stats = indexer.index().await?;
//!
//!     println!("Indexed {} files, {} symbols", stats.scanned, stats.symbols);
//!     Ok(())
//! }
//! ```

mod cancel;
mod error;
mod indexer;
mod limits;
mod scanner;
mod stats;

pub use cancel::CancelFlag;
pub use error::{IndexerError, Result};
pub use indexer::{IndexOptions, ProjectIndexer};
pub use limits::{resolve_index_concurrency, INDEX_CONCURRENCY_ENV};
pub use scanner::{FileScanner, ScanOptions};
pub use stats::IndexStats;
