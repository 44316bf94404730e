//! # Context Extractor
//!
//! Syntax-aware symbol extraction for the context index.
//!
//! ## Architecture
//!
//! ```text
//! Source bytes + relative path
//!     │
//!     ├──> Language detection (from extension)
//!     │
//!     ├──> Tree-sitter parsing → AST
//!     │
//!     ├──> SourceParser (one per language)
//!     │    ├─> classify nodes: definition / scope / plain
//!     │    └─> pull call, import and inheritance names
//!     │
//!     └──> Shared walker
//!          ├─> stable ids: <kind>:<path>[:<qualified name>]
//!          ├─> contains edges (file → class → method)
//!          └─> pending references + diagnostics
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_extractor::{SymbolExtractor, ExtractorConfig};
//!
//! let extractor = SymbolExtractor::new(ExtractorConfig::default());
//! let extraction = extractor.extract("auth.py", b"def login(user):\n    return verify(user)\n");
//!
//! assert_eq!(extraction.symbols[1].id, "function:auth.py:login");
//! assert_eq!(extraction.references[0].name, "verify");
//! ```

mod config;
mod error;
mod extractor;
mod language;
pub mod languages;
mod parser;
mod types;

pub use config::ExtractorConfig;
pub use error::{ExtractorError, Result};
pub use extractor::SymbolExtractor;
pub use language::{is_supported_path, Language, SUPPORTED_EXTENSIONS};
pub use parser::{Definition, RawReference, SourceParser, Visit};
pub use types::{
    content_hash, file_stem, module_path, symbol_id, Diagnostic, DiagnosticKind, Edge, EdgeKind,
    Extraction, PendingReference, SourceRange, Symbol, SymbolKind,
};
