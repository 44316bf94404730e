//! # Context Graph
//!
//! Dependency linking and traversal over the stored symbol graph.
//!
//! ```text
//! PendingReference[] ──> DependencyLinker ──> Edge[] (imports, calls, inherits)
//!                                               │
//! ContextStore ──> SymbolGraph (petgraph) ──────┤
//!                                               ├──> ImpactAnalyzer (reverse BFS)
//!                                               └──> export (Mermaid, JSON)
//! ```
//!
//! Edges point from the dependent symbol to the symbol it depends on, so the
//! impact of changing `X` is everything that reaches `X` by following edges
//! forward.

mod error;
mod export;
mod graph;
mod impact;
mod linker;

pub use error::{GraphError, Result};
pub use export::{export, export_json, export_mermaid, ExportFormat};
pub use graph::SymbolGraph;
pub use impact::{ImpactAnalyzer, ImpactEntry, ImpactReport};
pub use linker::{DependencyLinker, LinkOutcome};
