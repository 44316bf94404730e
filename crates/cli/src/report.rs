use context_extractor::{EdgeKind, SourceRange, Symbol, SymbolKind};
use context_graph::{GraphError, ImpactReport};
use context_indexer::IndexerError;
use context_search::SearchError;
use context_store::StoreError;
use serde::Serialize;
use serde_json::Value;

const DOC_EXCERPT_CHARS: usize = 160;

/// JSON envelope written to stdout for every command
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Value>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl CommandResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            error: None,
            warnings: Vec::new(),
            data,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<Value>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            status: CommandStatus::Error,
            error: Some(ErrorEnvelope {
                code: classify_error(err).to_string(),
                message: format!("{err:#}"),
            }),
            warnings: Vec::new(),
            data: Value::Null,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
}

/// Stable machine-readable code for the first typed error in the chain
pub fn classify_error(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(store) = cause.downcast_ref::<StoreError>() {
            return store_code(store);
        }
        if let Some(indexer) = cause.downcast_ref::<IndexerError>() {
            return match indexer {
                IndexerError::Store(store) => store_code(store),
                IndexerError::InvalidPath(_) => "invalid_path",
                IndexerError::Cancelled => "cancelled",
                IndexerError::BudgetExceeded => "budget_exceeded",
                IndexerError::IoError(_) | IndexerError::Other(_) => "internal",
            };
        }
        if let Some(graph) = cause.downcast_ref::<GraphError>() {
            return match graph {
                GraphError::Store(store) => store_code(store),
                GraphError::Export(_) => "internal",
            };
        }
        if let Some(SearchError::Store(store)) = cause.downcast_ref::<SearchError>() {
            return store_code(store);
        }
    }
    "internal"
}

fn store_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::NotInitialized(_) => "not_initialized",
        StoreError::AlreadyInitialized(_) => "already_initialized",
        StoreError::StoreBusy(_) => "store_busy",
        StoreError::SchemaMismatch { .. } => "schema_mismatch",
        StoreError::NotFound(_) => "not_found",
        StoreError::Config(_) => "invalid_config",
        StoreError::Io(_) | StoreError::Serialization(_) => "internal",
    }
}

/// Symbol without its source text
#[derive(Debug, Clone, Serialize)]
pub struct SymbolSkeleton {
    pub id: String,
    pub kind: SymbolKind,
    pub name: String,
    pub file_path: String,
    pub range: SourceRange,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl From<&Symbol> for SymbolSkeleton {
    fn from(symbol: &Symbol) -> Self {
        Self {
            id: symbol.id.clone(),
            kind: symbol.kind,
            name: symbol.qualified_name.clone(),
            file_path: symbol.file_path.clone(),
            range: symbol.range,
            signature: symbol.headline().to_string(),
            doc: symbol.doc_excerpt(DOC_EXCERPT_CHARS),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Dependency {
    pub kind: EdgeKind,
    #[serde(flatten)]
    pub symbol: SymbolSkeleton,
}

#[derive(Debug, Serialize)]
pub struct ReadOutput {
    pub symbol: SymbolSkeleton,
    pub language: String,
    pub content_hash: String,
    pub source: String,
    pub children: Vec<SymbolSkeleton>,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Serialize)]
pub struct ImpactedSymbol {
    pub via: EdgeKind,
    #[serde(flatten)]
    pub symbol: SymbolSkeleton,
}

#[derive(Debug, Serialize)]
pub struct DepthGroup {
    pub depth: usize,
    pub symbols: Vec<ImpactedSymbol>,
}

#[derive(Debug, Serialize)]
pub struct ImpactsOutput {
    pub target: SymbolSkeleton,
    pub total: usize,
    pub direct: Vec<ImpactedSymbol>,
    pub cascade: Vec<DepthGroup>,
}

impl From<&ImpactReport> for ImpactsOutput {
    fn from(report: &ImpactReport) -> Self {
        let impacted = |entry: &context_graph::ImpactEntry| ImpactedSymbol {
            via: entry.via,
            symbol: SymbolSkeleton::from(&entry.symbol),
        };
        Self {
            target: SymbolSkeleton::from(&report.target),
            total: report.entries.len(),
            direct: report.direct().map(impacted).collect(),
            cascade: report
                .by_depth()
                .into_iter()
                .map(|(depth, entries)| DepthGroup {
                    depth,
                    symbols: entries.into_iter().map(impacted).collect(),
                })
                .collect(),
        }
    }
}
