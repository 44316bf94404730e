use crate::report::{CommandResponse, Dependency, ImpactsOutput, ReadOutput, SymbolSkeleton};
use anyhow::{Context as AnyhowContext, Result};
use context_extractor::SymbolKind;
use context_graph::{ExportFormat, ImpactAnalyzer};
use context_indexer::{IndexOptions, ProjectIndexer};
use context_search::{search_project, SearchQuery, SemanticReranker, UnavailableReranker};
use context_store::{ContextStore, ProjectStructure};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub async fn init(root: &Path) -> Result<CommandResponse> {
    let store = ContextStore::init(root)
        .await
        .context("Failed to initialize context store")?;
    Ok(CommandResponse::ok(json!({
        "root": store.root().display().to_string(),
        "snapshot": context_store::snapshot_path(store.root()).display().to_string(),
        "generation": store.generation(),
    })))
}

pub async fn index(
    root: &Path,
    scope: Option<PathBuf>,
    max_seconds: Option<u64>,
) -> Result<CommandResponse> {
    let indexer = ProjectIndexer::new(root)
        .await
        .context("Failed to configure indexer")?;

    let mut options = IndexOptions::default();
    if let Some(scope) = scope {
        options = options.with_scope(scope);
    }
    if let Some(secs) = max_seconds {
        options = options.with_budget(Duration::from_secs(secs));
    }

    let stats = indexer.index_with(options).await.context("Index pass failed")?;
    let warnings = if stats.degraded > 0 {
        vec![json!({
            "kind": "parse_degraded",
            "files": stats.degraded,
        })]
    } else {
        Vec::new()
    };
    Ok(CommandResponse::ok(serde_json::to_value(&stats)?).with_warnings(warnings))
}

pub async fn structure(root: &Path, compact: bool) -> Result<CommandResponse> {
    let store = load(root).await?;
    let overview = ProjectStructure::build(&store, compact);
    Ok(CommandResponse::ok(serde_json::to_value(&overview)?))
}

pub struct SearchArgs {
    pub query: String,
    pub kind: Option<SymbolKind>,
    pub near: Option<String>,
    pub limit: usize,
    pub semantic: bool,
    pub output: Option<PathBuf>,
}

pub async fn search(root: &Path, args: SearchArgs) -> Result<CommandResponse> {
    let mut query = SearchQuery::new(args.query)
        .with_limit(args.limit)
        .semantic(args.semantic);
    if let Some(kind) = args.kind {
        query = query.with_kind(kind);
    }
    if let Some(near) = args.near {
        query = query.near(near);
    }

    // No semantic provider ships with the binary; semantic mode degrades
    let reranker: Arc<dyn SemanticReranker> = Arc::new(UnavailableReranker);
    let outcome = search_project(root, query, Some(reranker))
        .await
        .context("Search failed")?;

    let warnings = outcome
        .warnings
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let hits = serde_json::to_value(&outcome.hits)?;

    let data = match args.output {
        Some(path) => {
            let body = serde_json::to_string_pretty(&hits)?;
            tokio::fs::write(&path, body)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            json!({
                "written": path.display().to_string(),
                "count": outcome.hits.len(),
            })
        }
        None => json!({ "hits": hits }),
    };
    Ok(CommandResponse::ok(data).with_warnings(warnings))
}

pub async fn read(root: &Path, id: &str) -> Result<CommandResponse> {
    let store = load(root).await?;
    let symbol = store.get(id)?;
    let output = ReadOutput {
        symbol: SymbolSkeleton::from(symbol),
        language: symbol.language.clone(),
        content_hash: symbol.content_hash.clone(),
        source: symbol.source.clone(),
        children: store.children_of(id).map(SymbolSkeleton::from).collect(),
        dependencies: store
            .dependencies_of(id)
            .map(|(kind, target)| Dependency {
                kind,
                symbol: SymbolSkeleton::from(target),
            })
            .collect(),
    };
    Ok(CommandResponse::ok(serde_json::to_value(&output)?))
}

pub async fn impacts(root: &Path, id: &str, max_depth: Option<usize>) -> Result<CommandResponse> {
    let store = load(root).await?;
    let report = ImpactAnalyzer::new(&store).analyze(id, max_depth)?;
    Ok(CommandResponse::ok(serde_json::to_value(ImpactsOutput::from(&report))?))
}

/// Rendered graph text; JSON format is already a document of its own
pub async fn export(root: &Path, format: ExportFormat) -> Result<String> {
    let store = load(root).await?;
    Ok(context_graph::export(&store, format)?)
}

async fn load(root: &Path) -> Result<ContextStore> {
    Ok(ContextStore::load(root).await?)
}

/// clap value parser for `--type`
pub fn parse_kind(value: &str) -> std::result::Result<SymbolKind, String> {
    SymbolKind::parse(value)
        .ok_or_else(|| format!("unknown symbol type '{value}' (expected file, class or function)"))
}
