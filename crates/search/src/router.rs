use crate::error::Result;
use crate::fuzzy::FuzzyScorer;
use crate::rerank::{rerank_order, validate_scores, RerankCandidate, SemanticReranker};
use crate::scoring::{keyword_score, QueryTerms};
use context_extractor::{SourceRange, Symbol, SymbolKind};
use context_graph::SymbolGraph;
use context_store::{ContextStore, ProjectConfig};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

const TYPE_BOOST: f32 = 2.0;
const SAME_FILE_BOOST: f32 = 1.0;
const SAME_DIR_BOOST: f32 = 0.5;
const MATCHING_FILE_BOOST: f32 = 0.5;
const CENTRALITY_WEIGHT: f32 = 0.5;
const FUZZY_WEIGHT: f32 = 0.5;
const DOC_EXCERPT_CHARS: usize = 160;

pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_RERANK_TOP_K: usize = 50;

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,

    /// Symbols of this kind rank higher; others are not removed
    pub kind: Option<SymbolKind>,

    /// File the caller is working in; nearby symbols rank higher
    pub near: Option<String>,

    pub limit: usize,

    pub semantic: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            near: None,
            limit: DEFAULT_LIMIT,
            semantic: false,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: SymbolKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn near(mut self, path: impl Into<String>) -> Self {
        self.near = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn semantic(mut self, semantic: bool) -> Self {
        self.semantic = semantic;
        self
    }
}

/// Symbol skeleton returned by search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub kind: SymbolKind,
    pub name: String,
    pub file_path: String,
    pub range: SourceRange,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Keyword score plus boosts
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_score: Option<f32>,
}

impl SearchHit {
    fn from_symbol(symbol: &Symbol, score: f32) -> Self {
        Self {
            id: symbol.id.clone(),
            kind: symbol.kind,
            name: symbol.qualified_name.clone(),
            file_path: symbol.file_path.clone(),
            range: symbol.range,
            signature: symbol.headline().to_string(),
            doc: symbol.doc_excerpt(DOC_EXCERPT_CHARS),
            score,
            semantic_score: None,
        }
    }
}

/// Recovered problems surfaced alongside results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchWarning {
    RerankUnavailable { reason: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteOutcome {
    pub hits: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SearchWarning>,
}

/// Ranks stored symbols against a free-text query.
///
/// Baseline score, for symbols with a non-zero keyword score only:
/// keyword overlap + type boost + proximity + `0.5 * ln(1 + in-degree)` +
/// fuzzy name similarity. Results are ordered by descending score, then id.
pub struct ContextRouter<'a> {
    store: &'a ContextStore,
    in_degrees: HashMap<String, usize>,
    reranker: Option<Arc<dyn SemanticReranker>>,
    rerank_top_k: usize,
}

impl<'a> ContextRouter<'a> {
    pub fn new(store: &'a ContextStore) -> Self {
        Self {
            store,
            in_degrees: SymbolGraph::from_store(store).in_degrees(),
            reranker: None,
            rerank_top_k: DEFAULT_RERANK_TOP_K,
        }
    }

    #[must_use]
    pub fn with_reranker(mut self, reranker: Arc<dyn SemanticReranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    #[must_use]
    pub fn with_rerank_top_k(mut self, top_k: usize) -> Self {
        self.rerank_top_k = top_k.max(1);
        self
    }

    /// Keyword ranking of every matching symbol, best first
    pub fn baseline(&self, query: &SearchQuery) -> Vec<(&'a Symbol, f32)> {
        let terms = QueryTerms::parse(&query.text);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut matched: Vec<(&'a Symbol, f32)> = self
            .store
            .all_symbols()
            .map(|symbol| (symbol, keyword_score(&terms, symbol)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        let matching_files: HashSet<&str> = matched
            .iter()
            .filter(|(symbol, _)| symbol.kind == SymbolKind::File)
            .map(|(symbol, _)| symbol.file_path.as_str())
            .collect();

        // File symbols still feed the matching-file boost before the filter
        if let Some(kind) = query.kind {
            matched.retain(|(symbol, _)| symbol.kind == kind);
        }

        let mut fuzzy = FuzzyScorer::new();
        let similarity =
            fuzzy.score_names(&query.text, matched.iter().map(|(s, _)| s.name.as_str()));

        for ((symbol, score), similarity) in matched.iter_mut().zip(similarity) {
            if query.kind == Some(symbol.kind) {
                *score += TYPE_BOOST;
            }
            *score += proximity(symbol, query.near.as_deref());
            if symbol.kind != SymbolKind::File && matching_files.contains(symbol.file_path.as_str()) {
                *score += MATCHING_FILE_BOOST;
            }
            let in_degree = self.in_degrees.get(&symbol.id).copied().unwrap_or(0);
            *score += CENTRALITY_WEIGHT * (1.0 + in_degree as f32).ln();
            *score += FUZZY_WEIGHT * similarity;
        }

        matched.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        matched
    }

    /// Baseline ranking, optionally reordered by the semantic reranker.
    ///
    /// Only the top `rerank_top_k` baseline hits are reranked; the rest keep
    /// their baseline order after them.
    pub async fn route(&self, query: &SearchQuery) -> RouteOutcome {
        let ranked = self.baseline(query);
        let mut hits: Vec<SearchHit> = ranked
            .iter()
            .map(|(symbol, score)| SearchHit::from_symbol(symbol, *score))
            .collect();
        let mut warnings = Vec::new();

        if query.semantic && !hits.is_empty() {
            match self.rerank(&query.text, &mut hits).await {
                Ok(()) => {}
                Err(reason) => {
                    log::warn!("Semantic rerank unavailable, using keyword ranking: {reason}");
                    warnings.push(SearchWarning::RerankUnavailable { reason });
                }
            }
        }

        hits.truncate(query.limit);
        log::debug!("Query {:?}: {} hits", query.text, hits.len());
        RouteOutcome { hits, warnings }
    }

    async fn rerank(&self, query: &str, hits: &mut Vec<SearchHit>) -> std::result::Result<(), String> {
        let Some(reranker) = self.reranker.as_ref() else {
            return Err("no semantic reranker configured".to_string());
        };

        let top_k = self.rerank_top_k.min(hits.len());
        let candidates: Vec<RerankCandidate> = hits[..top_k]
            .iter()
            .map(|hit| RerankCandidate {
                id: hit.id.clone(),
                text: candidate_text(hit),
            })
            .collect();

        let scores = reranker
            .score(query, &candidates)
            .await
            .and_then(|scores| validate_scores(&scores, top_k).map(|()| scores))
            .map_err(|err| format!("{}: {err}", reranker.name()))?;

        let head: Vec<SearchHit> = hits.drain(..top_k).collect();
        let mut reordered: Vec<SearchHit> = rerank_order(&scores)
            .into_iter()
            .map(|idx| {
                let mut hit = head[idx].clone();
                hit.semantic_score = Some(scores[idx]);
                hit
            })
            .collect();
        reordered.append(hits);
        *hits = reordered;
        Ok(())
    }
}

fn candidate_text(hit: &SearchHit) -> String {
    match &hit.doc {
        Some(doc) => format!("{} {} ({})", hit.signature, doc, hit.file_path),
        None => format!("{} ({})", hit.signature, hit.file_path),
    }
}

fn proximity(symbol: &Symbol, near: Option<&str>) -> f32 {
    let Some(near) = near else {
        return 0.0;
    };
    if symbol.file_path == near {
        return SAME_FILE_BOOST;
    }
    if parent_dir(&symbol.file_path) == parent_dir(near) {
        return SAME_DIR_BOOST;
    }
    0.0
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Load the store under `root` and run one query with the project's search
/// settings. `query.limit` of zero means the configured default.
pub async fn search_project(
    root: &Path,
    mut query: SearchQuery,
    reranker: Option<Arc<dyn SemanticReranker>>,
) -> Result<RouteOutcome> {
    let store = ContextStore::load(root).await?;
    let config = ProjectConfig::load(root).await?;
    if query.limit == 0 {
        query.limit = config.search.limit;
    }

    let mut router = ContextRouter::new(&store).with_rerank_top_k(config.search.rerank_top_k);
    if let Some(reranker) = reranker {
        router = router.with_reranker(reranker);
    }
    Ok(router.route(&query).await)
}
