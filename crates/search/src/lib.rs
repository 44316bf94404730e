//! Context routing: rank stored symbols against a free-text question.
//!
//! Keyword overlap over names, paths and docstrings gives the baseline; type
//! hints, proximity, centrality and fuzzy name similarity adjust it. Semantic
//! mode hands the top candidates to a [`SemanticReranker`] and falls back to
//! the baseline with a warning when it is unavailable.

mod error;
mod fuzzy;
mod rerank;
mod router;
mod scoring;

pub use error::{RerankError, Result, SearchError};
pub use fuzzy::FuzzyScorer;
pub use rerank::{RerankCandidate, SemanticReranker, UnavailableReranker};
pub use router::{
    search_project, ContextRouter, RouteOutcome, SearchHit, SearchQuery, SearchWarning,
    DEFAULT_LIMIT, DEFAULT_RERANK_TOP_K,
};
pub use scoring::{keyword_score, tokenize, QueryTerms};
