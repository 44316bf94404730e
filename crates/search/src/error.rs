use context_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure reported by a semantic reranker.
///
/// Never escapes the router: it becomes a [`crate::SearchWarning`] and the
/// baseline ranking is returned instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RerankError {
    #[error("reranker unavailable: {0}")]
    Unavailable(String),

    #[error("reranker failed: {0}")]
    Failed(String),
}
