use crate::error::RerankError;
use async_trait::async_trait;

/// Text handed to a reranker for one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerankCandidate {
    pub id: String,
    /// Signature, doc excerpt and path joined into one line
    pub text: String,
}

/// External similarity scorer used by semantic mode.
///
/// Implementations return one score per candidate, in candidate order; higher
/// is more similar. Any error, or a score list of the wrong length, makes the
/// router fall back to the keyword ranking with a warning.
#[async_trait]
pub trait SemanticReranker: Send + Sync {
    fn name(&self) -> &str;

    async fn score(
        &self,
        query: &str,
        candidates: &[RerankCandidate],
    ) -> Result<Vec<f32>, RerankError>;
}

/// Stand-in used when no semantic provider is configured
#[derive(Debug, Clone, Default)]
pub struct UnavailableReranker;

#[async_trait]
impl SemanticReranker for UnavailableReranker {
    fn name(&self) -> &str {
        "none"
    }

    async fn score(
        &self,
        _query: &str,
        _candidates: &[RerankCandidate],
    ) -> Result<Vec<f32>, RerankError> {
        Err(RerankError::Unavailable(
            "no semantic provider configured".to_string(),
        ))
    }
}

/// Order `0..len` by reranker score, highest first; ties keep baseline order
pub(crate) fn rerank_order(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    order
}

pub(crate) fn validate_scores(scores: &[f32], expected: usize) -> Result<(), RerankError> {
    if scores.len() != expected {
        return Err(RerankError::Failed(format!(
            "expected {expected} scores, got {}",
            scores.len()
        )));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(RerankError::Failed("non-finite score".to_string()));
    }
    Ok(())
}
