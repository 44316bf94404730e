use context_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] serde_json::Error),
}

impl GraphError {
    /// Whether the requested symbol does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound(_)))
    }
}
