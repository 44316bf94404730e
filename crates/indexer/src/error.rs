use context_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid project path: {0}")]
    InvalidPath(String),

    #[error("Indexing cancelled; store left at its last committed state")]
    Cancelled,

    #[error("Index time budget exceeded; store left at its last committed state")]
    BudgetExceeded,

    #[error("{0}")]
    Other(String),
}
