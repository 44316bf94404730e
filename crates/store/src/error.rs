use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Context store not initialized at {0} (run `init` first)")]
    NotInitialized(String),

    #[error("Context store already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("Context store at {0} is locked by another indexing run")]
    StoreBusy(String),

    #[error("Unsupported snapshot version {found} (this build reads up to {supported})")]
    SchemaMismatch { found: u32, supported: u32 },

    #[error("Symbol not found: {0}")]
    NotFound(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
