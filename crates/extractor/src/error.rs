use thiserror::Error;

/// Result type for extractor setup
pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Errors raised while preparing a parser. Extraction itself never fails;
/// these are converted into diagnostics by [`crate::SymbolExtractor`].
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Unsupported language
    #[error("Unsupported language for {0}")]
    UnsupportedLanguage(String),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl ExtractorError {
    /// Create an unsupported language error
    pub fn unsupported_language(path: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(path.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
