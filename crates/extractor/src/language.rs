use crate::error::{ExtractorError, Result};
use std::path::Path;

/// Source languages with a symbol parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
}

/// Extensions the scanner should hand to the extractor
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "py", "pyw", "rs", "js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx", "go",
];

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" | "pyw" => Some(Self::Python),
            "rs" => Some(Self::Rust),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "go" => Some(Self::Go),
            _ => None,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Rust => "rust",
            Self::JavaScript => "javascript",
            Self::TypeScript | Self::Tsx => "typescript",
            Self::Go => "go",
        }
    }

    /// Get Tree-sitter grammar
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Go => tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Build a parser for this grammar
    pub fn parser(self) -> Result<tree_sitter::Parser> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.tree_sitter_language())
            .map_err(|e| {
                ExtractorError::tree_sitter(format!("failed to set {} grammar: {e}", self.as_str()))
            })?;
        Ok(parser)
    }
}

/// Whether the extractor understands this path
pub fn is_supported_path(path: impl AsRef<Path>) -> bool {
    Language::from_path(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_languages_by_extension() {
        assert_eq!(Language::from_path("a/b.py"), Some(Language::Python));
        assert_eq!(Language::from_path("lib.RS"), Some(Language::Rust));
        assert_eq!(Language::from_path("app.jsx"), Some(Language::JavaScript));
        assert_eq!(Language::from_path("view.tsx"), Some(Language::Tsx));
        assert_eq!(Language::from_path("cmd/server/main.go"), Some(Language::Go));
        assert_eq!(Language::from_path("README.md"), None);
        assert_eq!(Language::from_path("Makefile"), None);
    }

    #[test]
    fn supported_extensions_all_map_to_a_language() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(Language::from_extension(ext).is_some(), "{ext}");
        }
    }
}
