use crate::config::ExtractorConfig;
use crate::language::Language;
use crate::languages::parser_for;
use crate::parser::file_symbol;
use crate::types::{Diagnostic, Extraction};
use std::borrow::Cow;

/// Turns one source file into symbols, containment edges and pending references
#[derive(Debug, Clone, Default)]
pub struct SymbolExtractor {
    config: ExtractorConfig,
}

impl SymbolExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a file. `path` must already be project-relative with `/` separators.
    ///
    /// Never fails: unsupported input, oversized files, invalid UTF-8 and
    /// malformed constructs all come back as diagnostics on the result.
    pub fn extract(&self, path: &str, bytes: &[u8]) -> Extraction {
        let Some(language) = Language::from_path(path) else {
            return Extraction {
                path: path.to_string(),
                language: None,
                diagnostics: vec![Diagnostic::parse_degraded(
                    None,
                    format!("no parser for {path}"),
                )],
                ..Extraction::default()
            };
        };

        let text = String::from_utf8_lossy(bytes);

        if bytes.len() > self.config.max_file_bytes {
            log::debug!(
                "Skipping symbol extraction for large file {path} ({} bytes > {})",
                bytes.len(),
                self.config.max_file_bytes
            );
            return Extraction {
                path: path.to_string(),
                language: Some(language.as_str().to_string()),
                symbols: vec![file_symbol(path, &text, language)],
                diagnostics: vec![Diagnostic::parse_degraded(
                    None,
                    format!("file exceeds {} bytes; only the file symbol was kept", self.config.max_file_bytes),
                )],
                ..Extraction::default()
            };
        }

        let mut extraction = parser_for(language).extract(path, &text);
        if let Cow::Owned(_) = text {
            extraction.diagnostics.insert(
                0,
                Diagnostic::parse_degraded(None, "invalid UTF-8 replaced before parsing"),
            );
        }
        if !self.config.include_docstrings {
            for symbol in &mut extraction.symbols {
                symbol.docstring = None;
            }
        }

        log::debug!(
            "Extracted {} symbols, {} references from {path}",
            extraction.symbols.len(),
            extraction.references.len()
        );
        extraction
    }
}
