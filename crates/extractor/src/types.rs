use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Kind of an indexed code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    File,
    Class,
    Function,
}

impl SymbolKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Class => "class",
            Self::Function => "function",
        }
    }

    /// Parse a kind tag, accepting a few common aliases
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "file" | "module" => Some(Self::File),
            "class" | "struct" | "interface" | "trait" | "type" => Some(Self::Class),
            "function" | "fn" | "method" | "func" => Some(Self::Function),
            _ => None,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line span of a symbol (1-indexed, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_line: usize,
    pub end_line: usize,
}

impl SourceRange {
    #[must_use]
    pub const fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// A uniquely identified code unit (file, class or function)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// `<kind>:<path>[:<qualified_name>]`
    pub id: String,

    pub kind: SymbolKind,

    /// Simple name (e.g. `login`)
    pub name: String,

    /// Dotted name including enclosing scopes (e.g. `Service.login`)
    pub qualified_name: String,

    /// Project-relative path with `/` separators
    pub file_path: String,

    pub range: SourceRange,

    /// Declaration header for classes and functions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,

    /// SHA-256 of `source`
    pub content_hash: String,

    /// Exact source span of the symbol
    pub source: String,

    pub language: String,
}

impl Symbol {
    /// Short description used in listings: signature when known, name otherwise
    pub fn headline(&self) -> &str {
        self.signature.as_deref().unwrap_or(&self.name)
    }

    /// First non-empty docstring line, truncated to `max_chars`
    pub fn doc_excerpt(&self, max_chars: usize) -> Option<String> {
        let line = self
            .docstring
            .as_deref()?
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())?;
        if line.chars().count() <= max_chars {
            return Some(line.to_string());
        }
        let mut out: String = line.chars().take(max_chars).collect();
        out.push_str("...");
        Some(out)
    }
}

/// Relationship between two symbols
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Imports,
    Calls,
    Inherits,
    Contains,
}

impl EdgeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Imports => "imports",
            Self::Calls => "calls",
            Self::Inherits => "inherits",
            Self::Contains => "contains",
        }
    }

    /// Whether this edge makes `from` depend on `to`
    pub const fn is_dependency(self) -> bool {
        !matches!(self, Self::Contains)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed edge `from -> to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }
}

/// A reference by name that still has to be resolved to a symbol id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PendingReference {
    /// Id of the symbol that uses the name
    pub from: String,

    pub name: String,

    /// Dotted module path or receiver (`inventory`, `auth.session`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,

    pub kind: EdgeKind,

    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A construct could not be parsed and was skipped
    ParseDegraded,
    /// A second definition produced an id that already exists
    DuplicateSymbol,
    /// A referenced name did not match any symbol
    UnresolvedReference,
}

/// Non-fatal note attached to a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn parse_degraded(line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::ParseDegraded,
            line,
            message: message.into(),
        }
    }

    pub fn duplicate(line: usize, id: &str) -> Self {
        Self {
            kind: DiagnosticKind::DuplicateSymbol,
            line: Some(line),
            message: format!("duplicate definition of {id}; keeping the first one"),
        }
    }

    pub fn unresolved(reference: &PendingReference) -> Self {
        let target = match &reference.qualifier {
            Some(qualifier) => format!("{qualifier}.{}", reference.name),
            None => reference.name.clone(),
        };
        Self {
            kind: DiagnosticKind::UnresolvedReference,
            line: Some(reference.line),
            message: format!("unresolved {} reference `{target}`", reference.kind),
        }
    }
}

/// Result of extracting one file. Never an error: failures become diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub path: String,
    /// Language tag, `None` when the path is not a supported source file
    pub language: Option<String>,
    /// File symbol first, then definitions in source order
    pub symbols: Vec<Symbol>,
    pub contains: Vec<Edge>,
    pub references: Vec<PendingReference>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn file_symbol(&self) -> Option<&Symbol> {
        self.symbols.first().filter(|s| s.kind == SymbolKind::File)
    }

    pub fn is_degraded(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ParseDegraded)
    }
}

/// Build a symbol id. File symbols have no name component.
pub fn symbol_id(kind: SymbolKind, path: &str, qualified_name: &str) -> String {
    match kind {
        SymbolKind::File => format!("file:{path}"),
        _ => format!("{kind}:{path}:{qualified_name}"),
    }
}

/// Hex SHA-256 digest
pub fn content_hash(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    format!("{:x}", hasher.finalize())
}

/// Dotted module path of a file: `src/auth/login.py` -> `src.auth.login`
pub fn module_path(file_path: &str) -> String {
    let without_ext = match file_path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && !stem.is_empty() => stem,
        _ => file_path,
    };
    without_ext.trim_matches('/').replace('/', ".")
}

/// File name without extension
pub fn file_stem(file_path: &str) -> &str {
    let name = file_path.rsplit('/').next().unwrap_or(file_path);
    match name.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ids_are_derived_from_kind_path_and_name() {
        assert_eq!(symbol_id(SymbolKind::File, "a.py", "ignored"), "file:a.py");
        assert_eq!(
            symbol_id(SymbolKind::Function, "src/a.py", "Service.login"),
            "function:src/a.py:Service.login"
        );
    }

    #[test]
    fn module_path_and_stem() {
        assert_eq!(module_path("src/auth/login.py"), "src.auth.login");
        assert_eq!(module_path("Makefile"), "Makefile");
        assert_eq!(file_stem("src/auth/login.test.ts"), "login");
        assert_eq!(file_stem("lib.rs"), "lib");
    }

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn doc_excerpt_takes_first_line() {
        let symbol = Symbol {
            id: "function:a.py:f".into(),
            kind: SymbolKind::Function,
            name: "f".into(),
            qualified_name: "f".into(),
            file_path: "a.py".into(),
            range: SourceRange::new(1, 2),
            signature: None,
            docstring: Some("\n  Validate credentials.\nMore.".into()),
            content_hash: String::new(),
            source: String::new(),
            language: "python".into(),
        };
        assert_eq!(symbol.doc_excerpt(80).as_deref(), Some("Validate credentials."));
        assert_eq!(symbol.doc_excerpt(8).as_deref(), Some("Validate..."));
        assert_eq!(symbol.headline(), "f");
    }
}
