use crate::language::Language;
use crate::types::{
    content_hash, module_path, symbol_id, Diagnostic, Edge, EdgeKind, Extraction,
    PendingReference, SourceRange, Symbol, SymbolKind,
};
use std::collections::{BTreeMap, HashSet};
use tree_sitter::Node;

/// How the walker should treat a syntax node
pub enum Visit<'t> {
    /// The node defines a symbol
    Definition(Definition<'t>),
    /// The node opens a named scope (impl block, module) that qualifies nested
    /// definitions without being a symbol itself. `owner` names the kind of
    /// symbol that owns references made directly inside the scope.
    Scope {
        name: String,
        owner: Option<SymbolKind>,
    },
    /// Nothing special, keep walking
    Descend,
}

/// A definition found by a language parser
pub struct Definition<'t> {
    pub kind: SymbolKind,
    pub name: String,
    /// Node whose text becomes the symbol source
    pub span: Node<'t>,
    /// Body node; the signature is everything between `span` start and body start
    pub body: Option<Node<'t>>,
    /// Node carrying the docstring, when it differs from `span`
    pub doc_anchor: Option<Node<'t>>,
    /// Type that owns the definition although it is declared outside the
    /// type's body (Go methods). Qualifies the name and becomes the parent.
    pub receiver: Option<String>,
}

impl<'t> Definition<'t> {
    pub fn new(kind: SymbolKind, name: impl Into<String>, span: Node<'t>) -> Self {
        Self {
            kind,
            name: name.into(),
            span,
            body: None,
            doc_anchor: None,
            receiver: None,
        }
    }

    pub fn with_body(mut self, body: Option<Node<'t>>) -> Self {
        self.body = body;
        self
    }

    pub fn with_receiver(mut self, receiver: Option<String>) -> Self {
        self.receiver = receiver.filter(|r| !r.is_empty());
        self
    }
}

/// Reference collected from a node before its owner is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference {
    pub name: String,
    pub qualifier: Option<String>,
    pub kind: EdgeKind,
    pub line: usize,
}

impl RawReference {
    pub fn new(name: impl Into<String>, qualifier: Option<String>, kind: EdgeKind, node: Node<'_>) -> Self {
        Self {
            name: name.into(),
            qualifier: qualifier.filter(|q| !q.is_empty()),
            kind,
            line: node.start_position().row + 1,
        }
    }
}

/// Per-language symbol parser.
///
/// Implementations only classify nodes and pull reference names out of them;
/// the shared walker in [`SourceParser::extract`] handles scoping, ids,
/// containment, degraded constructs and duplicate detection.
pub trait SourceParser: Send + Sync {
    fn language(&self) -> Language;

    fn classify<'t>(&self, node: Node<'t>, src: &str) -> Visit<'t>;

    /// Push references made by `node` itself (not its children)
    fn references(&self, node: Node<'_>, src: &str, out: &mut Vec<RawReference>);

    fn docstring(&self, definition: &Definition<'_>, src: &str) -> Option<String>;

    /// Module-level documentation for the file symbol
    fn module_docstring(&self, _root: Node<'_>, _src: &str) -> Option<String> {
        None
    }

    /// Extract symbols and references from `src`
    fn extract(&self, path: &str, src: &str) -> Extraction {
        walk(self, path, src)
    }
}

struct Frame {
    prefix: String,
    /// Candidate owner ids, innermost first
    owners: Vec<String>,
}

struct PendingSymbol {
    symbol: Symbol,
    parents: Vec<String>,
}

struct OwnedReference {
    raw: RawReference,
    frame: usize,
}

fn walk<P: SourceParser + ?Sized>(parser: &P, path: &str, src: &str) -> Extraction {
    let language = parser.language();
    let file_id = symbol_id(SymbolKind::File, path, "");
    let mut extraction = Extraction {
        path: path.to_string(),
        language: Some(language.as_str().to_string()),
        ..Extraction::default()
    };

    let tree = match language.parser() {
        Ok(mut ts_parser) => ts_parser.parse(src, None),
        Err(err) => {
            extraction
                .diagnostics
                .push(Diagnostic::parse_degraded(None, err.to_string()));
            None
        }
    };

    let mut file_symbol = file_symbol(path, src, language);
    let Some(tree) = tree else {
        if extraction.diagnostics.is_empty() {
            extraction
                .diagnostics
                .push(Diagnostic::parse_degraded(None, "parser produced no tree"));
        }
        extraction.symbols.push(file_symbol);
        return extraction;
    };

    let root = tree.root_node();
    file_symbol.docstring = parser.module_docstring(root, src);

    let mut frames = vec![Frame {
        prefix: String::new(),
        owners: vec![file_id.clone()],
    }];
    let mut pending: Vec<PendingSymbol> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut references: Vec<OwnedReference> = Vec::new();
    let mut scratch = Vec::new();

    let mut stack: Vec<(Node<'_>, usize)> = vec![(root, 0)];
    while let Some((node, frame_idx)) = stack.pop() {
        let line = node.start_position().row + 1;
        let mut child_frame = frame_idx;

        match parser.classify(node, src) {
            Visit::Definition(def) => {
                if def.span.has_error() {
                    extraction.diagnostics.push(Diagnostic::parse_degraded(
                        Some(line),
                        format!("skipped malformed {} `{}`", def.kind, def.name),
                    ));
                    continue;
                }

                let frame = &frames[frame_idx];
                let mut parents = Vec::with_capacity(frame.owners.len() + 1);
                let scope = match &def.receiver {
                    Some(receiver) => {
                        let scope = join_qualified(&frame.prefix, receiver);
                        parents.push(symbol_id(SymbolKind::Class, path, &scope));
                        scope
                    }
                    None => frame.prefix.clone(),
                };
                parents.extend(frame.owners.iter().cloned());

                let qualified = join_qualified(&scope, &def.name);
                let id = symbol_id(def.kind, path, &qualified);
                let mut owners = Vec::with_capacity(parents.len() + 1);
                owners.push(id.clone());
                owners.extend(parents.iter().cloned());

                if seen.insert(id.clone()) {
                    let source = span_text(src, def.span).to_string();
                    let symbol = Symbol {
                        id: id.clone(),
                        kind: def.kind,
                        name: def.name.clone(),
                        qualified_name: qualified.clone(),
                        file_path: path.to_string(),
                        range: SourceRange::new(
                            def.span.start_position().row + 1,
                            def.span.end_position().row + 1,
                        ),
                        signature: signature(&def, src),
                        docstring: parser.docstring(&def, src).filter(|d| !d.is_empty()),
                        content_hash: content_hash(&source),
                        source,
                        language: language.as_str().to_string(),
                    };
                    pending.push(PendingSymbol { symbol, parents });
                } else {
                    extraction.diagnostics.push(Diagnostic::duplicate(line, &id));
                }

                frames.push(Frame {
                    prefix: qualified,
                    owners,
                });
                child_frame = frames.len() - 1;
            }
            Visit::Scope { name, owner } => {
                let frame = &frames[frame_idx];
                let qualified = join_qualified(&frame.prefix, &name);
                let mut owners = Vec::with_capacity(frame.owners.len() + 1);
                if let Some(kind) = owner {
                    owners.push(symbol_id(kind, path, &qualified));
                }
                owners.extend(frame.owners.iter().cloned());
                frames.push(Frame {
                    prefix: qualified,
                    owners,
                });
                child_frame = frames.len() - 1;
            }
            Visit::Descend => {
                if node.is_error() || node.is_missing() {
                    extraction.diagnostics.push(Diagnostic::parse_degraded(
                        Some(line),
                        format!("syntax error near line {line}"),
                    ));
                }
            }
        }

        scratch.clear();
        parser.references(node, src, &mut scratch);
        references.extend(scratch.drain(..).filter(|r| !r.name.is_empty()).map(|raw| {
            OwnedReference {
                raw,
                frame: child_frame,
            }
        }));

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push((child, child_frame));
        }
    }

    let emitted: HashSet<&str> = std::iter::once(file_id.as_str())
        .chain(pending.iter().map(|p| p.symbol.id.as_str()))
        .collect();
    let resolve = |candidates: &[String]| -> String {
        candidates
            .iter()
            .find(|id| emitted.contains(id.as_str()))
            .cloned()
            .unwrap_or_else(|| file_id.clone())
    };

    let mut contains = Vec::with_capacity(pending.len());
    for p in &pending {
        contains.push(Edge::new(resolve(&p.parents), &p.symbol.id, EdgeKind::Contains));
    }

    let mut deduped: BTreeMap<(String, String, Option<String>, EdgeKind), usize> = BTreeMap::new();
    for owned in references {
        let from = resolve(&frames[owned.frame].owners);
        let key = (from, owned.raw.name, owned.raw.qualifier, owned.raw.kind);
        deduped
            .entry(key)
            .and_modify(|line| *line = (*line).min(owned.raw.line))
            .or_insert(owned.raw.line);
    }

    extraction.symbols.push(file_symbol);
    extraction
        .symbols
        .extend(pending.into_iter().map(|p| p.symbol));
    extraction.contains = contains;
    extraction.references = deduped
        .into_iter()
        .map(|((from, name, qualifier, kind), line)| PendingReference {
            from,
            name,
            qualifier,
            kind,
            line,
        })
        .collect();
    extraction
}

/// File-level symbol covering the whole content
pub(crate) fn file_symbol(path: &str, src: &str, language: Language) -> Symbol {
    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    Symbol {
        id: symbol_id(SymbolKind::File, path, ""),
        kind: SymbolKind::File,
        name,
        qualified_name: module_path(path),
        file_path: path.to_string(),
        range: SourceRange::new(1, src.lines().count().max(1)),
        signature: None,
        docstring: None,
        content_hash: content_hash(src),
        source: src.to_string(),
        language: language.as_str().to_string(),
    }
}

fn join_qualified(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Text of a node, empty when the byte range is not valid for `src`
pub fn span_text<'s>(src: &'s str, node: Node<'_>) -> &'s str {
    src.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Text of a named field of `node`
pub fn field_text<'s>(src: &'s str, node: Node<'_>, field: &str) -> Option<&'s str> {
    node.child_by_field_name(field)
        .map(|child| span_text(src, child))
        .filter(|text| !text.is_empty())
}

const MAX_SIGNATURE_CHARS: usize = 240;

fn signature(def: &Definition<'_>, src: &str) -> Option<String> {
    let start = def.span.start_byte();
    let end = match def.body {
        Some(body) if body.start_byte() > start => body.start_byte(),
        _ => def.span.end_byte(),
    };
    let header = src.get(start..end)?;
    let collapsed = header.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .trim_end_matches(|c: char| c == '{' || c == ':' || c == ';' || c.is_whitespace())
        .to_string();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() > MAX_SIGNATURE_CHARS {
        return Some(trimmed.chars().take(MAX_SIGNATURE_CHARS).collect());
    }
    Some(trimmed)
}

/// Collect the comment block directly above `row` (0-indexed).
///
/// Lines accepted by `is_comment` are gathered upward until a blank or code
/// line; lines accepted by `is_attribute` (decorators, `#[...]`) are skipped.
/// `strip` removes comment markers from each kept line.
pub fn leading_comments(
    src: &str,
    row: usize,
    is_comment: impl Fn(&str) -> bool,
    is_attribute: impl Fn(&str) -> bool,
    strip: impl Fn(&str) -> &str,
) -> Option<String> {
    let lines: Vec<&str> = src.lines().collect();
    if row == 0 || row > lines.len() {
        return None;
    }

    let mut collected = Vec::new();
    let mut idx = row;
    while idx > 0 {
        idx -= 1;
        let line = lines[idx].trim();
        if is_comment(line) {
            collected.push(strip(line).trim());
        } else if is_attribute(line) && collected.is_empty() {
            continue;
        } else {
            break;
        }
    }

    collected.reverse();
    let text = collected
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!text.is_empty()).then_some(text)
}

/// Normalize a `::`, `/` or `.` separated module path into dotted form,
/// dropping relative markers (`crate`, `self`, `super`, `.`, `..`) and a
/// trailing source extension.
pub fn normalize_module_path(raw: &str) -> String {
    let raw = raw.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`');
    let raw = match raw.rsplit_once('.') {
        Some((stem, ext)) if crate::language::Language::from_extension(ext).is_some() => stem,
        _ => raw,
    };
    raw.split(|c| c == '/' || c == '.' || c == ':')
        .filter(|segment| {
            !segment.is_empty() && !matches!(*segment, "crate" | "self" | "super" | "@")
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a dotted module path into (last segment, parent path)
pub fn split_module(dotted: &str) -> Option<(String, Option<String>)> {
    if dotted.is_empty() {
        return None;
    }
    match dotted.rsplit_once('.') {
        Some((parent, last)) => Some((last.to_string(), Some(parent.to_string()))),
        None => Some((dotted.to_string(), None)),
    }
}
