use context_extractor::{
    file_stem, module_path, Diagnostic, Edge, EdgeKind, PendingReference, Symbol, SymbolKind,
};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// Edges and notes produced for one batch of references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Sorted, deduplicated
    pub edges: Vec<Edge>,
    pub unresolved: Vec<Diagnostic>,
}

/// Resolves reference names to symbol ids across the whole project.
///
/// Resolution order for a name used by symbol `S` in file `F`:
/// 1. calls and inherits: a definition with that name inside `F`, preferring
///    the one sharing the longest enclosing scope with `S`;
/// 2. any definition in the project (imports may also name a module file),
///    preferring a match on the reference's module qualifier, then the
///    deepest shared directory with `F`, then the smallest file path, then
///    the smallest id.
///
/// Names with no candidate are reported as notes, never as errors.
pub struct DependencyLinker<'a> {
    symbols: HashMap<&'a str, &'a Symbol>,
    by_name: HashMap<&'a str, Vec<&'a Symbol>>,
    by_stem: HashMap<&'a str, Vec<&'a Symbol>>,
}

impl<'a> DependencyLinker<'a> {
    pub fn new(symbols: impl IntoIterator<Item = &'a Symbol>) -> Self {
        let mut linker = Self {
            symbols: HashMap::new(),
            by_name: HashMap::new(),
            by_stem: HashMap::new(),
        };
        for symbol in symbols {
            linker.symbols.insert(symbol.id.as_str(), symbol);
            match symbol.kind {
                SymbolKind::File => linker
                    .by_stem
                    .entry(file_stem(&symbol.file_path))
                    .or_default()
                    .push(symbol),
                _ => linker
                    .by_name
                    .entry(symbol.name.as_str())
                    .or_default()
                    .push(symbol),
            }
        }
        linker
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Resolve every reference; unresolved ones become notes
    pub fn link(&self, references: &[PendingReference]) -> LinkOutcome {
        let mut edges = BTreeSet::new();
        let mut unresolved = BTreeSet::new();
        for reference in references {
            match self.resolve(reference) {
                Some(target) => {
                    edges.insert(Edge::new(&reference.from, &target.id, reference.kind));
                }
                None => {
                    unresolved.insert(Diagnostic::unresolved(reference));
                }
            }
        }
        LinkOutcome {
            edges: edges.into_iter().collect(),
            unresolved: unresolved.into_iter().collect(),
        }
    }

    pub fn resolve(&self, reference: &PendingReference) -> Option<&'a Symbol> {
        let from = *self.symbols.get(reference.from.as_str())?;
        let name = reference.name.as_str();

        let mut candidates: Vec<&'a Symbol> = self.by_name.get(name).cloned().unwrap_or_default();
        if reference.kind == EdgeKind::Imports {
            if let Some(files) = self.by_stem.get(name) {
                candidates.extend(files.iter().copied());
            }
        }
        candidates.retain(|c| c.id != from.id);
        if reference.kind == EdgeKind::Inherits
            && candidates.iter().any(|c| c.kind == SymbolKind::Class)
        {
            candidates.retain(|c| c.kind == SymbolKind::Class);
        }
        if candidates.is_empty() {
            return None;
        }

        let qualifier = reference.qualifier.as_deref();

        if reference.kind != EdgeKind::Imports {
            let local = candidates
                .iter()
                .copied()
                .filter(|c| c.file_path == from.file_path)
                .min_by(|a, b| {
                    let rank = |c: &Symbol| {
                        (
                            !qualifier_matches(c, name, qualifier),
                            Reverse(shared_scope_depth(&from.qualified_name, &c.qualified_name)),
                        )
                    };
                    rank(*a).cmp(&rank(*b)).then_with(|| a.id.cmp(&b.id))
                });
            if local.is_some() {
                return local;
            }
        }

        candidates
            .into_iter()
            .filter(|c| reference.kind != EdgeKind::Imports || c.file_path != from.file_path)
            .min_by(|a, b| {
                let rank = |c: &Symbol| {
                    (
                        !qualifier_matches(c, name, qualifier),
                        Reverse(shared_dir_depth(&from.file_path, &c.file_path)),
                    )
                };
                rank(*a)
                    .cmp(&rank(*b))
                    .then_with(|| a.file_path.cmp(&b.file_path))
                    .then_with(|| a.id.cmp(&b.id))
            })
    }
}

/// `haystack` ends with `needle` on a `.` boundary
fn dotted_suffix(haystack: &str, needle: &str) -> bool {
    haystack == needle
        || haystack
            .strip_suffix(needle)
            .is_some_and(|rest| rest.ends_with('.'))
}

fn qualifier_matches(candidate: &Symbol, name: &str, qualifier: Option<&str>) -> bool {
    let Some(qualifier) = qualifier else {
        return false;
    };
    let module = module_path(&candidate.file_path);
    let location = match candidate.kind {
        SymbolKind::File => module.clone(),
        _ => format!("{module}.{}", candidate.qualified_name),
    };
    dotted_suffix(&location, &format!("{qualifier}.{name}")) || dotted_suffix(&module, qualifier)
}

fn shared_scope_depth(a: &str, b: &str) -> usize {
    a.split('.')
        .zip(b.split('.'))
        .take_while(|(x, y)| x == y)
        .count()
}

fn shared_dir_depth(a: &str, b: &str) -> usize {
    let dir = |p: &str| p.rsplit_once('/').map_or("", |(dir, _)| dir).to_string();
    let (a, b) = (dir(a), dir(b));
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    a.split('/')
        .zip(b.split('/'))
        .take_while(|(x, y)| x == y)
        .count()
}
