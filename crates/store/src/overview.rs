use crate::store::ContextStore;
use context_extractor::{DiagnosticKind, SymbolKind};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const HOTSPOT_LIMIT: usize = 10;

/// Project overview built from the stored graph
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStructure {
    pub generation: u64,
    pub totals: Totals,
    pub languages: BTreeMap<String, usize>,
    pub directories: Vec<DirectorySummary>,
    /// Most depended-upon symbols
    pub hotspots: Vec<Hotspot>,
    /// Files with parse notes from the last pass
    pub degraded_files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Totals {
    pub files: usize,
    pub symbols: usize,
    pub classes: usize,
    pub functions: usize,
    pub edges: usize,
    pub edges_by_kind: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectorySummary {
    /// `.` for the project root
    pub path: String,
    pub files: usize,
    pub classes: usize,
    pub functions: usize,
    /// Omitted in compact mode
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<FileSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub path: String,
    pub language: String,
    pub classes: Vec<String>,
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hotspot {
    pub id: String,
    pub dependents: usize,
}

impl ProjectStructure {
    pub fn build(store: &ContextStore, compact: bool) -> Self {
        let mut totals = Totals::default();
        let mut languages: BTreeMap<String, usize> = BTreeMap::new();
        let mut directories: BTreeMap<String, DirectorySummary> = BTreeMap::new();
        let mut degraded_files = Vec::new();

        for record in store.files() {
            totals.files += 1;
            *languages.entry(record.language.clone()).or_insert(0) += 1;
            if record
                .notes
                .iter()
                .any(|n| n.kind == DiagnosticKind::ParseDegraded)
            {
                degraded_files.push(record.path.clone());
            }

            let mut summary = FileSummary {
                path: record.path.clone(),
                language: record.language.clone(),
                classes: Vec::new(),
                functions: Vec::new(),
            };
            for symbol in store.list_by_file(&record.path) {
                match symbol.kind {
                    SymbolKind::Class => summary.classes.push(symbol.qualified_name.clone()),
                    SymbolKind::Function => summary.functions.push(symbol.qualified_name.clone()),
                    SymbolKind::File => {}
                }
            }

            let dir = match record.path.rsplit_once('/') {
                Some((dir, _)) => dir.to_string(),
                None => ".".to_string(),
            };
            let entry = directories
                .entry(dir.clone())
                .or_insert_with(|| DirectorySummary {
                    path: dir,
                    files: 0,
                    classes: 0,
                    functions: 0,
                    entries: Vec::new(),
                });
            entry.files += 1;
            entry.classes += summary.classes.len();
            entry.functions += summary.functions.len();
            totals.classes += summary.classes.len();
            totals.functions += summary.functions.len();
            if !compact {
                entry.entries.push(summary);
            }
        }

        totals.symbols = store.all_symbols().count();
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for edge in store.all_edges() {
            totals.edges += 1;
            *totals
                .edges_by_kind
                .entry(edge.kind.as_str().to_string())
                .or_insert(0) += 1;
            if edge.kind.is_dependency() {
                *in_degree.entry(edge.to.as_str()).or_insert(0) += 1;
            }
        }

        let mut hotspots: Vec<Hotspot> = in_degree
            .into_iter()
            .map(|(id, dependents)| Hotspot {
                id: id.to_string(),
                dependents,
            })
            .collect();
        hotspots.sort_by(|a, b| b.dependents.cmp(&a.dependents).then_with(|| a.id.cmp(&b.id)));
        hotspots.truncate(HOTSPOT_LIMIT);

        Self {
            generation: store.generation(),
            totals,
            languages,
            directories: directories.into_values().collect(),
            hotspots,
            degraded_files,
        }
    }
}
