use crate::error::Result;
use context_extractor::{Edge, SourceRange, SymbolKind};
use context_store::ContextStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Mermaid,
    Json,
}

impl ExportFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format '{other}' (expected mermaid or json)")),
        }
    }
}

pub fn export(store: &ContextStore, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Mermaid => Ok(export_mermaid(store)),
        ExportFormat::Json => export_json(store),
    }
}

/// Dependency edges as a Mermaid flowchart.
///
/// Only symbols touching an `imports`/`calls`/`inherits` edge are drawn;
/// `contains` edges are structural and left out.
pub fn export_mermaid(store: &ContextStore) -> String {
    let edges: Vec<&Edge> = store
        .all_edges()
        .filter(|edge| edge.kind.is_dependency())
        .collect();
    let endpoints: BTreeSet<&str> = edges
        .iter()
        .flat_map(|edge| [edge.from.as_str(), edge.to.as_str()])
        .collect();

    let mut lines = vec!["graph LR".to_string()];
    let mut node_ids: BTreeMap<&str, String> = BTreeMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    for id in endpoints {
        let node = unique_node_id(id, &mut taken);
        let (label, class) = match store.get(id) {
            Ok(symbol) if symbol.kind == SymbolKind::File => (symbol.file_path.clone(), "file"),
            Ok(symbol) => (
                format!("{}::{}", symbol.file_path, symbol.qualified_name),
                symbol.kind.as_str(),
            ),
            Err(_) => (id.to_string(), "missing"),
        };
        lines.push(format!("    {node}[\"{}\"]:::{class}", escape_label(&label)));
        node_ids.insert(id, node);
    }

    for edge in edges {
        if let (Some(from), Some(to)) = (node_ids.get(edge.from.as_str()), node_ids.get(edge.to.as_str())) {
            lines.push(format!("    {from} -->|{}| {to}", edge.kind.as_str()));
        }
    }

    lines.push("    classDef file fill:#eef,stroke:#88a".to_string());
    lines.push("    classDef class fill:#efe,stroke:#8a8".to_string());
    lines.push("    classDef function fill:#ffe,stroke:#aa8".to_string());
    lines.join("\n")
}

fn mermaid_safe(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn unique_node_id(id: &str, taken: &mut HashSet<String>) -> String {
    let base = mermaid_safe(id);
    let mut candidate = base.clone();
    let mut suffix = 1;
    while !taken.insert(candidate.clone()) {
        suffix += 1;
        candidate = format!("{base}_{suffix}");
    }
    candidate
}

fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;")
}

#[derive(Debug, Serialize)]
struct GraphDocument<'a> {
    generation: u64,
    nodes: Vec<GraphNode<'a>>,
    edges: Vec<&'a Edge>,
}

#[derive(Debug, Serialize)]
struct GraphNode<'a> {
    id: &'a str,
    kind: SymbolKind,
    name: &'a str,
    qualified_name: &'a str,
    file_path: &'a str,
    range: SourceRange,
}

/// Whole graph (all symbols and edges, `contains` included) as pretty JSON
pub fn export_json(store: &ContextStore) -> Result<String> {
    let document = GraphDocument {
        generation: store.generation(),
        nodes: store
            .all_symbols()
            .map(|symbol| GraphNode {
                id: &symbol.id,
                kind: symbol.kind,
                name: &symbol.name,
                qualified_name: &symbol.qualified_name,
                file_path: &symbol.file_path,
                range: symbol.range,
            })
            .collect(),
        edges: store.all_edges().collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_extractor::{EdgeKind, SymbolExtractor};
    use context_store::FileRecord;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    async fn sample_store() -> (tempfile::TempDir, ContextStore) {
        let temp = tempdir().unwrap();
        let mut store = ContextStore::init(temp.path()).await.unwrap();
        for (path, src, extra) in [
            ("a.py", "def foo():\n    pass\n", None),
            (
                "b.py",
                "class Runner:\n    def bar(self):\n        pass\n",
                Some(Edge::new("function:b.py:Runner.bar", "function:a.py:foo", EdgeKind::Calls)),
            ),
        ] {
            let extraction = SymbolExtractor::default().extract(path, src.as_bytes());
            let record = FileRecord {
                path: path.to_string(),
                content_hash: String::new(),
                last_indexed_at: 0,
                symbol_ids: Vec::new(),
                language: "python".to_string(),
                references: Vec::new(),
                notes: Vec::new(),
            };
            let mut edges = extraction.contains;
            edges.extend(extra);
            store.upsert_file(record, extraction.symbols, edges);
        }
        (temp, store)
    }

    #[tokio::test]
    async fn mermaid_draws_dependency_edges_only() {
        let (_temp, store) = sample_store().await;
        let chart = export_mermaid(&store);
        assert!(chart.starts_with("graph LR"));
        assert!(chart.contains("function_b_py_Runner_bar -->|calls| function_a_py_foo"));
        assert!(chart.contains("[\"a.py::foo\"]:::function"));
        assert!(!chart.contains("contains"));
        assert!(!chart.contains("class_b_py_Runner["));
    }

    #[test]
    fn colliding_node_ids_get_suffixes() {
        let mut taken = HashSet::new();
        assert_eq!(unique_node_id("file:a-b.py", &mut taken), "file_a_b_py");
        assert_eq!(unique_node_id("file:a_b.py", &mut taken), "file_a_b_py_2");
    }

    #[tokio::test]
    async fn json_lists_every_symbol_and_edge() {
        let (_temp, store) = sample_store().await;
        let raw = export_json(&store).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 5);
        let kinds: Vec<&str> = value["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|edge| edge["kind"].as_str().unwrap())
            .collect();
        assert!(kinds.contains(&"calls"));
        assert!(kinds.contains(&"contains"));
        assert!(value["nodes"][0].get("source").is_none());
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("mermaid".parse::<ExportFormat>(), Ok(ExportFormat::Mermaid));
        assert!("dot".parse::<ExportFormat>().is_err());
    }
}
