use context_extractor::EdgeKind;
use context_store::ContextStore;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// In-memory petgraph view of the stored symbol graph
pub struct SymbolGraph {
    /// Directed graph (symbol id -> symbol id, weighted by edge kind)
    graph: DiGraph<String, EdgeKind>,

    /// Symbol id -> NodeIndex mapping for fast lookup
    index: HashMap<String, NodeIndex>,
}

impl SymbolGraph {
    pub fn from_store(store: &ContextStore) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for symbol in store.all_symbols() {
            let idx = graph.add_node(symbol.id.clone());
            index.insert(symbol.id.clone(), idx);
        }
        for edge in store.all_edges() {
            if let (Some(&from), Some(&to)) = (index.get(&edge.from), index.get(&edge.to)) {
                graph.add_edge(from, to, edge.kind);
            }
        }
        Self { graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Symbols with a dependency edge pointing at `id`, sorted by id.
    /// Each dependent appears once, with the smallest edge kind linking it.
    pub fn dependents(&self, id: &str) -> Vec<(&str, EdgeKind)> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Symbols `id` depends on, sorted by id
    pub fn dependencies(&self, id: &str) -> Vec<(&str, EdgeKind)> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<(&str, EdgeKind)> {
        let Some(&node) = self.index.get(id) else {
            return Vec::new();
        };
        let mut found: Vec<(&str, EdgeKind)> = self
            .graph
            .edges_directed(node, direction)
            .filter(|edge| edge.weight().is_dependency())
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (self.graph[other].as_str(), *edge.weight())
            })
            .collect();
        found.sort();
        found.dedup_by(|a, b| a.0 == b.0);
        found
    }

    /// Number of distinct symbols depending on `id`
    pub fn in_degree(&self, id: &str) -> usize {
        self.dependents(id).len()
    }

    /// Dependency in-degree of every symbol that has at least one dependent
    pub fn in_degrees(&self) -> HashMap<String, usize> {
        self.graph
            .node_indices()
            .filter_map(|idx| {
                let id = self.graph[idx].as_str();
                let degree = self.in_degree(id);
                (degree > 0).then(|| (id.to_string(), degree))
            })
            .collect()
    }
}
