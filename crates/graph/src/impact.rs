use crate::error::Result;
use crate::graph::SymbolGraph;
use context_extractor::{EdgeKind, Symbol};
use context_store::ContextStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};

/// A symbol affected by a change to the target
#[derive(Debug, Clone, Serialize)]
pub struct ImpactEntry {
    pub symbol: Symbol,
    /// 1 for direct dependents
    pub depth: usize,
    /// Kind of the edge through which this symbol was reached
    pub via: EdgeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactReport {
    pub target: Symbol,
    /// Discovery order: breadth-first, neighbours sorted by id
    pub entries: Vec<ImpactEntry>,
}

impl ImpactReport {
    pub fn direct(&self) -> impl Iterator<Item = &ImpactEntry> {
        self.entries.iter().filter(|entry| entry.depth == 1)
    }

    pub fn by_depth(&self) -> BTreeMap<usize, Vec<&ImpactEntry>> {
        let mut grouped: BTreeMap<usize, Vec<&ImpactEntry>> = BTreeMap::new();
        for entry in &self.entries {
            grouped.entry(entry.depth).or_default().push(entry);
        }
        grouped
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.symbol.id.as_str()).collect()
    }
}

/// Computes direct and transitive dependents over reverse edges
pub struct ImpactAnalyzer<'a> {
    store: &'a ContextStore,
    graph: SymbolGraph,
}

impl<'a> ImpactAnalyzer<'a> {
    pub fn new(store: &'a ContextStore) -> Self {
        Self {
            store,
            graph: SymbolGraph::from_store(store),
        }
    }

    /// Breadth-first walk over incoming non-`contains` edges.
    ///
    /// Every id is expanded at most once, so cycles terminate and each symbol
    /// is reported once at its shortest depth. `max_depth` of `None` means
    /// unlimited.
    pub fn analyze(&self, id: &str, max_depth: Option<usize>) -> Result<ImpactReport> {
        let target = self.store.get(id)?;

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(target.id.as_str());
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        queue.push_back((target.id.as_str(), 0));
        let mut entries = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for (dependent, via) in self.graph.dependents(current) {
                if !visited.insert(dependent) {
                    continue;
                }
                let symbol = self.store.get(dependent)?.clone();
                entries.push(ImpactEntry {
                    symbol,
                    depth: depth + 1,
                    via,
                });
                queue.push_back((dependent, depth + 1));
            }
        }

        log::debug!("Impact of {id}: {} dependents", entries.len());
        Ok(ImpactReport {
            target: target.clone(),
            entries,
        })
    }
}
