use crate::error::{Result, StoreError};
use crate::paths::{context_dir_for_project_root, snapshot_path};
use crate::snapshot::{FileRecord, Snapshot};
use context_extractor::{Diagnostic, DiagnosticKind, Edge, EdgeKind, Symbol};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Persistent symbol graph for one project.
///
/// Commands bracket their work with [`ContextStore::load`] and
/// [`ContextStore::save`]; there is no shared in-process instance. Writers
/// must hold a [`crate::StoreLock`] while mutating and saving.
#[derive(Debug, Clone)]
pub struct ContextStore {
    root: PathBuf,
    snapshot: Snapshot,
}

impl ContextStore {
    /// Create an empty store under `root`
    pub async fn init(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let path = snapshot_path(&root);
        if tokio::fs::try_exists(&path).await? {
            return Err(StoreError::AlreadyInitialized(root.display().to_string()));
        }
        tokio::fs::create_dir_all(context_dir_for_project_root(&root)).await?;

        let store = Self {
            root,
            snapshot: Snapshot::default(),
        };
        store.save().await?;
        log::info!("Initialized context store at {}", path.display());
        Ok(store)
    }

    pub async fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let path = snapshot_path(&root);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotInitialized(root.display().to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let snapshot = Snapshot::decode(&bytes)?;
        log::debug!(
            "Loaded context snapshot generation {} ({} symbols, {} edges)",
            snapshot.generation,
            snapshot.symbols.len(),
            snapshot.edges.len()
        );
        Ok(Self { root, snapshot })
    }

    pub async fn exists(root: impl AsRef<Path>) -> bool {
        tokio::fs::try_exists(snapshot_path(root.as_ref()))
            .await
            .unwrap_or(false)
    }

    /// Atomically replace the stored snapshot.
    ///
    /// The temp file is flushed to disk before the rename, so a crash leaves
    /// either the previous snapshot or the complete new one.
    pub async fn save(&self) -> Result<()> {
        let path = snapshot_path(&self.root);
        let bytes = self.snapshot.encode()?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
        }
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    pub fn get(&self, id: &str) -> Result<&Symbol> {
        self.snapshot
            .symbols
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn contains_symbol(&self, id: &str) -> bool {
        self.snapshot.symbols.contains_key(id)
    }

    /// Symbols attributed to `path`, in extraction order
    pub fn list_by_file<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.snapshot
            .files
            .get(path)
            .into_iter()
            .flat_map(|record| record.symbol_ids.iter())
            .filter_map(|id| self.snapshot.symbols.get(id))
    }

    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.snapshot.symbols.values()
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.snapshot.edges.iter()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.snapshot.files.values()
    }

    pub fn file_record(&self, path: &str) -> Option<&FileRecord> {
        self.snapshot.files.get(path)
    }

    /// Edges whose source symbol belongs to `path`
    pub fn edges_for_file<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.snapshot.edges.iter().filter(move |edge| {
            self.snapshot
                .symbols
                .get(&edge.from)
                .is_some_and(|symbol| symbol.file_path == path)
        })
    }

    /// Direct `contains` children of a symbol
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.outgoing(id)
            .filter(|edge| edge.kind == EdgeKind::Contains)
            .filter_map(|edge| self.snapshot.symbols.get(&edge.to))
    }

    /// Non-`contains` targets of a symbol, with the edge kind
    pub fn dependencies_of<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = (EdgeKind, &'a Symbol)> + 'a {
        self.outgoing(id)
            .filter(|edge| edge.kind.is_dependency())
            .filter_map(|edge| {
                self.snapshot
                    .symbols
                    .get(&edge.to)
                    .map(|symbol| (edge.kind, symbol))
            })
    }

    fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        // Edges are ordered by `from` first, so a range scan finds them
        self.snapshot
            .edges
            .range(Edge::new(id, "", EdgeKind::Imports)..)
            .take_while(move |edge| edge.from == id)
    }

    /// Replace everything attributed to `record.path`.
    ///
    /// Old symbols of the file and edges leaving them are dropped, then the
    /// new symbols and edges are inserted. Edges from other files that pointed
    /// at removed symbols are left for [`ContextStore::prune_dangling_edges`].
    pub fn upsert_file(&mut self, mut record: FileRecord, symbols: Vec<Symbol>, edges: Vec<Edge>) {
        let mut owned: BTreeSet<String> = self.detach_file(&record.path);
        record.symbol_ids = symbols.iter().map(|s| s.id.clone()).collect();
        owned.extend(record.symbol_ids.iter().cloned());

        self.snapshot
            .edges
            .retain(|edge| !owned.contains(&edge.from));
        for symbol in symbols {
            self.snapshot.symbols.insert(symbol.id.clone(), symbol);
        }
        self.snapshot.edges.extend(edges);
        self.snapshot.files.insert(record.path.clone(), record);
    }

    /// Remove a file, its symbols and every edge touching them
    pub fn remove_file(&mut self, path: &str) -> bool {
        if !self.snapshot.files.contains_key(path) {
            return false;
        }
        let removed = self.detach_file(path);
        self.snapshot
            .edges
            .retain(|edge| !removed.contains(&edge.from) && !removed.contains(&edge.to));
        self.snapshot.files.remove(path);
        true
    }

    /// Swap the dependency edges leaving a file's symbols and its unresolved
    /// reference notes, leaving symbols and `contains` edges untouched.
    /// Returns `false` when the file is unknown.
    pub fn replace_dependencies(
        &mut self,
        path: &str,
        edges: Vec<Edge>,
        unresolved: Vec<Diagnostic>,
    ) -> bool {
        let Some(record) = self.snapshot.files.get_mut(path) else {
            return false;
        };
        record
            .notes
            .retain(|note| note.kind != DiagnosticKind::UnresolvedReference);
        record.notes.extend(unresolved);

        let owned: BTreeSet<&str> = record.symbol_ids.iter().map(String::as_str).collect();
        self.snapshot
            .edges
            .retain(|edge| !edge.kind.is_dependency() || !owned.contains(edge.from.as_str()));
        self.snapshot.edges.extend(
            edges
                .into_iter()
                .filter(|edge| edge.kind.is_dependency() && owned.contains(edge.from.as_str())),
        );
        true
    }

    /// Drop the file's symbols and return their ids
    fn detach_file(&mut self, path: &str) -> BTreeSet<String> {
        let Some(record) = self.snapshot.files.get(path) else {
            return BTreeSet::new();
        };
        let ids: BTreeSet<String> = record.symbol_ids.iter().cloned().collect();
        for id in &ids {
            self.snapshot.symbols.remove(id);
        }
        ids
    }

    /// Remove edges with a missing endpoint; returns how many were removed
    pub fn prune_dangling_edges(&mut self) -> usize {
        let before = self.snapshot.edges.len();
        let symbols = &self.snapshot.symbols;
        self.snapshot
            .edges
            .retain(|edge| symbols.contains_key(&edge.from) && symbols.contains_key(&edge.to));
        before - self.snapshot.edges.len()
    }

    pub fn bump_generation(&mut self) -> u64 {
        self.snapshot.generation += 1;
        self.snapshot.generation
    }
}
