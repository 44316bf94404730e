use crate::cancel::CancelFlag;
use crate::error::{IndexerError, Result};
use crate::limits::resolve_index_concurrency;
use crate::scanner::{FileScanner, ScanOptions};
use crate::stats::IndexStats;
use context_extractor::{
    content_hash, Diagnostic, Edge, Extraction, ExtractorConfig, SymbolExtractor,
};
use context_graph::DependencyLinker;
use context_store::{
    normalize_relative, ContextStore, FileRecord, ProjectConfig, StoreError, StoreLock,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Per-pass knobs
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Restrict scanning and removal to this subtree of the root
    pub scope: Option<PathBuf>,

    pub cancel: Option<CancelFlag>,

    /// Best-effort wall-clock limit, checked between batches and before commit
    pub deadline: Option<Instant>,
}

impl IndexOptions {
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<PathBuf>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub fn with_budget(mut self, max_duration: Duration) -> Self {
        self.deadline = Some(Instant::now() + max_duration);
        self
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Err(IndexerError::Cancelled);
        }
        check_budget(self.deadline)
    }
}

enum FileOutcome {
    Unchanged(String),
    Extracted {
        relative_path: String,
        hash: String,
        extraction: Extraction,
    },
}

/// Walks a project and brings its context store up to date.
///
/// Only files whose content hash differs from the stored record are parsed.
/// Whenever anything changed, the stored references of every file are
/// re-linked against the full symbol table, so an incremental pass yields
/// the same graph as a rebuild from scratch.
pub struct ProjectIndexer {
    root: PathBuf,
    config: ProjectConfig,
    extractor: Arc<SymbolExtractor>,
    concurrency: usize,
}

impl ProjectIndexer {
    /// Create an indexer for `root`, reading its project config
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = canonical_root(root.as_ref()).await?;
        let config = ProjectConfig::load(&root).await?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        let extractor = SymbolExtractor::new(ExtractorConfig {
            max_file_bytes: usize::try_from(config.index.max_file_bytes).unwrap_or(usize::MAX),
            ..ExtractorConfig::default()
        });
        let concurrency = resolve_index_concurrency(config.index.concurrency);
        Self {
            root: root.into(),
            config,
            extractor: Arc::new(extractor),
            concurrency,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Index the whole project
    pub async fn index(&self) -> Result<IndexStats> {
        self.index_with(IndexOptions::default()).await
    }

    /// Run one pass.
    ///
    /// Cancellation and budget are cooperative. When either trips, nothing is
    /// saved and the store keeps its last committed snapshot.
    pub async fn index_with(&self, options: IndexOptions) -> Result<IndexStats> {
        let start = Instant::now();
        let mut stats = IndexStats::new();

        // Report a missing store before touching the lock file
        if !ContextStore::exists(&self.root).await {
            return Err(StoreError::NotInitialized(self.root.display().to_string()).into());
        }
        let _write_lock = StoreLock::acquire(&self.root).await?;
        let mut store = ContextStore::load(&self.root).await?;
        log::info!("Indexing project at {}", self.root.display());

        let scope = self.resolve_scope(options.scope.as_deref()).await?;
        let scope_prefix = scope
            .as_deref()
            .map(|dir| normalize_relative(&self.root, dir))
            .filter(|prefix| !prefix.is_empty());
        options.checkpoint()?;

        // 1. Scan
        let files = FileScanner::new(&self.root)
            .with_options(ScanOptions {
                exclude: self.config.index.exclude.clone(),
                scope,
            })
            .scan();
        stats.scanned = files.len();
        let live_files: HashSet<String> = files.iter().map(|p| self.normalize_path(p)).collect();

        // 2. Hash every file, extract the changed ones
        let outcomes = self.process_files_parallel(&files, &store, &options).await?;
        let mut changed = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(FileOutcome::Unchanged(path)) => {
                    log::debug!("Unchanged: {path}");
                    stats.unchanged += 1;
                }
                Ok(FileOutcome::Extracted {
                    relative_path,
                    hash,
                    extraction,
                }) => {
                    stats.add_extracted(
                        extraction.language.as_deref().unwrap_or("unknown"),
                        extraction.is_degraded(),
                    );
                    for note in &extraction.diagnostics {
                        log::debug!("{relative_path}: {}", note.message);
                    }
                    changed.push((relative_path, hash, extraction));
                }
                Err(err) => {
                    log::warn!("{err}");
                    stats.add_error(err);
                }
            }
        }

        // 3. Removed files, limited to the scanned subtree
        let removed: Vec<String> = store
            .files()
            .map(|record| record.path.clone())
            .filter(|path| in_scope(path, scope_prefix.as_deref()) && !live_files.contains(path))
            .collect();

        options.checkpoint()?;

        if changed.is_empty() && removed.is_empty() {
            log::info!("No changes detected");
        } else {
            let indexed_at = unix_now();
            for (relative_path, hash, extraction) in changed {
                let record = FileRecord {
                    path: relative_path,
                    content_hash: hash,
                    last_indexed_at: indexed_at,
                    symbol_ids: Vec::new(),
                    language: extraction.language.unwrap_or_else(|| "unknown".to_string()),
                    references: extraction.references,
                    notes: extraction.diagnostics,
                };
                store.upsert_file(record, extraction.symbols, extraction.contains);
            }
            for path in &removed {
                log::debug!("Removed: {path}");
                store.remove_file(path);
            }
            stats.removed = removed.len();
            relink(&mut store);
        }

        // 4. Prune and commit
        stats.pruned_edges = store.prune_dangling_edges();
        options.checkpoint()?;
        stats.generation = store.bump_generation();
        store.save().await?;

        stats.symbols = store.all_symbols().count();
        stats.edges = store.all_edges().count();
        stats.time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        log::info!(
            "Indexed generation {}: {} extracted, {} unchanged, {} removed, {} symbols, {} edges in {} ms",
            stats.generation,
            stats.extracted,
            stats.unchanged,
            stats.removed,
            stats.symbols,
            stats.edges,
            stats.time_ms
        );
        Ok(stats)
    }

    /// Read and hash files in bounded batches; parse those whose hash moved
    async fn process_files_parallel(
        &self,
        files: &[PathBuf],
        store: &ContextStore,
        options: &IndexOptions,
    ) -> Result<Vec<std::result::Result<FileOutcome, String>>> {
        let mut aggregated = Vec::with_capacity(files.len());

        for file_chunk in files.chunks(self.concurrency) {
            options.checkpoint()?;
            let mut tasks = Vec::with_capacity(file_chunk.len());
            for file_path in file_chunk {
                let relative_path = self.normalize_path(file_path);
                let stored_hash = store
                    .file_record(&relative_path)
                    .map(|record| record.content_hash.clone());
                let extractor = Arc::clone(&self.extractor);
                let file_path = file_path.clone();
                let task = tokio::spawn(async move {
                    read_and_extract(file_path, relative_path, stored_hash, extractor).await
                });
                tasks.push(task);
            }

            for task in tasks {
                match task.await {
                    Ok(outcome) => aggregated.push(outcome),
                    Err(e) => aggregated.push(Err(format!("Task panicked: {e}"))),
                }
            }
        }

        Ok(aggregated)
    }

    async fn resolve_scope(&self, scope: Option<&Path>) -> Result<Option<PathBuf>> {
        let Some(scope) = scope else {
            return Ok(None);
        };
        let absolute = if scope.is_absolute() {
            scope.to_path_buf()
        } else {
            self.root.join(scope)
        };
        let canonical = tokio::fs::canonicalize(&absolute).await.map_err(|err| {
            IndexerError::InvalidPath(format!("{}: {err}", absolute.display()))
        })?;
        if !canonical.starts_with(&self.root) {
            return Err(IndexerError::InvalidPath(format!(
                "{} is outside project root {}",
                canonical.display(),
                self.root.display()
            )));
        }
        if !canonical.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "{} is not a directory",
                canonical.display()
            )));
        }
        Ok((canonical != self.root).then_some(canonical))
    }

    fn normalize_path(&self, path: &Path) -> String {
        normalize_relative(&self.root, path)
    }
}

async fn read_and_extract(
    file_path: PathBuf,
    relative_path: String,
    stored_hash: Option<String>,
    extractor: Arc<SymbolExtractor>,
) -> std::result::Result<FileOutcome, String> {
    let bytes = tokio::fs::read(&file_path)
        .await
        .map_err(|e| format!("{}: {e}", file_path.display()))?;
    let hash = content_hash(&bytes);
    if stored_hash.as_deref() == Some(hash.as_str()) {
        return Ok(FileOutcome::Unchanged(relative_path));
    }

    tokio::task::spawn_blocking(move || {
        let extraction = extractor.extract(&relative_path, &bytes);
        FileOutcome::Extracted {
            relative_path,
            hash,
            extraction,
        }
    })
    .await
    .map_err(|e| format!("{}: extraction task failed: {e}", file_path.display()))
}

/// Re-resolve every stored reference against the current symbol table
fn relink(store: &mut ContextStore) {
    let links: Vec<(String, Vec<Edge>, Vec<Diagnostic>)> = {
        let linker = DependencyLinker::new(store.all_symbols());
        store
            .files()
            .map(|record| {
                let outcome = linker.link(&record.references);
                (record.path.clone(), outcome.edges, outcome.unresolved)
            })
            .collect()
    };

    let mut resolved = 0;
    let mut unresolved = 0;
    for (path, edges, notes) in links {
        resolved += edges.len();
        unresolved += notes.len();
        store.replace_dependencies(&path, edges, notes);
    }
    log::debug!("Linked {resolved} references ({unresolved} unresolved)");
}

fn in_scope(path: &str, prefix: Option<&str>) -> bool {
    match prefix {
        None => true,
        Some(prefix) => path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/')),
    }
}

async fn canonical_root(root: &Path) -> Result<PathBuf> {
    let canonical = tokio::fs::canonicalize(root).await.map_err(|err| {
        IndexerError::InvalidPath(format!("Path does not exist: {} ({err})", root.display()))
    })?;
    if !canonical.is_dir() {
        return Err(IndexerError::InvalidPath(format!(
            "Not a directory: {}",
            canonical.display()
        )));
    }
    Ok(canonical)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn check_budget(deadline: Option<Instant>) -> Result<()> {
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            return Err(IndexerError::BudgetExceeded);
        }
    }
    Ok(())
}
