use context_extractor::is_supported_path;
use context_store::is_context_dir_name;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Extra directory names to skip, on top of the built-in list
    pub exclude: Vec<String>,

    /// Walk only this subtree (absolute, inside the root)
    pub scope: Option<PathBuf>,
}

/// Scanner for finding source files in a project
pub struct FileScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options: ScanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Scan for files with a registered parser (.gitignore aware), sorted
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let start = self.options.scope.as_deref().unwrap_or(&self.root);
        let root = self.root.clone();
        let exclude: Vec<String> = self
            .options
            .exclude
            .iter()
            .map(|name| name.to_lowercase())
            .collect();
        let mut builder = WalkBuilder::new(start);
        builder
            .hidden(true) // do not index hidden files by default
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false);
        builder.filter_entry(move |entry| {
            !FileScanner::is_ignored_scope(entry.path(), &root, &exclude)
        });

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !is_supported_path(path) {
                        log::debug!("Skipping {} (no parser)", path.display());
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("Found {} source files", files.len());
        files
    }

    fn is_ignored_scope(path: &Path, root: &Path, extra: &[String]) -> bool {
        if let Ok(relative) = path.strip_prefix(root) {
            for component in relative.components() {
                if let std::path::Component::Normal(name) = component {
                    let name = name.to_string_lossy();
                    if is_context_dir_name(&name) {
                        return true;
                    }
                    let lowered = name.to_lowercase();
                    if IGNORED_SCOPES.iter().any(|ignored| ignored == &lowered)
                        || extra.iter().any(|ignored| ignored == &lowered)
                    {
                        return true;
                    }
                }
            }
        }
        false
    }
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    // caches / builds
    ".cache",
    "node_modules",
    ".next",
    ".turbo",
    ".parcel-cache",
    ".output",
    "build",
    "dist",
    "coverage",
    ".nuxt",
    ".vite",
    ".svelte-kit",
    "target",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "__pycache__",
    // vendor
    "vendor",
    "third_party",
    "third-party",
];
