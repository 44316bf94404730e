use std::path::{Path, PathBuf};

pub const CONTEXT_DIR_NAME: &str = ".context-aware";
pub const SNAPSHOT_FILE_NAME: &str = "snapshot.json";
pub const LOCK_FILE_NAME: &str = "index.lock";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[must_use]
pub fn context_dir_for_project_root(root: &Path) -> PathBuf {
    root.join(CONTEXT_DIR_NAME)
}

#[must_use]
pub fn snapshot_path(root: &Path) -> PathBuf {
    context_dir_for_project_root(root).join(SNAPSHOT_FILE_NAME)
}

#[must_use]
pub fn lock_path(root: &Path) -> PathBuf {
    context_dir_for_project_root(root).join(LOCK_FILE_NAME)
}

#[must_use]
pub fn config_path(root: &Path) -> PathBuf {
    context_dir_for_project_root(root).join(CONFIG_FILE_NAME)
}

#[must_use]
pub fn is_context_dir_name(name: &str) -> bool {
    name == CONTEXT_DIR_NAME
}

/// Project-relative path with `/` separators
#[must_use]
pub fn normalize_relative(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut normalized = relative.to_string_lossy().to_string();
    if normalized.contains('\\') {
        normalized = normalized.replace('\\', "/");
    }
    normalized.trim_start_matches("./").to_string()
}
