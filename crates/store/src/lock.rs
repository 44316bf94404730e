use crate::error::{Result, StoreError};
use crate::paths::{context_dir_for_project_root, lock_path};
use fs2::FileExt;
use std::path::Path;

/// Advisory write lock on a project store, released on drop
#[derive(Debug)]
pub struct StoreLock {
    file: std::fs::File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl StoreLock {
    /// Take the writer lock without waiting.
    ///
    /// A second writer fails immediately with `StoreBusy` instead of queueing.
    pub async fn acquire(root: &Path) -> Result<Self> {
        let dir = context_dir_for_project_root(root);
        if !tokio::fs::try_exists(&dir).await? {
            return Err(StoreError::NotInitialized(root.display().to_string()));
        }

        let path = lock_path(root);
        let root_label = root.display().to_string();
        tokio::task::spawn_blocking(move || -> Result<StoreLock> {
            use std::fs::OpenOptions;

            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)?;

            match file.try_lock_exclusive() {
                Ok(()) => Ok(StoreLock { file }),
                Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                    Err(StoreError::StoreBusy(root_label))
                }
                Err(err) => Err(StoreError::Io(err)),
            }
        })
        .await
        .map_err(|err| StoreError::Io(std::io::Error::other(format!("join lock task: {err}"))))?
    }
}
