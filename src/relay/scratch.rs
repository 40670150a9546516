//! Scratch directory for staging downloaded media.
//!
//! The directory is shared, so the fetch-to-reply section is serialized
//! through a [`ScratchLease`]. Taking a lease empties the directory and
//! dropping it empties the directory again, whichever way the request ends.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Remove every entry directly inside the directory, creating it if absent.
    /// Returns the number of entries removed.
    pub fn clear(&self) -> io::Result<usize> {
        clear_dir(&self.root)
    }

    /// Wait for exclusive use of the directory, then hand it over empty.
    pub async fn lease(&self) -> io::Result<ScratchLease> {
        let guard = self.lock.clone().lock_owned().await;
        let removed = clear_dir(&self.root)?;
        if removed > 0 {
            tracing::warn!("Scratch: removed {} leftover file(s) from {:?}", removed, self.root);
        }
        Ok(ScratchLease {
            root: self.root.clone(),
            _guard: guard,
        })
    }
}

/// Exclusive, initially empty use of the scratch directory.
#[derive(Debug)]
pub struct ScratchLease {
    root: PathBuf,
    _guard: OwnedMutexGuard<()>,
}

impl ScratchLease {
    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Drop for ScratchLease {
    fn drop(&mut self) {
        match clear_dir(&self.root) {
            Ok(_) => tracing::debug!("Scratch: directory cleared"),
            Err(e) => tracing::error!("Scratch: failed to clear {:?}: {}", self.root, e),
        }
    }
}

fn clear_dir(root: &Path) -> io::Result<usize> {
    std::fs::create_dir_all(root)?;

    let mut removed = 0;
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}
