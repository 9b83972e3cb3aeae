//! Held output lock

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Exclusive lock on a `.lock` file, released on drop
///
/// fs2 locks belong to the open file, so closing it here is the release.
#[derive(Debug)]
pub struct LockGuard {
    _file: File,
    path: PathBuf,
    acquired_at: Instant,
}

impl LockGuard {
    pub(super) fn new(file: File, path: PathBuf) -> Self {
        log::debug!("locked {}", path.display());
        Self {
            _file: file,
            path,
            acquired_at: Instant::now(),
        }
    }

    /// Path of the held lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        log::debug!(
            "unlocked {} after {:.3}s",
            self.path.display(),
            self.acquired_at.elapsed().as_secs_f64()
        );
    }
}
