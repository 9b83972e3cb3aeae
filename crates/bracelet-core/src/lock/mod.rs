//! Advisory file locks guarding the bundle output
//!
//! One run writes its destination file exactly once while holding an
//! exclusive fs2 lock on a sibling `.<file>.lock`, so concurrent runs
//! targeting the same output serialize instead of interleaving.

use std::path::{Path, PathBuf};
use std::time::Duration;

mod acquire;
mod error;
mod guard;

pub use error::LockError;
pub use guard::LockGuard;


/// Default wait for another run to release the output
pub const OUTPUT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Acquires an exclusive lock on `lock_path`, retrying until `timeout`.
///
/// Parent directories are created as needed. The returned guard releases
/// the lock when dropped.
///
/// # Examples
///
/// ```no_run
/// use bracelet_core::lock::acquire_lock;
/// use std::path::Path;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let guard = acquire_lock(Path::new("dist/.templates.js.lock"), Duration::from_secs(5), "write bundle")?;
/// // Critical section here
/// drop(guard);
/// # Ok(())
/// # }
/// ```
pub fn acquire_lock(
    lock_path: &Path,
    timeout: Duration,
    purpose: &str,
) -> Result<LockGuard, LockError> {
    acquire::acquire_with_retry(lock_path, timeout, purpose)
}

/// Lock file guarding `output`: `dir/.<file>.lock`
pub fn lock_path_for(output: &Path) -> PathBuf {
    let file_name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(".{}.lock", file_name))
}

/// Acquires the exclusive lock guarding `output`
pub fn lock_output(output: &Path, timeout: Duration) -> Result<LockGuard, LockError> {
    let purpose = format!("write {}", output.display());
    acquire_lock(&lock_path_for(output), timeout, &purpose)
}
