//! Polling acquisition with exponential backoff

use super::{LockError, LockGuard};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const FIRST_DELAY: Duration = Duration::from_millis(10);
const MAX_DELAY: Duration = Duration::from_millis(500);
/// Waits longer than this are reported once at info level
const NOTICE_AFTER: Duration = Duration::from_secs(2);

struct Backoff {
    delay: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self { delay: FIRST_DELAY }
    }

    /// Sleep for the current delay, never past `remaining`, then double it
    fn pause(&mut self, remaining: Duration) {
        thread::sleep(self.delay.min(remaining));
        self.delay = (self.delay * 2).min(MAX_DELAY);
    }
}

pub(crate) fn acquire_with_retry(
    lock_path: &Path,
    timeout: Duration,
    purpose: &str,
) -> Result<LockGuard, LockError> {
    let file = open_lock_file(lock_path)?;
    let start = Instant::now();
    let mut backoff = Backoff::new();
    let mut noticed = false;

    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(LockGuard::new(file, lock_path.to_path_buf())),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(source) => {
                return Err(LockError::Io {
                    path: lock_path.to_path_buf(),
                    action: "lock",
                    source,
                })
            }
        }

        let waited = start.elapsed();
        if waited >= timeout {
            return Err(LockError::Busy {
                path: lock_path.to_path_buf(),
                purpose: purpose.to_string(),
                waited,
            });
        }
        if !noticed && waited >= NOTICE_AFTER {
            log::info!("waiting for {} to {}", lock_path.display(), purpose);
            noticed = true;
        }
        backoff.pause(timeout - waited);
    }
}

fn open_lock_file(lock_path: &Path) -> Result<File, LockError> {
    let io_error = |action: &'static str| {
        move |source: std::io::Error| LockError::Io {
            path: lock_path.to_path_buf(),
            action,
            source,
        }
    };

    if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error("create the directory of"))?;
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(io_error("open"))
}
