//! Lock failures

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum LockError {
    /// Another run kept the lock for longer than we were willing to wait
    Busy {
        path: PathBuf,
        /// What the lock was wanted for, e.g. `write dist/templates.js`
        purpose: String,
        waited: Duration,
    },
    Io {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Busy {
                path,
                purpose,
                waited,
            } => write!(
                f,
                "{} is held by another run; gave up on '{}' after {:.2}s",
                path.display(),
                purpose,
                waited.as_secs_f64()
            ),
            LockError::Io {
                path,
                action,
                source,
            } => write!(f, "cannot {} {}: {}", action, path.display(), source),
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LockError::Busy { .. } => None,
            LockError::Io { source, .. } => Some(source),
        }
    }
}
