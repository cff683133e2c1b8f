//! Advisory lock on the live environment file.
//!
//! The backup, baseline and replace steps form a short critical section.  No
//! other process is expected to write `.env` during an upgrade, but two
//! operators running the upgrade at once would race on the backup.  The lock
//! is a sibling file (`.env.lock`) created with `create_new`, so acquiring it
//! is atomic on every platform; it is removed again on drop.
//!
//! A lock file left behind by a killed process has to be removed by hand; the
//! timeout error names the path.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use super::settings::with_suffix;

/// Suffix appended to the target file name to form the lock path.
pub const LOCK_SUFFIX: &str = ".lock";

/// How long to wait for a held lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors from lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out after {timeout:?} waiting for {path} (remove it if no upgrade is running)")]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("I/O error creating lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Held lock on a target file.  Released when dropped.
#[derive(Debug)]
pub struct TargetLock {
    path: PathBuf,
}

impl TargetLock {
    /// Acquires the lock for `target`, waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if another holder keeps the lock for the whole
    /// timeout, [`LockError::Io`] for any other file-system failure.
    pub fn acquire(target: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = with_suffix(target, LOCK_SUFFIX);
        let start = Instant::now();
        let mut warned = false;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // The pid is informational only.
                    let _ = writeln!(file, "{}", std::process::id());
                    debug!(path = %path.display(), "acquired configuration lock");
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if !warned {
                        warn!(path = %path.display(), "configuration lock is held, waiting");
                        warned = true;
                    }
                }
                Err(source) => return Err(LockError::Io { path, source }),
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout { path, timeout });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TargetLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove configuration lock");
        }
    }
}
