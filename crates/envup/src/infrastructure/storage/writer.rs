//! ConfigWriter: backup-then-replace persistence of the merged document.
//!
//! # Sequence
//!
//! Each step is a precondition for the next, and the whole sequence runs while
//! holding the [`TargetLock`]:
//!
//! 1. **Backup** – copy the live file to the backup path, overwriting any
//!    previous backup.  Nothing else is touched until this has succeeded, so
//!    the operator's encryption key is always recoverable.
//! 2. **Baseline** – copy the template into a scoped temporary file in the
//!    same directory as the live file.  The live file is never replaced by a
//!    bare template copy.
//! 3. **Replace** – overwrite the temporary file with the merged document,
//!    flush it to disk, give it the live file's permissions, and rename it
//!    over the live file.  The rename is atomic, so readers see either the old
//!    or the new complete file.
//!
//! If any step fails the temporary file is deleted when it goes out of scope
//! and the live file is either untouched (steps 1–2, and step 3 before the
//! rename) or fully replaced.

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use envup_core::MergedDocument;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use super::lock::{LockError, TargetLock, DEFAULT_LOCK_TIMEOUT};

/// Error type for the write sequence.  Every variant is fatal.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("backing up {from} to {to} failed: {source}")]
    Backup {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("preparing a copy of template {template} failed: {source}")]
    Baseline {
        template: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("replacing {target} failed: {source}")]
    Replace {
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The three files involved in one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePaths {
    pub target: PathBuf,
    pub backup: PathBuf,
    pub template: PathBuf,
}

/// Persists merged documents with a backup and an atomic replace.
#[derive(Debug, Clone)]
pub struct ConfigWriter {
    lock_timeout: Duration,
}

impl Default for ConfigWriter {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl ConfigWriter {
    pub fn new(lock_timeout: Duration) -> Self {
        Self { lock_timeout }
    }

    /// Runs the backup → baseline → replace sequence.
    ///
    /// # Errors
    ///
    /// Returns the [`WriteError`] of the first step that failed.  The backup
    /// at `paths.backup` is the recovery path for any failure after step 1.
    pub fn commit(&self, paths: &WritePaths, merged: &MergedDocument) -> Result<(), WriteError> {
        let lock = TargetLock::acquire(&paths.target, self.lock_timeout)?;
        debug!(lock = %lock.path().display(), "holding configuration lock");

        // ── Step 1: backup ────────────────────────────────────────────────────
        backup(&paths.target, &paths.backup).map_err(|source| WriteError::Backup {
            from: paths.target.clone(),
            to: paths.backup.clone(),
            source,
        })?;
        info!(backup = %paths.backup.display(), "backed up configuration");

        // ── Step 2: template baseline in a scoped temporary file ──────────────
        let mut staged = stage_template(&paths.target, &paths.template).map_err(|source| {
            WriteError::Baseline {
                template: paths.template.clone(),
                source,
            }
        })?;
        debug!(staged = %staged.path().display(), "staged template baseline");

        // ── Step 3: write merged content and atomically replace ───────────────
        let replace_err = |source| WriteError::Replace {
            target: paths.target.clone(),
            source,
        };
        write_document(staged.as_file_mut(), merged).map_err(replace_err)?;
        let permissions = fs::metadata(&paths.target)
            .map_err(replace_err)?
            .permissions();
        fs::set_permissions(staged.path(), permissions).map_err(replace_err)?;
        staged
            .persist(&paths.target)
            .map_err(|e| replace_err(e.error))?;
        sync_parent(&paths.target);

        info!(target = %paths.target.display(), lines = merged.len(), "configuration written");
        Ok(())
    }
}

fn backup(target: &Path, backup: &Path) -> io::Result<()> {
    fs::copy(target, backup)?;
    File::open(backup)?.sync_all()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn stage_template(target: &Path, template: &Path) -> io::Result<NamedTempFile> {
    let staged = NamedTempFile::new_in(parent_dir(target))?;
    fs::copy(template, staged.path())?;
    Ok(staged)
}

fn write_document(file: &mut File, merged: &MergedDocument) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(merged.render().as_bytes())?;
    file.sync_all()
}

/// Flushes the directory entry of the rename.  Not every platform can open a
/// directory, so failures are ignored.
fn sync_parent(target: &Path) {
    if let Ok(dir) = File::open(parent_dir(target)) {
        let _ = dir.sync_all();
    }
}
