//! Dependency freshness from the install artifact's modification time.

use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::debug;

use crate::application::upgrade_gate::{DependencyFreshnessProbe, ProbeError};

/// Reads the mtime of a file that every dependency install rewrites
/// (`vendor/autoload.php` for Composer).
#[derive(Debug, Clone)]
pub struct ArtifactMtimeProbe {
    path: PathBuf,
}

impl ArtifactMtimeProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DependencyFreshnessProbe for ArtifactMtimeProbe {
    fn last_dependency_install_time(&self) -> Result<Option<SystemTime>, ProbeError> {
        match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => {
                debug!(path = %self.path.display(), "read dependency artifact time");
                Ok(Some(mtime))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProbeError(format!(
                "cannot read {}: {e}",
                self.path.display()
            ))),
        }
    }
}
