//! `.env`-file implementation of [`ConfigurationStore`].

use std::time::Duration;

use tracing::warn;

use crate::application::update_configuration::{
    plan_update, ConfigUpdateError, ConfigurationStore, UpdateOutcome,
};

use super::env_file::{self, EnvFileError};
use super::lock::LockError;
use super::settings::ResolvedPaths;
use super::writer::{ConfigWriter, WriteError, WritePaths};

/// Merges the template into the live `.env` on disk.
#[derive(Debug, Clone)]
pub struct EnvFileStore {
    paths: WritePaths,
    writer: ConfigWriter,
}

impl EnvFileStore {
    pub fn new(paths: &ResolvedPaths, lock_timeout: Duration) -> Self {
        Self {
            paths: WritePaths {
                target: paths.target.clone(),
                backup: paths.backup.clone(),
                template: paths.template.clone(),
            },
            writer: ConfigWriter::new(lock_timeout),
        }
    }
}

impl ConfigurationStore for EnvFileStore {
    fn update(&self) -> Result<UpdateOutcome, ConfigUpdateError> {
        let existing = env_file::parse(&self.paths.target)?;
        let template = env_file::read_template(&self.paths.template)?;

        let plan = plan_update(existing, &template);
        if !plan.skipped.is_empty() {
            warn!(
                count = plan.skipped.len(),
                path = %self.paths.target.display(),
                "unreadable lines were left out of the merge"
            );
        }
        for key in &plan.summary.dropped {
            warn!(%key, "dropping key the template no longer declares");
        }

        self.writer.commit(&self.paths, &plan.document)?;

        Ok(UpdateOutcome {
            summary: plan.summary,
            skipped: plan.skipped,
            backup_path: self.paths.backup.clone(),
        })
    }
}

impl From<EnvFileError> for ConfigUpdateError {
    fn from(err: EnvFileError) -> Self {
        match err {
            EnvFileError::Read { path, source } => ConfigUpdateError::Read {
                path,
                reason: source.to_string(),
            },
            EnvFileError::Template { path, source } => {
                ConfigUpdateError::Template { path, source }
            }
        }
    }
}

impl From<WriteError> for ConfigUpdateError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Lock(lock @ LockError::Timeout { .. }) => {
                ConfigUpdateError::Locked(lock.to_string())
            }
            WriteError::Lock(LockError::Io { path, source }) => ConfigUpdateError::Write {
                path,
                reason: source.to_string(),
            },
            WriteError::Backup { to, source, .. } => ConfigUpdateError::Write {
                path: to,
                reason: format!("backup failed: {source}"),
            },
            WriteError::Baseline { template, source } => ConfigUpdateError::Read {
                path: template,
                reason: source.to_string(),
            },
            WriteError::Replace { target, source } => ConfigUpdateError::Write {
                path: target,
                reason: source.to_string(),
            },
        }
    }
}
