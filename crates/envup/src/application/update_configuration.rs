//! UpdateConfigurationUseCase: plans and applies the `.env` merge.
//!
//! Planning is pure: [`plan_update`] takes the parsed operator file and the
//! parsed template and produces the merged document plus a summary of what
//! changed.  Applying the plan (backup, template baseline, atomic replace) is
//! file-system work and lives behind the [`ConfigurationStore`] trait, which
//! the infrastructure layer implements.

use std::path::PathBuf;

use envup_core::{
    merge, summarize, MergeSummary, MergedDocument, ParsedConfig, SkippedLine, Template,
    TemplateError,
};
use thiserror::Error;

/// Errors from reading, merging or writing the configuration.
///
/// Every variant is fatal to the upgrade.
#[derive(Debug, Error)]
pub enum ConfigUpdateError {
    /// An input file could not be read.
    #[error("cannot read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// The template contains a line that is not a valid assignment.
    #[error("template {path} is invalid: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    /// The backup, the temporary baseline, or the final replace failed.
    #[error("writing {path} failed: {reason}")]
    Write { path: PathBuf, reason: String },

    /// Another process holds the lock on the configuration file.
    #[error("configuration file is locked: {0}")]
    Locked(String),
}

/// The merge result for one run, before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub document: MergedDocument,
    pub summary: MergeSummary,
    /// Lines of the operator's file that were not understood.
    pub skipped: Vec<SkippedLine>,
}

/// What a completed update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub summary: MergeSummary,
    pub skipped: Vec<SkippedLine>,
    /// Where the pre-upgrade file was saved.
    pub backup_path: PathBuf,
}

/// Builds the merge plan from the parsed operator file and template.
pub fn plan_update(existing: ParsedConfig, template: &Template) -> UpdatePlan {
    UpdatePlan {
        document: merge(&existing.map, template),
        summary: summarize(&existing.map, template),
        skipped: existing.skipped,
    }
}

/// Applies the merge to durable storage.
///
/// The production implementation works on `.env` files; tests substitute a
/// recording double.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigurationStore: Send + Sync {
    /// Reads both inputs, merges, and commits the result with a backup.
    ///
    /// # Errors
    ///
    /// Any [`ConfigUpdateError`]; the backup (if it was written) is the
    /// recovery path.
    fn update(&self) -> Result<UpdateOutcome, ConfigUpdateError>;
}
