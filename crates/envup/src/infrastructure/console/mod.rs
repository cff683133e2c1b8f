//! Operator-facing console output.
//!
//! The presentation counterpart of the use cases: turns a [`GateFailure`], an
//! [`UpgradeError`] or an [`UpgradeReport`] into the text printed at the end of
//! a run.  Rendering returns `String`s so the layout can be tested without
//! capturing stdout.
//!
//! A refused gate is shown as a message block: the title, a blank line, then
//! the instruction, e.g.
//!
//! ```text
//! Deployments in progress
//!
//! There are still running deployments, please wait for them to finish before updating.
//! ```

use std::fmt::Write as _;

use envup_core::ConfigKey;

use crate::application::orchestrate_upgrade::{UpgradeError, UpgradeReport};
use crate::application::upgrade_gate::GateFailure;

/// Renders the message block for a refused precondition.
pub fn render_block(failure: &GateFailure) -> String {
    format!("{}\n\n{}\n", failure.title(), failure.instruction())
}

/// Renders the outcome of a failed run.
pub fn render_failure(error: &UpgradeError) -> String {
    match error {
        UpgradeError::Blocked(failure) => render_block(failure),
        UpgradeError::StageFailed {
            stage,
            reason,
            maintenance_active,
            backup_path,
        } => {
            let mut out = format!("Upgrade failed while {stage}.\n\n{reason}\n");
            if let Some(backup) = backup_path {
                let _ = writeln!(
                    out,
                    "\nThe previous configuration was saved to {}.",
                    backup.display()
                );
            }
            if *maintenance_active {
                out.push_str(
                    "\nThe application is still in maintenance mode. \
                     Fix the problem and run the update again.\n",
                );
            }
            out
        }
    }
}

/// Renders the outcome of a successful run.
pub fn render_success(report: &UpgradeReport) -> String {
    let configuration = &report.configuration;
    let summary = &configuration.summary;

    let mut out = String::from("Upgrade complete.\n");
    let _ = writeln!(
        out,
        "Configuration: {} kept, {} added, {} removed (backup at {}).",
        summary.retained.len(),
        summary.introduced.len(),
        summary.dropped.len(),
        configuration.backup_path.display()
    );
    if !summary.introduced.is_empty() {
        let _ = writeln!(out, "Added: {}", join_keys(&summary.introduced));
    }
    if !summary.dropped.is_empty() {
        let _ = writeln!(out, "Removed: {}", join_keys(&summary.dropped));
    }
    for skipped in &configuration.skipped {
        let _ = writeln!(
            out,
            "Ignored line {} ({}): {}",
            skipped.line_number, skipped.reason, skipped.text
        );
    }
    out
}

fn join_keys(keys: &[ConfigKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
