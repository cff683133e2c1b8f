//! Command-backed implementations of the upgrade collaborators.
//!
//! Every task trait is implemented by running the configured command through
//! the [`CommandRunner`].  An empty command list disables a task: it is
//! skipped with a log line and counts as success.  The deployment probe is
//! the exception, since the gate cannot be skipped.

use async_trait::async_trait;
use tracing::info;

use crate::application::orchestrate_upgrade::{
    CacheOptimizer, MaintenanceMode, SchemaMigrator, TaskError, WorkQueue,
};
use crate::application::upgrade_gate::{DeploymentStateProbe, ProbeError};
use crate::infrastructure::storage::settings::CommandSettings;

use super::runner::{CommandError, CommandRunner};

/// Runs the configured application commands.
#[derive(Debug, Clone)]
pub struct CommandHooks {
    runner: CommandRunner,
    commands: CommandSettings,
}

impl CommandHooks {
    pub fn new(runner: CommandRunner, commands: CommandSettings) -> Self {
        Self { runner, commands }
    }

    async fn task(&self, name: &'static str, argv: &[String]) -> Result<(), TaskError> {
        if argv.is_empty() {
            info!(task = name, "no command configured, skipping");
            return Ok(());
        }
        self.runner
            .run(argv)
            .await
            .map(|_| ())
            .map_err(|e| TaskError(e.to_string()))
    }
}

#[async_trait]
impl MaintenanceMode for CommandHooks {
    async fn enter(&self) -> Result<(), TaskError> {
        self.task("maintenance_enter", &self.commands.maintenance_enter)
            .await
    }

    async fn leave(&self) -> Result<(), TaskError> {
        self.task("maintenance_leave", &self.commands.maintenance_leave)
            .await
    }
}

#[async_trait]
impl SchemaMigrator for CommandHooks {
    async fn migrate(&self) -> Result<(), TaskError> {
        self.task("migrate", &self.commands.migrate).await
    }
}

#[async_trait]
impl CacheOptimizer for CommandHooks {
    async fn optimize(&self) -> Result<(), TaskError> {
        self.task("optimize", &self.commands.optimize).await
    }
}

#[async_trait]
impl WorkQueue for CommandHooks {
    async fn flush(&self) -> Result<(), TaskError> {
        self.task("queue_flush", &self.commands.queue_flush).await
    }

    async fn restart(&self) -> Result<(), TaskError> {
        self.task("queue_restart", &self.commands.queue_restart)
            .await
    }
}

#[async_trait]
impl DeploymentStateProbe for CommandHooks {
    async fn count_active_deployments(&self) -> Result<u64, ProbeError> {
        let argv = &self.commands.active_deployments;
        if argv.is_empty() {
            return Err(ProbeError(
                CommandError::NotConfigured("active_deployments").to_string(),
            ));
        }
        let output = self
            .runner
            .run(argv)
            .await
            .map_err(|e| ProbeError(e.to_string()))?;
        parse_count(&output.stdout)
    }
}

/// The probe command prints a single non-negative integer.
fn parse_count(stdout: &str) -> Result<u64, ProbeError> {
    let text = stdout.trim();
    text.parse().map_err(|_| {
        ProbeError(format!(
            "expected a deployment count, got {text:?} from the active_deployments command"
        ))
    })
}
