//! UpgradeOrchestrator: runs the whole upgrade in order.
//!
//! ```text
//! gate ──► enter maintenance ──► re-check deployments ──► update .env
//!      ──► migrate ──► optimize ──► flush queue ──► restart queue
//!      ──► leave maintenance
//! ```
//!
//! # Failure policy
//!
//! - A gate failure aborts before anything is touched.
//! - Maintenance mode is the coarse lock against the live application.  Once
//!   it is on, the deployment count is taken again; if a deployment slipped
//!   in between the gate and the toggle, maintenance mode is switched back
//!   off (nothing has been written yet) and the run aborts like a gate
//!   failure.
//! - Any later failure leaves the application **in maintenance mode**.  A
//!   half-applied upgrade must not receive traffic; the operator recovers
//!   from the `.env` backup and brings the application back up by hand.
//!
//! # Architecture
//!
//! This use case depends only on traits.  All infrastructure implementations
//! are injected at construction time, making the sequence fully unit-testable.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::update_configuration::{ConfigurationStore, UpdateOutcome};
use super::upgrade_gate::{GateFailure, UpgradeGate};

/// Error raised by an external collaborator (command exit status, I/O, ...).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TaskError(pub String);

/// Toggles the application's maintenance mode.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaintenanceMode: Send + Sync {
    async fn enter(&self) -> Result<(), TaskError>;
    async fn leave(&self) -> Result<(), TaskError>;
}

/// Runs pending schema migrations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    async fn migrate(&self) -> Result<(), TaskError>;
}

/// Rebuilds the application's optimisation caches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheOptimizer: Send + Sync {
    async fn optimize(&self) -> Result<(), TaskError>;
}

/// Controls the background work queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn flush(&self) -> Result<(), TaskError>;
    async fn restart(&self) -> Result<(), TaskError>;
}

/// One step of the upgrade, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EnterMaintenance,
    UpdateConfiguration,
    Migrate,
    Optimize,
    FlushQueue,
    RestartQueue,
    LeaveMaintenance,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::EnterMaintenance => "entering maintenance mode",
            Stage::UpdateConfiguration => "updating the configuration",
            Stage::Migrate => "running migrations",
            Stage::Optimize => "optimizing",
            Stage::FlushQueue => "flushing the queue",
            Stage::RestartQueue => "restarting the queue",
            Stage::LeaveMaintenance => "leaving maintenance mode",
        };
        f.write_str(name)
    }
}

/// Error type for the upgrade use case.
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// A precondition failed; nothing was changed.
    #[error("upgrade blocked: {0}")]
    Blocked(#[from] GateFailure),

    /// A step failed after the upgrade started.
    #[error("{stage} failed: {reason}")]
    StageFailed {
        stage: Stage,
        reason: String,
        /// `true` if the application was left in maintenance mode.
        maintenance_active: bool,
        /// The pre-upgrade `.env` copy, once it exists.
        backup_path: Option<PathBuf>,
    },
}

impl UpgradeError {
    /// Returns `true` if no side effects happened.
    pub fn is_blocked(&self) -> bool {
        matches!(self, UpgradeError::Blocked(_))
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct UpgradeReport {
    pub run_id: Uuid,
    pub configuration: UpdateOutcome,
}

/// The collaborators invoked once the gate has passed.
#[derive(Clone)]
pub struct UpgradeTasks {
    pub maintenance: Arc<dyn MaintenanceMode>,
    pub configuration: Arc<dyn ConfigurationStore>,
    pub migrator: Arc<dyn SchemaMigrator>,
    pub optimizer: Arc<dyn CacheOptimizer>,
    pub queue: Arc<dyn WorkQueue>,
}

/// Sequences the full upgrade.
pub struct UpgradeOrchestrator {
    gate: UpgradeGate,
    tasks: UpgradeTasks,
}

impl UpgradeOrchestrator {
    pub fn new(gate: UpgradeGate, tasks: UpgradeTasks) -> Self {
        Self { gate, tasks }
    }

    /// Runs the upgrade as of `now` (used for the dependency freshness check).
    ///
    /// # Errors
    ///
    /// [`UpgradeError::Blocked`] if a precondition failed, otherwise
    /// [`UpgradeError::StageFailed`] naming the step that failed.
    pub async fn run(&self, now: SystemTime) -> Result<UpgradeReport, UpgradeError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("upgrade", %run_id);
        self.run_inner(run_id, now).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, now: SystemTime) -> Result<UpgradeReport, UpgradeError> {
        if let Err(failure) = self.gate.check(now).await {
            warn!(%failure, "upgrade gate refused");
            return Err(failure.into());
        }

        info!("entering maintenance mode");
        self.tasks
            .maintenance
            .enter()
            .await
            .map_err(|e| fail(Stage::EnterMaintenance, e.0, false, None))?;

        if let Err(failure) = self.gate.recheck_deployments().await {
            warn!(%failure, "deployment started before maintenance mode took effect");
            self.tasks
                .maintenance
                .leave()
                .await
                .map_err(|e| fail(Stage::LeaveMaintenance, e.0, true, None))?;
            return Err(failure.into());
        }

        info!("updating configuration");
        // The store does blocking file I/O and may sleep waiting for the lock.
        let store = Arc::clone(&self.tasks.configuration);
        let configuration = tokio::task::spawn_blocking(move || store.update())
            .await
            .map_err(|e| fail(Stage::UpdateConfiguration, e.to_string(), true, None))?
            .map_err(|e| fail(Stage::UpdateConfiguration, e.to_string(), true, None))?;
        let backup = Some(configuration.backup_path.clone());
        info!(
            retained = configuration.summary.retained.len(),
            introduced = configuration.summary.introduced.len(),
            dropped = configuration.summary.dropped.len(),
            "configuration updated"
        );

        info!("running migrations");
        self.tasks
            .migrator
            .migrate()
            .await
            .map_err(|e| fail(Stage::Migrate, e.0, true, backup.clone()))?;

        info!("optimizing");
        self.tasks
            .optimizer
            .optimize()
            .await
            .map_err(|e| fail(Stage::Optimize, e.0, true, backup.clone()))?;

        info!("Restarting the queue");
        self.tasks
            .queue
            .flush()
            .await
            .map_err(|e| fail(Stage::FlushQueue, e.0, true, backup.clone()))?;
        self.tasks
            .queue
            .restart()
            .await
            .map_err(|e| fail(Stage::RestartQueue, e.0, true, backup.clone()))?;

        info!("leaving maintenance mode");
        self.tasks
            .maintenance
            .leave()
            .await
            .map_err(|e| fail(Stage::LeaveMaintenance, e.0, true, backup.clone()))?;

        info!("upgrade complete");
        Ok(UpgradeReport {
            run_id,
            configuration,
        })
    }
}

fn fail(
    stage: Stage,
    reason: String,
    maintenance_active: bool,
    backup_path: Option<PathBuf>,
) -> UpgradeError {
    error!(%stage, %reason, maintenance_active, "upgrade step failed");
    UpgradeError::StageFailed {
        stage,
        reason,
        maintenance_active,
        backup_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::update_configuration::{ConfigUpdateError, MockConfigurationStore};
    use crate::application::upgrade_gate::{
        MockDependencyFreshnessProbe, MockDeploymentStateProbe, MockInstallationStateProvider,
    };
    use envup_core::MergeSummary;
    use mockall::Sequence;

    // ── Test fixtures ─────────────────────────────────────────────────────────

    fn gate_with_deployments(counts: Vec<u64>) -> UpgradeGate {
        let mut installation = MockInstallationStateProvider::new();
        installation.expect_is_installed().return_const(true);

        let mut deployments = MockDeploymentStateProbe::new();
        let mut remaining = counts.into_iter();
        deployments
            .expect_count_active_deployments()
            .returning(move || Ok(remaining.next().unwrap_or(0)));

        let mut dependencies = MockDependencyFreshnessProbe::new();
        dependencies
            .expect_last_dependency_install_time()
            .returning(|| Ok(Some(SystemTime::now())));

        UpgradeGate::new(
            Arc::new(installation),
            Arc::new(deployments),
            Arc::new(dependencies),
        )
    }

    fn outcome() -> UpdateOutcome {
        UpdateOutcome {
            summary: MergeSummary::default(),
            skipped: Vec::new(),
            backup_path: PathBuf::from("/srv/app/.env.prev"),
        }
    }

    struct Mocks {
        maintenance: MockMaintenanceMode,
        configuration: MockConfigurationStore,
        migrator: MockSchemaMigrator,
        optimizer: MockCacheOptimizer,
        queue: MockWorkQueue,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                maintenance: MockMaintenanceMode::new(),
                configuration: MockConfigurationStore::new(),
                migrator: MockSchemaMigrator::new(),
                optimizer: MockCacheOptimizer::new(),
                queue: MockWorkQueue::new(),
            }
        }

        fn into_orchestrator(self, gate: UpgradeGate) -> UpgradeOrchestrator {
            UpgradeOrchestrator::new(
                gate,
                UpgradeTasks {
                    maintenance: Arc::new(self.maintenance),
                    configuration: Arc::new(self.configuration),
                    migrator: Arc::new(self.migrator),
                    optimizer: Arc::new(self.optimizer),
                    queue: Arc::new(self.queue),
                },
            )
        }
    }

    // ── Happy path ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_run_executes_steps_in_order() {
        // Arrange
        let mut seq = Sequence::new();
        let mut m = Mocks::new();
        m.maintenance
            .expect_enter()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        m.configuration
            .expect_update()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(outcome()));
        m.migrator
            .expect_migrate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        m.optimizer
            .expect_optimize()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        m.queue
            .expect_flush()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        m.queue
            .expect_restart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        m.maintenance
            .expect_leave()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        let orchestrator = m.into_orchestrator(gate_with_deployments(vec![0, 0]));

        // Act
        let report = orchestrator.run(SystemTime::now()).await.unwrap();

        // Assert
        assert_eq!(
            report.configuration.backup_path,
            PathBuf::from("/srv/app/.env.prev")
        );
    }

    // ── Gate failures ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_run_gate_failure_touches_nothing() {
        // Arrange: two deployments in progress; no task may be invoked
        let mut m = Mocks::new();
        m.maintenance.expect_enter().never();
        m.configuration.expect_update().never();
        m.migrator.expect_migrate().never();
        let orchestrator = m.into_orchestrator(gate_with_deployments(vec![2]));

        // Act
        let err = orchestrator.run(SystemTime::now()).await.unwrap_err();

        // Assert
        assert!(err.is_blocked());
        assert!(matches!(
            err,
            UpgradeError::Blocked(GateFailure::DeploymentsInProgress { count: 2 })
        ));
    }

    #[tokio::test]
    async fn test_run_deployment_started_during_toggle_leaves_maintenance_and_aborts() {
        let mut m = Mocks::new();
        m.maintenance.expect_enter().times(1).returning(|| Ok(()));
        m.maintenance.expect_leave().times(1).returning(|| Ok(()));
        m.configuration.expect_update().never();
        let orchestrator = m.into_orchestrator(gate_with_deployments(vec![0, 1]));

        let err = orchestrator.run(SystemTime::now()).await.unwrap_err();

        assert!(err.is_blocked());
    }

    // ── Failures after maintenance mode ───────────────────────────────────────

    #[tokio::test]
    async fn test_run_write_failure_stops_before_migrations_and_stays_in_maintenance() {
        let mut m = Mocks::new();
        m.maintenance.expect_enter().times(1).returning(|| Ok(()));
        m.maintenance.expect_leave().never();
        m.configuration.expect_update().times(1).returning(|| {
            Err(ConfigUpdateError::Write {
                path: PathBuf::from("/srv/app/.env"),
                reason: "No space left on device".to_string(),
            })
        });
        m.migrator.expect_migrate().never();
        m.queue.expect_flush().never();
        m.queue.expect_restart().never();
        let orchestrator = m.into_orchestrator(gate_with_deployments(vec![0, 0]));

        let err = orchestrator.run(SystemTime::now()).await.unwrap_err();

        match err {
            UpgradeError::StageFailed {
                stage,
                maintenance_active,
                ..
            } => {
                assert_eq!(stage, Stage::UpdateConfiguration);
                assert!(maintenance_active);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_updates_configuration_off_the_async_thread() {
        // Arrange
        let caller = std::thread::current().id();
        let seen = Arc::new(std::sync::Mutex::new(None));
        let recorded = Arc::clone(&seen);
        let mut m = Mocks::new();
        m.maintenance.expect_enter().returning(|| Ok(()));
        m.maintenance.expect_leave().returning(|| Ok(()));
        m.configuration.expect_update().times(1).returning(move || {
            *recorded.lock().unwrap() = Some(std::thread::current().id());
            Ok(outcome())
        });
        m.migrator.expect_migrate().returning(|| Ok(()));
        m.optimizer.expect_optimize().returning(|| Ok(()));
        m.queue.expect_flush().returning(|| Ok(()));
        m.queue.expect_restart().returning(|| Ok(()));
        let orchestrator = m.into_orchestrator(gate_with_deployments(vec![0, 0]));

        // Act
        orchestrator.run(SystemTime::now()).await.unwrap();

        // Assert
        let worker = seen.lock().unwrap().expect("update was not called");
        assert_ne!(worker, caller);
    }

    #[tokio::test]
    async fn test_run_panicking_store_is_reported_as_update_failure() {
        let mut m = Mocks::new();
        m.maintenance.expect_enter().returning(|| Ok(()));
        m.maintenance.expect_leave().never();
        m.configuration
            .expect_update()
            .returning(|| panic!("disk vanished"));
        m.migrator.expect_migrate().never();
        let orchestrator = m.into_orchestrator(gate_with_deployments(vec![0, 0]));

        let err = orchestrator.run(SystemTime::now()).await.unwrap_err();

        assert!(matches!(
            err,
            UpgradeError::StageFailed {
                stage: Stage::UpdateConfiguration,
                maintenance_active: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_run_migration_failure_keeps_maintenance_and_reports_backup() {
        let mut m = Mocks::new();
        m.maintenance.expect_enter().returning(|| Ok(()));
        m.maintenance.expect_leave().never();
        m.configuration.expect_update().returning(|| Ok(outcome()));
        m.migrator
            .expect_migrate()
            .returning(|| Err(TaskError("exit status 1".to_string())));
        m.optimizer.expect_optimize().never();
        m.queue.expect_restart().never();
        let orchestrator = m.into_orchestrator(gate_with_deployments(vec![0, 0]));

        let err = orchestrator.run(SystemTime::now()).await.unwrap_err();

        match err {
            UpgradeError::StageFailed {
                stage, backup_path, ..
            } => {
                assert_eq!(stage, Stage::Migrate);
                assert_eq!(backup_path, Some(PathBuf::from("/srv/app/.env.prev")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_enter_maintenance_failure_aborts_without_update() {
        let mut m = Mocks::new();
        m.maintenance
            .expect_enter()
            .returning(|| Err(TaskError("artisan not found".to_string())));
        m.configuration.expect_update().never();
        let orchestrator = m.into_orchestrator(gate_with_deployments(vec![0]));

        let err = orchestrator.run(SystemTime::now()).await.unwrap_err();

        assert!(matches!(
            err,
            UpgradeError::StageFailed {
                stage: Stage::EnterMaintenance,
                maintenance_active: false,
                ..
            }
        ));
    }

    #[test]
    fn test_stage_display_is_human_readable() {
        assert_eq!(Stage::RestartQueue.to_string(), "restarting the queue");
    }
}
