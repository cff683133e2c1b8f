//! UpgradeGate: precondition checks that run before anything is touched.
//!
//! Three independent checks must all pass:
//!
//! 1. **Installed** – the application has a real encryption key, not the
//!    template placeholder.  Upgrading a half-installed application would
//!    write a `.env` whose key is the placeholder.
//! 2. **Idle** – no deployment is `PENDING` or `DEPLOYING`.  Restarting the
//!    queue underneath a running deployment would kill it.
//! 3. **Fresh dependencies** – the dependency-install artifact was written
//!    within the freshness window, i.e. the operator ran the dependency
//!    install for this release before upgrading.
//!
//! The checks run in that order and stop at the first failure.  Every failure
//! carries an operator-facing title and instruction (see [`GateFailure`]).
//!
//! # Advisory, not atomic
//!
//! The idle check is admission control, not a lock: a deployment could start
//! between the check and maintenance mode being entered.  The orchestrator
//! closes that window with [`UpgradeGate::recheck_deployments`] once
//! maintenance mode is on.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// How recent the dependency install must be.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(600);

/// Error raised by a probe that could not answer its question.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ProbeError(pub String);

/// Answers "has the application been installed?".
///
/// Abstracted so tests can substitute fixtures instead of mutating the real
/// process environment.
#[cfg_attr(test, mockall::automock)]
pub trait InstallationStateProvider: Send + Sync {
    fn is_installed(&self) -> bool;
}

/// Counts deployments in the `PENDING` or `DEPLOYING` state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeploymentStateProbe: Send + Sync {
    async fn count_active_deployments(&self) -> Result<u64, ProbeError>;
}

/// Reports when dependencies were last installed.
#[cfg_attr(test, mockall::automock)]
pub trait DependencyFreshnessProbe: Send + Sync {
    /// Returns the modification time of the install artifact, or `None` if
    /// the artifact does not exist at all.
    fn last_dependency_install_time(&self) -> Result<Option<SystemTime>, ProbeError>;
}

/// Why the gate refused the upgrade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateFailure {
    #[error("the application has not been installed")]
    NotInstalled,

    #[error("{count} deployment(s) are pending or in progress")]
    DeploymentsInProgress { count: u64 },

    #[error("dependencies were not installed within the last {window:?}")]
    DependenciesOutdated {
        window: Duration,
        /// How long ago the artifact was written; `None` if it is missing.
        age: Option<Duration>,
    },

    #[error("could not check {check}: {reason}")]
    ProbeFailed { check: &'static str, reason: String },
}

impl GateFailure {
    /// Short headline shown at the top of the operator message block.
    pub fn title(&self) -> &'static str {
        match self {
            GateFailure::NotInstalled => "The application has not been installed",
            GateFailure::DeploymentsInProgress { .. } => "Deployments in progress",
            GateFailure::DependenciesOutdated { .. } => "Update not complete!",
            GateFailure::ProbeFailed { .. } => "Unable to verify the installation",
        }
    }

    /// What the operator should do about it.
    pub fn instruction(&self) -> String {
        match self {
            GateFailure::NotInstalled => {
                "Please use the install command instead.".to_string()
            }
            GateFailure::DeploymentsInProgress { .. } => {
                "There are still running deployments, please wait for them to finish before updating."
                    .to_string()
            }
            GateFailure::DependenciesOutdated { .. } => {
                "Please run the dependency install (e.g. \"composer install\") before you continue."
                    .to_string()
            }
            GateFailure::ProbeFailed { check, reason } => {
                format!("Checking {check} failed: {reason}")
            }
        }
    }
}

/// Runs the precondition checks against injected probes.
#[derive(Clone)]
pub struct UpgradeGate {
    installation: Arc<dyn InstallationStateProvider>,
    deployments: Arc<dyn DeploymentStateProbe>,
    dependencies: Arc<dyn DependencyFreshnessProbe>,
    freshness_window: Duration,
}

impl UpgradeGate {
    pub fn new(
        installation: Arc<dyn InstallationStateProvider>,
        deployments: Arc<dyn DeploymentStateProbe>,
        dependencies: Arc<dyn DependencyFreshnessProbe>,
    ) -> Self {
        Self {
            installation,
            deployments,
            dependencies,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
        }
    }

    /// Overrides [`DEFAULT_FRESHNESS_WINDOW`].
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Runs all checks as of `now`.
    ///
    /// # Errors
    ///
    /// Returns the first [`GateFailure`] encountered.
    pub async fn check(&self, now: SystemTime) -> Result<(), GateFailure> {
        self.check_installed()?;
        self.recheck_deployments().await?;
        self.check_dependencies(now)?;
        info!("upgrade gate passed");
        Ok(())
    }

    /// Counts active deployments again.  Used after maintenance mode is
    /// entered, when no new deployment can start.
    ///
    /// # Errors
    ///
    /// Returns [`GateFailure::DeploymentsInProgress`] if any are active, or
    /// [`GateFailure::ProbeFailed`] if the count is unavailable.
    pub async fn recheck_deployments(&self) -> Result<(), GateFailure> {
        let count = self
            .deployments
            .count_active_deployments()
            .await
            .map_err(|e| GateFailure::ProbeFailed {
                check: "active deployments",
                reason: e.0,
            })?;
        debug!(count, "active deployments");
        if count > 0 {
            return Err(GateFailure::DeploymentsInProgress { count });
        }
        Ok(())
    }

    fn check_installed(&self) -> Result<(), GateFailure> {
        if self.installation.is_installed() {
            Ok(())
        } else {
            Err(GateFailure::NotInstalled)
        }
    }

    fn check_dependencies(&self, now: SystemTime) -> Result<(), GateFailure> {
        let installed_at = self
            .dependencies
            .last_dependency_install_time()
            .map_err(|e| GateFailure::ProbeFailed {
                check: "dependency install time",
                reason: e.0,
            })?;

        let Some(installed_at) = installed_at else {
            return Err(GateFailure::DependenciesOutdated {
                window: self.freshness_window,
                age: None,
            });
        };

        // A timestamp in the future (clock skew) counts as fresh.
        let age = now.duration_since(installed_at).unwrap_or(Duration::ZERO);
        debug!(age_secs = age.as_secs(), "dependency install age");
        if age > self.freshness_window {
            return Err(GateFailure::DependenciesOutdated {
                window: self.freshness_window,
                age: Some(age),
            });
        }
        Ok(())
    }
}
