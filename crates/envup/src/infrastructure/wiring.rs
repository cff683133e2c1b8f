//! Composition root: builds an [`UpgradeOrchestrator`] from [`Settings`].
//!
//! This is the only place where concrete adapters are chosen.  Everything
//! else depends on the application-layer traits.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::orchestrate_upgrade::{UpgradeOrchestrator, UpgradeTasks};
use crate::application::upgrade_gate::{InstallationStateProvider, UpgradeGate};

use super::commands::hooks::CommandHooks;
use super::commands::runner::CommandRunner;
use super::probes::dependencies::ArtifactMtimeProbe;
use super::probes::installation::{EnvFileInstallation, EnvVarInstallation};
use super::storage::env_store::EnvFileStore;
use super::storage::lock::DEFAULT_LOCK_TIMEOUT;
use super::storage::settings::{InstallationSource, Settings};

/// Wires the production adapters for the application at `app_root`.
pub fn build_orchestrator(settings: &Settings, app_root: &Path) -> UpgradeOrchestrator {
    let paths = settings.paths.resolve(app_root);
    debug!(?paths, "resolved upgrade paths");

    let gate_settings = &settings.gate;
    let installation: Arc<dyn InstallationStateProvider> = match gate_settings.installation_source
    {
        InstallationSource::Process => Arc::new(EnvVarInstallation::new(
            gate_settings.installation_key.clone(),
            gate_settings.installation_placeholder.clone(),
        )),
        InstallationSource::EnvFile => Arc::new(EnvFileInstallation::new(
            paths.target.clone(),
            &gate_settings.installation_key,
            gate_settings.installation_placeholder.clone(),
        )),
    };

    let runner = CommandRunner::new(app_root, settings.commands.timeout());
    let hooks = Arc::new(CommandHooks::new(runner, settings.commands.clone()));

    let gate = UpgradeGate::new(
        installation,
        hooks.clone(),
        Arc::new(ArtifactMtimeProbe::new(paths.dependency_marker.clone())),
    )
    .with_freshness_window(gate_settings.freshness_window());

    let tasks = UpgradeTasks {
        maintenance: hooks.clone(),
        configuration: Arc::new(EnvFileStore::new(&paths, DEFAULT_LOCK_TIMEOUT)),
        migrator: hooks.clone(),
        optimizer: hooks.clone(),
        queue: hooks,
    };

    UpgradeOrchestrator::new(gate, tasks)
}
