//! TOML-based settings for the upgrade command itself.
//!
//! These are envup's own settings (which files to merge, which commands to
//! run), not the application's `.env`.  They are read from `envup.toml` in the
//! application root, or from the path given with `--config`.
//!
//! ```toml
//! [paths]
//! env_file = ".env"
//! template_file = ".env.example"
//!
//! [gate]
//! freshness_window_secs = 600
//!
//! [commands]
//! migrate = ["php", "artisan", "migrate", "--force"]
//! ```
//!
//! # Serde default values
//!
//! Every field is annotated with `#[serde(default = "some_fn")]`, so a missing
//! file, a missing section, or a missing field all fall back to the defaults
//! for a Laravel-style application.  An empty command list disables that
//! step.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default settings file name, looked up in the application root.
pub const SETTINGS_FILE_NAME: &str = "envup.toml";

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Settings schema types ─────────────────────────────────────────────────────

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub gate: GateSettings,
    #[serde(default)]
    pub commands: CommandSettings,
}

/// File locations, relative to the application root unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathSettings {
    /// The operator's live environment file.
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
    /// The template shipped with the release.
    #[serde(default = "default_template_file")]
    pub template_file: PathBuf,
    /// Appended to the env file name to form the backup path.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
    /// File rewritten by every dependency install.
    #[serde(default = "default_dependency_marker")]
    pub dependency_marker: PathBuf,
}

/// Where the installation marker is read from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum InstallationSource {
    /// The envup process environment, for hosts that export the
    /// application's variables into the shell.
    Process,
    /// The persisted key in the live environment file.
    EnvFile,
}

/// Precondition settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateSettings {
    /// Maximum age of the dependency marker, in seconds.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,
    /// Variable that holds the application's encryption key.
    #[serde(default = "default_installation_key")]
    pub installation_key: String,
    /// Value the template ships for that key before installation.
    #[serde(default = "default_installation_placeholder")]
    pub installation_placeholder: String,
    #[serde(default = "default_installation_source")]
    pub installation_source: InstallationSource,
}

/// External commands, each given as program followed by arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandSettings {
    /// Per-command timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_maintenance_enter")]
    pub maintenance_enter: Vec<String>,
    #[serde(default = "default_maintenance_leave")]
    pub maintenance_leave: Vec<String>,
    #[serde(default = "default_migrate")]
    pub migrate: Vec<String>,
    #[serde(default = "default_optimize")]
    pub optimize: Vec<String>,
    #[serde(default = "default_queue_flush")]
    pub queue_flush: Vec<String>,
    #[serde(default = "default_queue_restart")]
    pub queue_restart: Vec<String>,
    /// Must print the number of `PENDING` + `DEPLOYING` deployments.
    #[serde(default = "default_active_deployments")]
    pub active_deployments: Vec<String>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}
fn default_template_file() -> PathBuf {
    PathBuf::from(".env.example")
}
fn default_backup_suffix() -> String {
    ".prev".to_string()
}
fn default_dependency_marker() -> PathBuf {
    PathBuf::from("vendor/autoload.php")
}
fn default_freshness_window_secs() -> u64 {
    600
}
fn default_installation_key() -> String {
    "APP_KEY".to_string()
}
fn default_installation_placeholder() -> String {
    "SomeRandomString".to_string()
}
fn default_installation_source() -> InstallationSource {
    InstallationSource::EnvFile
}
fn default_timeout_secs() -> u64 {
    300
}
fn artisan(args: &[&str]) -> Vec<String> {
    ["php", "artisan"]
        .iter()
        .chain(args)
        .map(|s| s.to_string())
        .collect()
}
fn default_maintenance_enter() -> Vec<String> {
    artisan(&["down"])
}
fn default_maintenance_leave() -> Vec<String> {
    artisan(&["up"])
}
fn default_migrate() -> Vec<String> {
    artisan(&["migrate", "--force"])
}
fn default_optimize() -> Vec<String> {
    artisan(&["optimize"])
}
fn default_queue_flush() -> Vec<String> {
    artisan(&["queue:flush"])
}
fn default_queue_restart() -> Vec<String> {
    artisan(&["queue:restart"])
}
fn default_active_deployments() -> Vec<String> {
    artisan(&["deployments:active"])
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            env_file: default_env_file(),
            template_file: default_template_file(),
            backup_suffix: default_backup_suffix(),
            dependency_marker: default_dependency_marker(),
        }
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            freshness_window_secs: default_freshness_window_secs(),
            installation_key: default_installation_key(),
            installation_placeholder: default_installation_placeholder(),
            installation_source: default_installation_source(),
        }
    }
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            maintenance_enter: default_maintenance_enter(),
            maintenance_leave: default_maintenance_leave(),
            migrate: default_migrate(),
            optimize: default_optimize(),
            queue_flush: default_queue_flush(),
            queue_restart: default_queue_restart(),
            active_deployments: default_active_deployments(),
        }
    }
}

impl GateSettings {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }
}

impl CommandSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Absolute file locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub target: PathBuf,
    pub template: PathBuf,
    pub backup: PathBuf,
    pub dependency_marker: PathBuf,
}

impl PathSettings {
    /// Resolves every path against `app_root`.
    pub fn resolve(&self, app_root: &Path) -> ResolvedPaths {
        let target = app_root.join(&self.env_file);
        let backup = with_suffix(&target, &self.backup_suffix);
        ResolvedPaths {
            template: app_root.join(&self.template_file),
            dependency_marker: app_root.join(&self.dependency_marker),
            target,
            backup,
        }
    }
}

/// Appends `suffix` to the file name of `path` (`.env` + `.prev` → `.env.prev`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

// ── Settings loading ──────────────────────────────────────────────────────────

/// Loads settings from `path`, returning `Settings::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system errors other than "not found",
/// and [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
