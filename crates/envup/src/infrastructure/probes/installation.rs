//! Installation-state providers.
//!
//! The application counts as installed when its encryption key is present,
//! non-empty, and not the placeholder the template ships with.

use std::path::PathBuf;

use envup_core::ConfigKey;
use tracing::{debug, warn};

use crate::application::upgrade_gate::InstallationStateProvider;
use crate::infrastructure::storage::env_file;

fn is_real_key(value: Option<&str>, placeholder: &str) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => v != placeholder,
    }
}

/// Reads the key from envup's own process environment.
#[derive(Debug, Clone)]
pub struct EnvVarInstallation {
    variable: String,
    placeholder: String,
}

impl EnvVarInstallation {
    pub fn new(variable: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            placeholder: placeholder.into(),
        }
    }
}

impl InstallationStateProvider for EnvVarInstallation {
    fn is_installed(&self) -> bool {
        let value = std::env::var(&self.variable).ok();
        let installed = is_real_key(value.as_deref(), &self.placeholder);
        debug!(variable = %self.variable, installed, "checked process environment");
        installed
    }
}

/// Reads the key from the live environment file.
#[derive(Debug, Clone)]
pub struct EnvFileInstallation {
    path: PathBuf,
    key: Option<ConfigKey>,
    placeholder: String,
}

impl EnvFileInstallation {
    /// `key` is an identifier such as `APP_KEY`.  An identifier without a
    /// section separator can never be stored in the file, so such a provider
    /// always reports "not installed".
    pub fn new(path: impl Into<PathBuf>, key: &str, placeholder: impl Into<String>) -> Self {
        let parsed = ConfigKey::parse(key);
        if let Err(e) = &parsed {
            warn!(key, error = %e, "installation key cannot appear in an environment file");
        }
        Self {
            path: path.into(),
            key: parsed.ok(),
            placeholder: placeholder.into(),
        }
    }
}

impl InstallationStateProvider for EnvFileInstallation {
    fn is_installed(&self) -> bool {
        let Some(key) = &self.key else {
            return false;
        };
        match env_file::parse(&self.path) {
            Ok(parsed) => is_real_key(parsed.map.get(key), &self.placeholder),
            Err(e) => {
                debug!(error = %e, "environment file unreadable, treating as not installed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── Shared rule ───────────────────────────────────────────────────────────

    #[test]
    fn test_real_key_is_installed() {
        assert!(is_real_key(Some("base64:abc=="), "SomeRandomString"));
    }

    #[test]
    fn test_missing_empty_or_placeholder_is_not_installed() {
        assert!(!is_real_key(None, "SomeRandomString"));
        assert!(!is_real_key(Some(""), "SomeRandomString"));
        assert!(!is_real_key(Some("   "), "SomeRandomString"));
        assert!(!is_real_key(Some("SomeRandomString"), "SomeRandomString"));
    }

    // ── Process environment ───────────────────────────────────────────────────

    #[test]
    fn test_env_var_installation_reads_process_environment() {
        // Arrange: a variable name no other test touches.
        let variable = "ENVUP_TEST_INSTALLATION_KEY_PRESENT";
        std::env::set_var(variable, "base64:abc==");
        let provider = EnvVarInstallation::new(variable, "SomeRandomString");

        // Act / Assert
        assert!(provider.is_installed());
        std::env::remove_var(variable);
    }

    #[test]
    fn test_env_var_installation_unset_variable_is_not_installed() {
        let provider = EnvVarInstallation::new("ENVUP_TEST_INSTALLATION_KEY_UNSET", "x");
        assert!(!provider.is_installed());
    }

    // ── Environment file ──────────────────────────────────────────────────────

    #[test]
    fn test_env_file_installation_with_real_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "APP_ENV=production\nAPP_KEY=base64:abc==\n").unwrap();

        let provider = EnvFileInstallation::new(&path, "APP_KEY", "SomeRandomString");

        assert!(provider.is_installed());
    }

    #[test]
    fn test_env_file_installation_with_placeholder_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "APP_KEY=SomeRandomString\n").unwrap();

        let provider = EnvFileInstallation::new(&path, "APP_KEY", "SomeRandomString");

        assert!(!provider.is_installed());
    }

    #[test]
    fn test_env_file_installation_missing_file_is_not_installed() {
        let dir = TempDir::new().unwrap();
        let provider = EnvFileInstallation::new(dir.path().join(".env"), "APP_KEY", "x");
        assert!(!provider.is_installed());
    }

    #[test]
    fn test_env_file_installation_key_without_separator_is_never_installed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "APP_KEY=base64:abc==\n").unwrap();

        let provider = EnvFileInstallation::new(&path, "APPKEY", "x");

        assert!(!provider.is_installed());
    }
}
