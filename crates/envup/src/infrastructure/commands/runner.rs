//! CommandRunner: runs one external command with a timeout.
//!
//! Commands are given as argument vectors (program first) and never go
//! through a shell.  Each run inherits envup's environment, runs in the
//! application root, and is killed if it outlives the timeout.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Maximum number of stderr bytes carried in an error.
const STDERR_EXCERPT_LEN: usize = 2048;

/// Error type for external commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no command configured for {0}")]
    NotConfigured(&'static str),

    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Captured output of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
}

/// Runs commands in a fixed working directory.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    cwd: PathBuf,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            cwd: cwd.into(),
            timeout,
        }
    }

    /// Runs `argv` to completion.
    ///
    /// # Errors
    ///
    /// [`CommandError::Failed`] for a non-zero exit, [`CommandError::TimedOut`]
    /// if the process was killed, [`CommandError::Spawn`] if it never started.
    pub async fn run(&self, argv: &[String]) -> Result<CommandOutput, CommandError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(CommandError::NotConfigured("an empty argument list"));
        };
        let command = argv.join(" ");
        debug!(%command, cwd = %self.cwd.display(), "running command");

        let child = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                return Err(CommandError::TimedOut {
                    command,
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(CommandError::Failed {
                command,
                status: output.status,
                stderr: excerpt(&output.stderr),
            });
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

fn excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    match trimmed.char_indices().nth(STDERR_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn runner() -> CommandRunner {
        CommandRunner::new(std::env::temp_dir(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let output = runner().run(&argv(&["echo", "2"])).await.unwrap();
        assert_eq!(output.stdout.trim(), "2");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_is_failed_with_stderr() {
        // Arrange
        let command = argv(&["sh", "-c", "echo boom >&2; exit 3"]);

        // Act
        let err = runner().run(&command).await.unwrap_err();

        // Assert
        match err {
            CommandError::Failed { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_missing_program_is_spawn_error() {
        let err = runner()
            .run(&argv(&["envup-test-no-such-program"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let runner = CommandRunner::new(std::env::temp_dir(), Duration::from_millis(100));
        let err = runner.run(&argv(&["sleep", "5"])).await.unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_run_empty_argv_is_not_configured() {
        let err = runner().run(&[]).await.unwrap_err();
        assert!(matches!(err, CommandError::NotConfigured(_)));
    }

    #[test]
    fn test_excerpt_truncates_long_output() {
        let long = "x".repeat(STDERR_EXCERPT_LEN + 10);
        let short = excerpt(long.as_bytes());
        assert_eq!(short.chars().count(), STDERR_EXCERPT_LEN + 1);
    }
}
