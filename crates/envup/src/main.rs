//! `envup` entry point.
//!
//! Parses the command line, loads `envup.toml`, wires the production adapters
//! and runs the upgrade once.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_settings()         -- envup.toml, defaults if absent
//!  └─ build_orchestrator()    -- probes, command hooks, .env store
//!  └─ UpgradeOrchestrator::run()
//!       ├─ UpgradeGate        (installed, idle, fresh dependencies)
//!       ├─ maintenance mode on
//!       ├─ .env merge         (backup, template baseline, atomic replace)
//!       ├─ migrate, optimize, restart queue
//!       └─ maintenance mode off
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use envup::infrastructure::console;
use envup::infrastructure::storage::settings::{load_settings, SETTINGS_FILE_NAME};
use envup::infrastructure::wiring::build_orchestrator;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Upgrades an installed application in place.
///
/// The operator's `.env` is merged with the template shipped in the new
/// release: existing values are kept, new keys take their defaults, and keys
/// the template no longer declares are dropped.
#[derive(Debug, Parser)]
#[command(name = "envup", version)]
struct Cli {
    /// Root directory of the application being upgraded.
    #[arg(long, global = true, default_value = ".", env = "ENVUP_APP_ROOT")]
    app_root: PathBuf,

    /// Settings file (defaults to `envup.toml` in the application root).
    #[arg(long, global = true, env = "ENVUP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the upgrade: checks, maintenance mode, .env merge, migrations,
    /// cache rebuild and queue restart.
    Update,
}

impl Cli {
    fn settings_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.app_root.join(SETTINGS_FILE_NAME))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // `RUST_LOG` overrides the default `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings_path = cli.settings_path();
    let settings = load_settings(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;

    match cli.command {
        Command::Update => {
            info!(app_root = %cli.app_root.display(), "starting update");
            let orchestrator = build_orchestrator(&settings, &cli.app_root);
            match orchestrator.run(SystemTime::now()).await {
                Ok(report) => {
                    print!("{}", console::render_success(&report));
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprint!("{}", console::render_failure(&e));
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
