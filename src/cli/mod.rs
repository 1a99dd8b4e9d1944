//! Command-line interface for ferryctl
//!
//! The command tree is built with clap's derive API:
//!
//! - `ferryctl upgrade [VERSION|rollback] [--check] [--force]`
//! - `ferryctl version [--json]`
//!
//! Global flags (`--verbose`, `--quiet`, `--config`) are folded into a
//! [`CliConfig`] once, before any command runs. Tests can build their own
//! [`CliConfig`] and call [`Cli::execute_with_config`].

pub mod upgrade;
pub mod version;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Settings derived from the global flags.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Default log level for ferryctl's own targets. `RUST_LOG` overrides it.
    pub log_level: LevelFilter,

    /// Configuration file to load instead of the default location.
    pub config_path: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::WARN,
            config_path: None,
        }
    }
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the stderr tracing subscriber.
    ///
    /// Only the first call in a process has an effect.
    pub fn init_tracing(&self) {
        let filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(self.log_level.into())
            .from_env_lossy();

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Root command of the ferryctl CLI.
#[derive(Parser, Debug)]
#[command(
    name = "ferryctl",
    about = "Manage remote resource configuration and the ferryctl binary itself",
    version,
    long_about = "ferryctl manages remote resource configuration. It can also upgrade itself \
                  from published releases and roll back to the previously installed binary."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "FERRYCTL_CONFIG_PATH", value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upgrade ferryctl to a newer release, or roll back the last upgrade
    Upgrade(upgrade::UpgradeCommand),

    /// Show version and build information
    Version(version::VersionCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Fold the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            LevelFilter::DEBUG
        } else if self.quiet {
            LevelFilter::ERROR
        } else {
            LevelFilter::WARN
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_tracing();

        match self.command {
            Commands::Upgrade(cmd) => cmd.execute(config.config_path).await,
            Commands::Version(cmd) => cmd.execute(),
        }
    }
}
