use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use crate::config::GlobalConfig;
use crate::upgrade::{
    BuildInfo, ExecutableReplacer, GitHubReleaseSource, Platform, ReleaseLocator, ReleaseSource,
    UpgradeCoordinator, VersionSelector,
};

/// Command-line arguments for `ferryctl upgrade`.
///
/// # Examples
///
/// ```bash
/// # Upgrade to the latest release
/// ferryctl upgrade
///
/// # Only report whether an upgrade is available
/// ferryctl upgrade --check
///
/// # Install a specific release, even if it is older
/// ferryctl upgrade v0.2.19 --force
///
/// # Restore the binary replaced by the last upgrade
/// ferryctl upgrade rollback
/// ```
#[derive(Args, Debug)]
pub struct UpgradeCommand {
    /// Release to install (`latest` by default), or `rollback` to restore the
    /// previous binary
    #[arg(value_name = "VERSION|rollback")]
    pub target: Option<String>,

    /// Restore the binary replaced by the last successful upgrade
    #[arg(long, conflicts_with_all = ["check", "force"])]
    pub rollback: bool,

    /// Check whether an upgrade is available without installing it
    #[arg(long)]
    pub check: bool,

    /// Install the target even if it is not newer than the running version
    #[arg(long)]
    pub force: bool,
}

/// What the arguments ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeMode {
    Upgrade(VersionSelector),
    Check(VersionSelector),
    Rollback,
}

impl UpgradeCommand {
    /// Resolve the arguments into a mode.
    ///
    /// A `rollback` selector short-circuits everything else.
    pub fn mode(&self) -> Result<UpgradeMode> {
        let rollback_selected =
            self.target.as_deref().is_some_and(|t| t.trim().eq_ignore_ascii_case("rollback"));

        if self.rollback || rollback_selected {
            if self.check || self.force || (self.rollback && self.target.is_some()) {
                bail!("`rollback` cannot be combined with a version, --check or --force");
            }
            return Ok(UpgradeMode::Rollback);
        }

        let selector = VersionSelector::parse(self.target.as_deref())?;
        Ok(if self.check {
            UpgradeMode::Check(selector)
        } else {
            UpgradeMode::Upgrade(selector)
        })
    }

    /// Run against the configured release host and the real executable.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let global = GlobalConfig::load_with_optional(config_path).await?;
        let config = &global.upgrade;

        let executable = config.executable_path()?;
        debug!("Upgrade target executable: {}", executable.display());

        let source = GitHubReleaseSource::new(config)?;
        let coordinator = UpgradeCoordinator::new(
            Platform::current(),
            BuildInfo::current(),
            ReleaseLocator::new(source, &config.bin_name),
            ExecutableReplacer::new(executable),
        )
        .with_policy(config.policy.clone())
        .verify_checksum(config.verify_checksum)
        .force(self.force);

        self.run(coordinator).await
    }

    /// Drive `coordinator` according to the arguments and print the outcome.
    ///
    /// Informational outcomes such as "already up to date" are printed and
    /// treated as success.
    pub async fn run<S: ReleaseSource>(self, mut coordinator: UpgradeCoordinator<S>) -> Result<()> {
        let result = match self.mode()? {
            UpgradeMode::Rollback => {
                println!("{}", "Rolling back to previous version...".yellow());
                coordinator.rollback().await.map(|outcome| {
                    println!("{}", outcome.message().green());
                })
            }
            UpgradeMode::Check(target) => {
                println!("{}", "Checking for updates...".cyan());
                let current = coordinator.build().version.clone();
                coordinator.check(&target).await.map(|reference| {
                    println!(
                        "{} {} -> {}",
                        "Update available:".green().bold(),
                        current.yellow(),
                        reference.version.to_string().green()
                    );
                    println!("Run `ferryctl upgrade` to install it");
                })
            }
            UpgradeMode::Upgrade(target) => {
                println!("{} {}", "Upgrading ferryctl to".cyan(), target.to_string().cyan());
                coordinator.upgrade(&target).await.map(|outcome| {
                    println!("{}", outcome.message().green());
                    println!(
                        "Previous version {} kept at {}",
                        outcome.previous,
                        outcome.backup_path.display()
                    );
                    println!("Run `ferryctl upgrade rollback` to restore it");
                })
            }
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_informational() => {
                println!("{}", e.to_string().green());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
