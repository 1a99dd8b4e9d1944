//! The upgrade and rollback state machine.
//!
//! ```text
//! upgrade:  Idle -> PlatformChecked -> VersionChecked -> Fetched -> Staged -> Promoted
//! rollback: Idle -> PlatformChecked -> RolledBack
//! ```
//!
//! Any step may instead end in `Failed`, carrying the step's own
//! [`UpgradeError`] back to the caller unchanged. Steps run strictly one
//! after another; nothing is retried.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use super::build::BuildInfo;
use super::error::UpgradeError;
use super::platform::{Operation, Platform, PlatformPolicy};
use super::release::{ReleaseLocator, ReleaseReference, ReleaseSource, VersionSelector};
use super::replacer::ExecutableReplacer;
use super::verification::ChecksumVerifier;
use super::version::{Eligibility, SemanticVersion, VersionOracle};

/// Progress of a single coordinator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeState {
    Idle,
    PlatformChecked,
    VersionChecked,
    Fetched,
    Staged,
    Promoted,
    RolledBack,
    Failed,
}

/// Result of a successful upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOutcome {
    /// Version that was running before the upgrade.
    pub previous: SemanticVersion,
    /// Version now installed at the executable path.
    pub installed: SemanticVersion,
    /// Where the previous binary was retained.
    pub backup_path: PathBuf,
}

impl UpgradeOutcome {
    pub fn message(&self) -> String {
        format!("Successfully updated to version {}", self.installed)
    }
}

/// Result of a successful rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackOutcome {
    /// Version restored, when the backup record named one.
    pub restored: Option<String>,
    /// Executable path that now holds the restored binary.
    pub path: PathBuf,
}

impl RollbackOutcome {
    pub fn message(&self) -> String {
        match &self.restored {
            Some(version) => format!("Successfully rolled back to version {version}"),
            None => "Successfully rolled back to the previous version".to_string(),
        }
    }
}

/// Drives one upgrade, check or rollback against injected collaborators.
///
/// The running platform and build are constructor parameters, so the same
/// coordinator logic runs unchanged under test with any platform.
///
/// # Examples
///
/// ```rust,no_run
/// use ferryctl::upgrade::{
///     BuildInfo, ExecutableReplacer, GitHubReleaseSource, Platform, ReleaseLocator,
///     UpgradeConfig, UpgradeCoordinator, VersionSelector,
/// };
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = UpgradeConfig::default();
/// let locator = ReleaseLocator::new(GitHubReleaseSource::new(&config)?, &config.bin_name);
/// let replacer = ExecutableReplacer::new(config.executable_path()?);
/// let mut coordinator =
///     UpgradeCoordinator::new(Platform::current(), BuildInfo::current(), locator, replacer);
///
/// let outcome = coordinator.upgrade(&VersionSelector::Latest).await?;
/// println!("{}", outcome.message());
/// # Ok(())
/// # }
/// ```
pub struct UpgradeCoordinator<S> {
    platform: Platform,
    policy: PlatformPolicy,
    build: BuildInfo,
    locator: ReleaseLocator<S>,
    replacer: ExecutableReplacer,
    verify_checksum: bool,
    force: bool,
    state: UpgradeState,
}

impl<S: ReleaseSource> UpgradeCoordinator<S> {
    pub fn new(
        platform: Platform,
        build: BuildInfo,
        locator: ReleaseLocator<S>,
        replacer: ExecutableReplacer,
    ) -> Self {
        Self {
            platform,
            policy: PlatformPolicy::default(),
            build,
            locator,
            replacer,
            verify_checksum: true,
            force: false,
            state: UpgradeState::Idle,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PlatformPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn verify_checksum(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    /// Install the target even when it is not newer than the running build.
    #[must_use]
    pub fn force(mut self, enabled: bool) -> Self {
        self.force = enabled;
        self
    }

    pub fn state(&self) -> UpgradeState {
        self.state
    }

    pub fn build(&self) -> &BuildInfo {
        &self.build
    }

    pub fn replacer(&self) -> &ExecutableReplacer {
        &self.replacer
    }

    pub fn locator(&self) -> &ReleaseLocator<S> {
        &self.locator
    }

    /// Replace the executable with the release selected by `target`.
    pub async fn upgrade(&mut self, target: &VersionSelector) -> Result<UpgradeOutcome, UpgradeError> {
        let result = self.run_upgrade(target).await;
        self.settle(result)
    }

    /// Stop after VersionChecked and report the candidate release.
    ///
    /// Nothing is downloaded and the filesystem is not touched.
    pub async fn check(&mut self, target: &VersionSelector) -> Result<ReleaseReference, UpgradeError> {
        let result = self.run_check(target).await;
        self.settle(result)
    }

    /// Restore the binary retained by the last successful upgrade.
    pub async fn rollback(&mut self) -> Result<RollbackOutcome, UpgradeError> {
        let result = self.run_rollback().await;
        self.settle(result)
    }

    async fn run_upgrade(&mut self, target: &VersionSelector) -> Result<UpgradeOutcome, UpgradeError> {
        let (current, reference) = self.run_version_check(target).await?;

        let artifact = self.locator.fetch(&reference).await?;
        if self.verify_checksum {
            match self.locator.fetch_checksum(&reference).await? {
                Some(listing) => {
                    ChecksumVerifier::verify_listing(&artifact, &listing, &reference.artifact)?;
                }
                None => warn!("No checksum published for {}; skipping verification", reference.artifact),
            }
        }
        self.transition(UpgradeState::Fetched);

        let staged = self.replacer.stage(&artifact).await?;
        self.transition(UpgradeState::Staged);

        self.replacer.promote(&staged, &current.to_string()).await?;
        self.transition(UpgradeState::Promoted);
        info!("Upgraded {} -> {}", current, reference.version);

        Ok(UpgradeOutcome {
            previous: current,
            installed: reference.version,
            backup_path: self.replacer.state().backup.clone(),
        })
    }

    async fn run_check(&mut self, target: &VersionSelector) -> Result<ReleaseReference, UpgradeError> {
        let (_, reference) = self.run_version_check(target).await?;
        Ok(reference)
    }

    async fn run_version_check(
        &mut self,
        target: &VersionSelector,
    ) -> Result<(SemanticVersion, ReleaseReference), UpgradeError> {
        self.check_platform(Operation::Upgrade).await?;

        let current = self.build.parse_version()?;
        debug!("Running version {}, target {}", current, target);

        // An explicit target can be judged without asking the release host.
        if let VersionSelector::Exact(candidate) = target {
            self.decide(&current, candidate)?;
        }
        let reference = self.locator.resolve(target, self.platform).await?;
        if matches!(target, VersionSelector::Latest) {
            self.decide(&current, &reference.version)?;
        }

        self.transition(UpgradeState::VersionChecked);
        Ok((current, reference))
    }

    async fn run_rollback(&mut self) -> Result<RollbackOutcome, UpgradeError> {
        self.check_platform(Operation::Rollback).await?;

        let record = self.replacer.rollback().await?;
        self.transition(UpgradeState::RolledBack);

        Ok(RollbackOutcome {
            restored: record.map(|record| record.version),
            path: self.replacer.state().current.clone(),
        })
    }

    async fn check_platform(&mut self, operation: Operation) -> Result<(), UpgradeError> {
        self.policy.check(operation, self.platform)?;

        if operation == Operation::Upgrade && self.platform == Platform::Darwin {
            let current = &self.replacer.state().current;
            let resolved = tokio::fs::canonicalize(current).await.unwrap_or_else(|_| current.clone());
            if is_homebrew_path(&resolved) {
                return Err(UpgradeError::ManagedInstallation {
                    manager: "Homebrew".to_string(),
                    command: "brew upgrade ferryctl".to_string(),
                });
            }
        }

        self.transition(UpgradeState::PlatformChecked);
        Ok(())
    }

    fn decide(&self, current: &SemanticVersion, candidate: &SemanticVersion) -> Result<(), UpgradeError> {
        let eligibility = VersionOracle::eligibility(current, candidate);
        match eligibility {
            Eligibility::Eligible => Ok(()),
            _ if self.force => {
                warn!("Forcing {} -> {} despite {:?}", current, candidate, eligibility);
                Ok(())
            }
            Eligibility::UpToDate => Err(UpgradeError::AlreadyUpToDate {
                current: current.to_string(),
                available: candidate.to_string(),
            }),
            Eligibility::Unsupported => {
                let development = if current.is_development() { current } else { candidate };
                Err(UpgradeError::DevelopmentBuild {
                    version: development.to_string(),
                })
            }
        }
    }

    fn transition(&mut self, next: UpgradeState) {
        debug!("Upgrade state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn settle<T>(&mut self, result: Result<T, UpgradeError>) -> Result<T, UpgradeError> {
        if let Err(e) = &result {
            if e.is_informational() {
                info!("{}", e);
            } else {
                warn!("Upgrade failed in state {:?}: {}", self.state, e);
            }
            self.transition(UpgradeState::Failed);
        }
        result
    }
}

fn is_homebrew_path(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name == "Cellar" || name == "homebrew",
        _ => false,
    })
}
