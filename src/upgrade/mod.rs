//! Self-upgrade and rollback for the ferryctl binary.
//!
//! This module decides whether the running binary may be upgraded on the
//! current platform, locates and downloads the matching release artifact,
//! replaces the executable with atomic renames, and keeps the replaced binary
//! so a later invocation can roll back to it.
//!
//! # Architecture Overview
//!
//! - **[`UpgradeCoordinator`]**: the state machine tying the pieces together
//! - **[`PlatformPolicy`]**: which platforms may upgrade and which may roll back
//! - **[`VersionOracle`]**: strict version parsing and eligibility decisions
//! - **[`ReleaseLocator`]**: maps a version selector and platform to an artifact,
//!   through the [`ReleaseSource`] seam ([`GitHubReleaseSource`] in production)
//! - **[`ExecutableReplacer`]**: stage, promote and rollback on the filesystem
//! - **[`BuildInfo`]**: version and build metadata compiled into the binary
//!
//! ## Upgrade Flow
//!
//! ```text
//! 1. PlatformChecked
//!    ├── Consult PlatformPolicy for the upgrade operation
//!    └── Refuse Homebrew-managed installs on macOS
//!
//! 2. VersionChecked
//!    ├── Parse the running version (malformed is fatal)
//!    ├── Resolve the target release and platform artifact
//!    └── Require the target to be strictly newer (unless --force)
//!
//! 3. Fetched
//!    ├── Download the artifact
//!    └── Verify against <artifact>.sha256 when published
//!
//! 4. Staged / Promoted
//!    ├── Write the artifact to <exe>.staging and mark it executable
//!    ├── Copy <exe> to <exe>.backup (current stays in place)
//!    └── Rename <exe>.staging over <exe>
//! ```
//!
//! Rollback skips steps 2-4: after the rollback policy check it renames
//! `<exe>.backup` over `<exe>`. Only one backup is kept, and a rollback
//! consumes it.
//!
//! # Platform Support
//!
//! Linux and macOS support both operations by default. Windows is disabled
//! for both, because a running `.exe` cannot be renamed over; the
//! `[upgrade.policy]` table can change either list independently.
//!
//! # Error Handling
//!
//! Every step reports its own [`UpgradeError`] variant and the coordinator
//! returns it unchanged. [`UpgradeError::AlreadyUpToDate`] is informational;
//! [`UpgradeError::Transport`] is the only kind worth retrying.

pub mod build;
/// Configuration structures for upgrade behavior.
pub mod config;
pub mod coordinator;
pub mod error;
pub mod platform;
pub mod release;
/// Staging, promotion and rollback of the executable on disk.
pub mod replacer;
/// Checksum verification of downloaded artifacts.
pub mod verification;
pub mod version;

pub use build::BuildInfo;
pub use config::UpgradeConfig;
pub use coordinator::{RollbackOutcome, UpgradeCoordinator, UpgradeOutcome, UpgradeState};
pub use error::UpgradeError;
pub use platform::{Operation, Platform, PlatformPolicy};
pub use release::{
    GitHubReleaseSource, Release, ReleaseAsset, ReleaseLocator, ReleaseReference, ReleaseSource,
    VersionSelector,
};
pub use replacer::{BackupRecord, ExecutableReplacer, ExecutableState};
pub use verification::ChecksumVerifier;
pub use version::{Eligibility, SemanticVersion, VersionOracle};
