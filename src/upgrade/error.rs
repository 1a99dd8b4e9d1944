//! Error taxonomy for the self-upgrade subsystem.
//!
//! Every step of an upgrade or rollback returns its own [`UpgradeError`]
//! variant, and the coordinator passes it up unchanged. The caller picks
//! a remediation per kind: retry the whole command after a transport
//! failure, pick another version after [`UpgradeError::NotFound`], or
//! accept that [`UpgradeError::NoBackupAvailable`] means there is nothing
//! to revert to.

use std::path::PathBuf;
use thiserror::Error;

use super::platform::{Operation, Platform};

/// Failure kinds produced by the upgrade and rollback paths.
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// The requested operation is disabled for this platform by policy.
    #[error("ferryctl {operation} is not supported on {platform}")]
    UnsupportedPlatform {
        /// Operation that was requested.
        operation: Operation,
        /// Platform the process is running on.
        platform: Platform,
    },

    /// The executable is owned by a package manager that must perform upgrades itself.
    #[error("ferryctl was installed with {manager} and must be upgraded through it")]
    ManagedInstallation {
        /// Name of the package manager.
        manager: String,
        /// Command the user should run instead.
        command: String,
    },

    /// A version string did not have the form `vX.Y.Z[-suffix][+build]`.
    #[error("Invalid version '{input}': {reason}")]
    VersionParse {
        /// The raw string that failed to parse.
        input: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Development and snapshot builds are never compared against releases.
    #[error("Version {version} is a development build; upgrade eligibility cannot be determined")]
    DevelopmentBuild {
        /// The development version string.
        version: String,
    },

    /// The running binary is already at or past the candidate release.
    #[error("Already up to date: running {current}, newest candidate is {available}")]
    AlreadyUpToDate {
        /// Version of the running binary.
        current: String,
        /// Version that was considered.
        available: String,
    },

    /// No artifact exists for the requested (version, platform) pair.
    #[error("No release artifact '{artifact}' found for version {version} on {platform}")]
    NotFound {
        /// Requested version, or `latest`.
        version: String,
        /// Platform the artifact was looked up for.
        platform: Platform,
        /// Artifact file name that was expected.
        artifact: String,
    },

    /// The release host could not be reached or returned an unusable response.
    #[error("Network error while {operation}: {reason}")]
    Transport {
        /// What was being attempted.
        operation: String,
        /// Underlying failure as reported by the transport.
        reason: String,
    },

    /// The downloaded artifact does not match its published digest.
    #[error("Checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Artifact that was verified.
        artifact: String,
        /// Published digest.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// A filesystem step of stage/promote/rollback failed.
    ///
    /// The replacer guarantees that the current executable path still holds
    /// a working binary whenever this is returned.
    #[error("Failed to {operation}: {}", path.display())]
    Replace {
        /// Step that failed.
        operation: String,
        /// Path the step operated on.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Rollback was requested but no backup binary is retained.
    #[error("No backup found at {}; nothing to roll back", path.display())]
    NoBackupAvailable {
        /// Deterministic backup location that was checked.
        path: PathBuf,
    },
}

impl UpgradeError {
    /// Build a [`UpgradeError::Transport`] from any displayable failure.
    pub fn transport(operation: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Transport {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`UpgradeError::Replace`] for a failed filesystem step.
    pub fn replace(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Replace {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// True for outcomes that are not failures from the user's point of view.
    #[must_use]
    pub const fn is_informational(&self) -> bool {
        matches!(self, Self::AlreadyUpToDate { .. })
    }

    /// True for failures where re-running the same command may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Remediation hint shown alongside the error.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        let hint = match self {
            Self::UnsupportedPlatform {
                operation: Operation::Upgrade,
                platform: Platform::Windows,
            } => "Download the latest release for Windows from the project's releases page and replace the executable manually".to_string(),
            Self::UnsupportedPlatform {
                operation,
                platform,
            } => format!(
                "Reinstall ferryctl manually; {operation} is not available on {platform}"
            ),
            Self::ManagedInstallation {
                command, ..
            } => format!("Run `{command}` instead"),
            Self::VersionParse {
                ..
            } => "This build reports a malformed version; reinstall ferryctl from an official release".to_string(),
            Self::DevelopmentBuild {
                ..
            } => "Install a release build, or pass --force to upgrade anyway".to_string(),
            Self::AlreadyUpToDate {
                ..
            } => "Pass --force to reinstall the same release".to_string(),
            Self::NotFound {
                ..
            } => "Check the version number, or run `ferryctl upgrade` to install the latest release".to_string(),
            Self::Transport {
                ..
            } => "Check your network connection and re-run the command".to_string(),
            Self::ChecksumMismatch {
                ..
            } => "The download may be corrupted; re-run the command and report the problem if it persists".to_string(),
            Self::Replace {
                ..
            } => "Check that you can write to the directory containing the ferryctl executable".to_string(),
            Self::NoBackupAvailable {
                ..
            } => "A backup is only retained after a successful `ferryctl upgrade`".to_string(),
        };
        Some(hint)
    }
}
