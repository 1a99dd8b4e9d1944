//! Platform identification and the upgrade/rollback support policy.
//!
//! The platform is always passed in explicitly. Nothing in this module
//! reads the host OS except [`Platform::current`], which the CLI calls
//! once and hands to the coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::UpgradeError;

/// Operating systems ferryctl distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux distributions.
    Linux,
    /// macOS.
    Darwin,
    /// Microsoft Windows.
    Windows,
    /// Anything else; never supported.
    Unknown,
}

impl Platform {
    /// Platform of the running process.
    #[must_use]
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier (`std::env::consts::OS` style) to a platform.
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os.to_ascii_lowercase().as_str() {
            "linux" => Self::Linux,
            "macos" | "darwin" => Self::Darwin,
            "windows" => Self::Windows,
            _ => Self::Unknown,
        }
    }

    /// Lowercase identifier used in artifact names and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
            Self::Unknown => "unknown",
        }
    }

    /// File suffix of executables on this platform.
    #[must_use]
    pub const fn executable_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            _ => "",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linux => "Linux",
            Self::Darwin => "Darwin",
            Self::Windows => "Windows",
            Self::Unknown => "an unknown platform",
        };
        f.write_str(name)
    }
}

/// The two lifecycle operations gated by [`PlatformPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upgrade,
    Rollback,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upgrade => f.write_str("upgrade"),
            Self::Rollback => f.write_str("rollback"),
        }
    }
}

/// Which platforms may upgrade and which may roll back.
///
/// Rollback support is configured independently of upgrade support: a
/// platform can allow upgrades while lacking a usable backup mechanism.
/// [`Platform::Unknown`] is rejected for both operations even when listed.
///
/// ```toml
/// [upgrade.policy]
/// upgrade = ["linux", "darwin"]
/// rollback = ["linux", "darwin"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformPolicy {
    /// Platforms allowed to replace their executable with a newer release.
    #[serde(default = "default_supported")]
    pub upgrade: Vec<Platform>,

    /// Platforms allowed to restore the retained backup binary.
    #[serde(default = "default_supported")]
    pub rollback: Vec<Platform>,
}

fn default_supported() -> Vec<Platform> {
    vec![Platform::Linux, Platform::Darwin]
}

impl Default for PlatformPolicy {
    fn default() -> Self {
        Self {
            upgrade: default_supported(),
            rollback: default_supported(),
        }
    }
}

impl PlatformPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn supports_upgrade(&self, platform: Platform) -> bool {
        platform != Platform::Unknown && self.upgrade.contains(&platform)
    }

    #[must_use]
    pub fn supports_rollback(&self, platform: Platform) -> bool {
        platform != Platform::Unknown && self.rollback.contains(&platform)
    }

    #[must_use]
    pub fn supports(&self, operation: Operation, platform: Platform) -> bool {
        match operation {
            Operation::Upgrade => self.supports_upgrade(platform),
            Operation::Rollback => self.supports_rollback(platform),
        }
    }

    /// Fail with [`UpgradeError::UnsupportedPlatform`] unless `operation` is allowed.
    pub fn check(&self, operation: Operation, platform: Platform) -> Result<(), UpgradeError> {
        if self.supports(operation, platform) {
            Ok(())
        } else {
            Err(UpgradeError::UnsupportedPlatform {
                operation,
                platform,
            })
        }
    }

    /// Enable or disable upgrades for one platform.
    #[must_use]
    pub fn with_upgrade(mut self, platform: Platform, enabled: bool) -> Self {
        set_membership(&mut self.upgrade, platform, enabled);
        self
    }

    /// Enable or disable rollback for one platform.
    #[must_use]
    pub fn with_rollback(mut self, platform: Platform, enabled: bool) -> Self {
        set_membership(&mut self.rollback, platform, enabled);
        self
    }
}

fn set_membership(platforms: &mut Vec<Platform>, platform: Platform, enabled: bool) {
    platforms.retain(|p| *p != platform);
    if enabled {
        platforms.push(platform);
    }
}
