use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform::PlatformPolicy;

/// Configuration settings for ferryctl self-upgrade behavior.
///
/// Read from the `[upgrade]` table of the global configuration file. Every
/// key is optional; omitted keys take the values shown below.
///
/// ```toml
/// [upgrade]
/// repo_owner = "ferryctl"
/// repo_name = "ferryctl"
/// api_url = "https://api.github.com"
/// bin_name = "ferryctl"
/// verify_checksum = true
/// request_timeout = 60
/// # override_executable = "~/bin/ferryctl"
///
/// [upgrade.policy]
/// upgrade = ["linux", "darwin"]
/// rollback = ["linux", "darwin"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Owner of the repository that publishes releases.
    #[serde(default = "default_repo_owner")]
    pub repo_owner: String,

    /// Name of the repository that publishes releases.
    #[serde(default = "default_repo_name")]
    pub repo_name: String,

    /// Base URL of the releases API. Point this at a mirror for
    /// air-gapped installations.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Prefix of release artifact names (`<bin_name>-<os>-<arch>`).
    #[serde(default = "default_bin_name")]
    pub bin_name: String,

    /// Executable to replace instead of the running one.
    ///
    /// Useful when ferryctl is invoked through a wrapper or a symlink farm.
    /// A leading `~` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_executable: Option<PathBuf>,

    /// Whether to verify downloads against the published `.sha256` file.
    ///
    /// Releases without a checksum file are installed unverified either way.
    #[serde(default = "default_verify_checksum")]
    pub verify_checksum: bool,

    /// Timeout in seconds for each request to the release host.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Which platforms may upgrade and roll back.
    #[serde(default)]
    pub policy: PlatformPolicy,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            repo_owner: default_repo_owner(),
            repo_name: default_repo_name(),
            api_url: default_api_url(),
            bin_name: default_bin_name(),
            override_executable: None,
            verify_checksum: default_verify_checksum(),
            request_timeout: default_request_timeout(),
            policy: PlatformPolicy::default(),
        }
    }
}

fn default_repo_owner() -> String {
    "ferryctl".to_string()
}

fn default_repo_name() -> String {
    "ferryctl".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_bin_name() -> String {
    "ferryctl".to_string()
}

fn default_verify_checksum() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    60
}

impl UpgradeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the executable that upgrades replace and rollbacks restore.
    ///
    /// Uses `override_executable` when set, otherwise the running binary.
    pub fn executable_path(&self) -> Result<PathBuf> {
        match &self.override_executable {
            Some(path) => {
                let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
                Ok(PathBuf::from(expanded))
            }
            None => std::env::current_exe().context("Failed to get current executable path"),
        }
    }
}
