//! Global configuration for ferryctl.
//!
//! The file lives at `~/.ferryctl/config.toml` (Unix/macOS) or
//! `%LOCALAPPDATA%\ferryctl\config.toml` (Windows). The CLI resolves
//! `--config` and `FERRYCTL_CONFIG_PATH` itself and passes the chosen path
//! to [`GlobalConfig::load_with_optional`], so nothing here reads the
//! environment.
//!
//! ```toml
//! [upgrade]
//! repo_owner = "ferryctl"
//! verify_checksum = true
//!
//! [upgrade.policy]
//! rollback = ["linux"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::core::FerryError;
use crate::upgrade::UpgradeConfig;

/// User-wide ferryctl settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GlobalConfig {
    /// Self-upgrade and rollback settings.
    #[serde(default, skip_serializing_if = "is_default_upgrade_config")]
    pub upgrade: UpgradeConfig,
}

fn is_default_upgrade_config(config: &UpgradeConfig) -> bool {
    *config == UpgradeConfig::default()
}

impl GlobalConfig {
    /// Load from `path` when given, otherwise from the default location.
    ///
    /// A missing file yields the default configuration.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(|| {
            Self::default_path().unwrap_or_else(|_| PathBuf::from("~/.ferryctl/config.toml"))
        });
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid TOML, or holds values
    /// rejected by [`GlobalConfig::validate`].
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| FerryError::ConfigParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values no request or replacement could work with.
    pub fn validate(&self) -> Result<(), FerryError> {
        let upgrade = &self.upgrade;
        let invalid = |message: String| Err(FerryError::ConfigError {
            message,
        });

        if upgrade.bin_name.trim().is_empty() {
            return invalid("upgrade.bin_name must not be empty".to_string());
        }
        if upgrade.repo_owner.trim().is_empty() || upgrade.repo_name.trim().is_empty() {
            return invalid("upgrade.repo_owner and upgrade.repo_name must not be empty".to_string());
        }
        if !upgrade.api_url.starts_with("https://") && !upgrade.api_url.starts_with("http://") {
            return invalid(format!("upgrade.api_url must be an http(s) URL, got '{}'", upgrade.api_url));
        }
        if upgrade.request_timeout == 0 {
            return invalid("upgrade.request_timeout must be at least 1 second".to_string());
        }
        Ok(())
    }

    /// Platform-specific location of the configuration file.
    ///
    /// - **Windows**: `%LOCALAPPDATA%\ferryctl\config.toml`
    /// - **Unix/macOS**: `~/.ferryctl/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("ferryctl")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".ferryctl")
        };

        Ok(config_dir.join("config.toml"))
    }
}
