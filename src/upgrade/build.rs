//! Identification of the running build.

use serde::Serialize;
use std::fmt;

use super::error::UpgradeError;
use super::version::SemanticVersion;

/// Version string and optional metadata of a ferryctl build.
///
/// Release pipelines stamp `FERRYCTL_VERSION`, `FERRYCTL_BUILD` (commit) and
/// `FERRYCTL_BUILD_TIME` at compile time. Local builds fall back to the
/// crate version with a `v` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_time: Option<String>,
}

impl BuildInfo {
    /// Values compiled into this binary.
    #[must_use]
    pub fn current() -> Self {
        Self {
            version: stamped(option_env!("FERRYCTL_VERSION"))
                .unwrap_or_else(|| format!("v{}", env!("CARGO_PKG_VERSION"))),
            build: stamped(option_env!("FERRYCTL_BUILD")),
            build_time: stamped(option_env!("FERRYCTL_BUILD_TIME")),
        }
    }

    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            build: None,
            build_time: None,
        }
    }

    #[must_use]
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    #[must_use]
    pub fn with_build_time(mut self, build_time: impl Into<String>) -> Self {
        self.build_time = Some(build_time.into());
        self
    }

    /// Parse the version string; a malformed identifier is fatal for upgrades.
    pub fn parse_version(&self) -> Result<SemanticVersion, UpgradeError> {
        SemanticVersion::parse(&self.version)
    }
}

fn stamped(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version: {}", self.version)?;
        if let Some(build) = &self.build {
            write!(f, "\nBuild: {build}")?;
        }
        if let Some(build_time) = &self.build_time {
            write!(f, "\nBuildTime: {build_time}")?;
        }
        Ok(())
    }
}
