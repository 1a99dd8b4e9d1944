//! Semantic version parsing and upgrade eligibility.
//!
//! Versions are written with a mandatory leading `v` (`v0.2.21`,
//! `v1.0.0-rc.1`, `v0.3.0+dev`). Parsing is strict: a missing marker or
//! a non-numeric component is an error, never a silent `v0.0.0`.
//!
//! Ordering for upgrade decisions looks at `(major, minor, patch)` only.
//! Builds carrying build metadata or a `dev`/`snapshot` pre-release tag
//! are development builds and are never considered comparable.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::UpgradeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release tag after `-`, if any.
    pub pre: Option<String>,
    /// Build metadata after `+`, if any.
    pub build: Option<String>,
}

impl SemanticVersion {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
            build: None,
        }
    }

    /// Parse a `vX.Y.Z[-pre][+build]` string.
    pub fn parse(raw: &str) -> Result<Self, UpgradeError> {
        let Some(rest) = raw.strip_prefix('v') else {
            return Err(UpgradeError::VersionParse {
                input: raw.to_string(),
                reason: "expected a leading 'v'".to_string(),
            });
        };

        let parsed = semver::Version::parse(rest).map_err(|e| UpgradeError::VersionParse {
            input: raw.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            pre: (!parsed.pre.is_empty()).then(|| parsed.pre.to_string()),
            build: (!parsed.build.is_empty()).then(|| parsed.build.to_string()),
        })
    }

    /// Compare on `(major, minor, patch)`, ignoring pre-release and build tags.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }

    /// Development or snapshot build that cannot be ordered against releases.
    #[must_use]
    pub fn is_development(&self) -> bool {
        if self.build.is_some() {
            return true;
        }
        self.pre.as_deref().is_some_and(|pre| {
            let pre = pre.to_ascii_lowercase();
            pre.starts_with("dev") || pre.contains("snapshot")
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl FromStr for SemanticVersion {
    type Err = UpgradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Outcome of comparing the running version with a candidate release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The candidate is strictly newer.
    Eligible,
    /// The candidate is the same or older.
    UpToDate,
    /// One side is a development build.
    Unsupported,
}

/// Stateless entry points for version decisions.
pub struct VersionOracle;

impl VersionOracle {
    pub fn parse(raw: &str) -> Result<SemanticVersion, UpgradeError> {
        SemanticVersion::parse(raw)
    }

    #[must_use]
    pub fn compare(a: &SemanticVersion, b: &SemanticVersion) -> Ordering {
        a.compare(b)
    }

    #[must_use]
    pub fn eligibility(current: &SemanticVersion, candidate: &SemanticVersion) -> Eligibility {
        if current.is_development() || candidate.is_development() {
            return Eligibility::Unsupported;
        }
        match candidate.compare(current) {
            Ordering::Greater => Eligibility::Eligible,
            Ordering::Equal | Ordering::Less => Eligibility::UpToDate,
        }
    }

    /// True iff `candidate` is strictly newer than `current`.
    #[must_use]
    pub fn is_upgrade_eligible(current: &SemanticVersion, candidate: &SemanticVersion) -> bool {
        Self::eligibility(current, candidate) == Eligibility::Eligible
    }
}
