//! Release lookup: from a version selector to a platform-specific artifact.
//!
//! The hosting provider sits behind [`ReleaseSource`], a narrow seam with
//! three queries: the latest release, a release by tag, and raw artifact
//! bytes by URL. [`GitHubReleaseSource`] is the production implementation;
//! tests plug in an in-memory source.
//!
//! Artifacts are named `<bin>-<os>-<arch>[.exe]`, for example
//! `ferryctl-linux-x86_64` or `ferryctl-darwin-arm64`. A release lacking
//! the artifact for the requested platform is [`UpgradeError::NotFound`],
//! which callers can tell apart from a [`UpgradeError::Transport`] failure.

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::config::UpgradeConfig;
use super::error::UpgradeError;
use super::platform::{Operation, Platform};
use super::version::SemanticVersion;

/// Which release an upgrade should target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Exact(SemanticVersion),
}

impl VersionSelector {
    /// Interpret a user-supplied version argument.
    ///
    /// `None` and `latest` select the newest release. A bare `0.2.21` is
    /// accepted as `v0.2.21`; anything else must parse as a version.
    pub fn parse(raw: Option<&str>) -> Result<Self, UpgradeError> {
        match raw.map(str::trim) {
            None => Ok(Self::Latest),
            Some(value) if value.eq_ignore_ascii_case("latest") => Ok(Self::Latest),
            Some(value) => {
                let tagged = if value.starts_with(|c: char| c.is_ascii_digit()) {
                    format!("v{value}")
                } else {
                    value.to_string()
                };
                SemanticVersion::parse(&tagged).map(Self::Exact)
            }
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Exact(version) => write!(f, "{version}"),
        }
    }
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// A published release as reported by the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// The resolved artifact for one (version, platform) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReference {
    pub version: SemanticVersion,
    pub platform: Platform,
    pub artifact: String,
    pub download_url: String,
    /// URL of the published `<artifact>.sha256`, when the release has one.
    pub checksum_url: Option<String>,
}

/// Access to a release hosting provider.
///
/// `Ok(None)` from the release queries means "no such release"; every
/// other failure is reported as [`UpgradeError::Transport`]. Timeouts are
/// the implementation's concern and are never retried by callers.
pub trait ReleaseSource {
    /// Newest non-prerelease release, if any.
    fn latest(&self) -> impl Future<Output = Result<Option<Release>, UpgradeError>> + Send;

    /// Release published under `tag`, if any.
    fn by_tag(&self, tag: &str) -> impl Future<Output = Result<Option<Release>, UpgradeError>> + Send;

    /// Raw bytes behind an asset download URL.
    fn download(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, UpgradeError>> + Send;
}

/// Maps a [`VersionSelector`] and [`Platform`] to a [`ReleaseReference`].
pub struct ReleaseLocator<S> {
    source: S,
    bin_name: String,
    arch: String,
}

impl<S: ReleaseSource> ReleaseLocator<S> {
    /// Locator for the host architecture.
    pub fn new(source: S, bin_name: impl Into<String>) -> Self {
        Self {
            source,
            bin_name: bin_name.into(),
            arch: normalize_arch(std::env::consts::ARCH),
        }
    }

    /// Override the architecture used in artifact names.
    #[must_use]
    pub fn with_arch(mut self, arch: &str) -> Self {
        self.arch = normalize_arch(arch);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn bin_name(&self) -> &str {
        &self.bin_name
    }

    /// Artifact file name for `platform`.
    pub fn artifact_name(&self, platform: Platform) -> Result<String, UpgradeError> {
        if platform == Platform::Unknown {
            return Err(UpgradeError::UnsupportedPlatform {
                operation: Operation::Upgrade,
                platform,
            });
        }
        Ok(format!(
            "{}-{}-{}{}",
            self.bin_name,
            platform.as_str(),
            self.arch,
            platform.executable_suffix()
        ))
    }

    pub async fn resolve(
        &self,
        target: &VersionSelector,
        platform: Platform,
    ) -> Result<ReleaseReference, UpgradeError> {
        let artifact = self.artifact_name(platform)?;
        debug!("Resolving {} release artifact {}", target, artifact);

        let release = match target {
            VersionSelector::Latest => self.source.latest().await?,
            VersionSelector::Exact(version) => self.source.by_tag(&version.to_string()).await?,
        };

        let Some(release) = release else {
            return Err(UpgradeError::NotFound {
                version: target.to_string(),
                platform,
                artifact,
            });
        };

        // A malformed tag is a bad response from the host, not a broken build.
        let version = SemanticVersion::parse(&release.tag).map_err(|e| {
            UpgradeError::transport("interpreting release tag", e)
        })?;
        let Some(asset) = release.assets.iter().find(|asset| asset.name == artifact) else {
            return Err(UpgradeError::NotFound {
                version: version.to_string(),
                platform,
                artifact,
            });
        };

        let checksum_name = format!("{artifact}.sha256");
        let checksum_url = release
            .assets
            .iter()
            .find(|asset| asset.name == checksum_name)
            .map(|asset| asset.download_url.clone());

        Ok(ReleaseReference {
            version,
            platform,
            download_url: asset.download_url.clone(),
            artifact,
            checksum_url,
        })
    }

    /// Download the artifact bytes for a resolved reference.
    pub async fn fetch(&self, reference: &ReleaseReference) -> Result<Vec<u8>, UpgradeError> {
        debug!("Downloading {}", reference.download_url);
        self.source.download(&reference.download_url).await
    }

    /// Download the published checksum listing, if the release has one.
    pub async fn fetch_checksum(
        &self,
        reference: &ReleaseReference,
    ) -> Result<Option<String>, UpgradeError> {
        let Some(url) = &reference.checksum_url else {
            return Ok(None);
        };
        let bytes = self.source.download(url).await?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

fn normalize_arch(arch: &str) -> String {
    match arch {
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}

/// [`ReleaseSource`] backed by the GitHub releases API.
pub struct GitHubReleaseSource {
    client: reqwest::Client,
    api_url: String,
    repo_owner: String,
    repo_name: String,
}

impl GitHubReleaseSource {
    pub fn new(config: &UpgradeConfig) -> Result<Self, UpgradeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ferryctl/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| UpgradeError::transport("building the HTTP client", e))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repo_owner: config.repo_owner.clone(),
            repo_name: config.repo_name.clone(),
        })
    }

    fn releases_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/releases/{}",
            self.api_url, self.repo_owner, self.repo_name, path
        )
    }

    async fn fetch_release(&self, url: String, operation: &str) -> Result<Option<Release>, UpgradeError> {
        debug!("Querying {}", url);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| UpgradeError::transport(operation, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(UpgradeError::transport(operation, format!("HTTP {}", response.status())));
        }

        let release = response
            .json::<Release>()
            .await
            .map_err(|e| UpgradeError::transport(operation, e))?;
        Ok(Some(release))
    }
}

impl ReleaseSource for GitHubReleaseSource {
    async fn latest(&self) -> Result<Option<Release>, UpgradeError> {
        self.fetch_release(self.releases_url("latest"), "querying the latest release").await
    }

    async fn by_tag(&self, tag: &str) -> Result<Option<Release>, UpgradeError> {
        let operation = format!("querying release {tag}");
        self.fetch_release(self.releases_url(&format!("tags/{tag}")), &operation).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, UpgradeError> {
        let operation = format!("downloading {url}");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .map_err(|e| UpgradeError::transport(&operation, e))?;

        if !response.status().is_success() {
            return Err(UpgradeError::transport(&operation, format!("HTTP {}", response.status())));
        }

        let bytes = response.bytes().await.map_err(|e| UpgradeError::transport(&operation, e))?;
        Ok(bytes.to_vec())
    }
}
