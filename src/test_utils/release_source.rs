use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::upgrade::{Release, ReleaseAsset, ReleaseSource, SemanticVersion, UpgradeError};

/// In-memory release host.
///
/// Assets are served from `https://releases.test/<tag>/<name>`. Every query
/// and download counts as one request; clones share the counter, so a test
/// can hand one clone to a coordinator and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct StaticReleaseSource {
    releases: Vec<Release>,
    artifacts: HashMap<String, Vec<u8>>,
    failure: Option<String>,
    requests: Arc<AtomicUsize>,
}

impl StaticReleaseSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `name` with `content` under release `tag`, creating the release if needed.
    #[must_use]
    pub fn with_asset(mut self, tag: &str, name: &str, content: impl AsRef<[u8]>) -> Self {
        let download_url = format!("https://releases.test/{tag}/{name}");
        self.artifacts.insert(download_url.clone(), content.as_ref().to_vec());

        let asset = ReleaseAsset {
            name: name.to_string(),
            download_url,
        };
        match self.releases.iter_mut().find(|release| release.tag == tag) {
            Some(release) => release.assets.push(asset),
            None => self.releases.push(Release {
                tag: tag.to_string(),
                assets: vec![asset],
            }),
        }
        self
    }

    /// Make every request fail with a transport error.
    #[must_use]
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    /// Number of queries and downloads made so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn record(&self, operation: &str) -> Result<(), UpgradeError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(reason) => Err(UpgradeError::transport(operation, reason)),
            None => Ok(()),
        }
    }
}

impl ReleaseSource for StaticReleaseSource {
    async fn latest(&self) -> Result<Option<Release>, UpgradeError> {
        self.record("querying the latest release")?;

        // Mirrors the hosted "latest" query: newest tag, pre-releases excluded.
        let latest = self
            .releases
            .iter()
            .filter_map(|release| {
                SemanticVersion::parse(&release.tag).ok().map(|version| (version, release))
            })
            .filter(|(version, _)| version.pre.is_none())
            .max_by(|(a, _), (b, _)| a.compare(b))
            .map(|(_, release)| release.clone());
        Ok(latest)
    }

    async fn by_tag(&self, tag: &str) -> Result<Option<Release>, UpgradeError> {
        self.record(&format!("querying release {tag}"))?;
        Ok(self.releases.iter().find(|release| release.tag == tag).cloned())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, UpgradeError> {
        let operation = format!("downloading {url}");
        self.record(&operation)?;
        self.artifacts
            .get(url)
            .cloned()
            .ok_or_else(|| UpgradeError::transport(&operation, "HTTP 404 Not Found"))
    }
}
