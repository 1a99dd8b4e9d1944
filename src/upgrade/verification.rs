use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::error::UpgradeError;

/// SHA-256 integrity checks for downloaded release artifacts.
///
/// Release pages publish `<artifact>.sha256` next to each binary. The file
/// holds either a bare hex digest or `sha256sum`-style `<digest>  <name>`
/// lines. Digests may carry a `sha256:` prefix and compare case-insensitively.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Digest of `data` in `sha256:<hex>` form.
    #[must_use]
    pub fn compute_sha256(data: &[u8]) -> String {
        format!("sha256:{}", hex::encode(Sha256::digest(data)))
    }

    /// Extract the digest for `artifact` from a checksum listing.
    #[must_use]
    pub fn expected_digest(listing: &str, artifact: &str) -> Option<String> {
        for line in listing.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let digest = match parts.as_slice() {
                [digest] => *digest,
                [digest, name] => {
                    let name = name.trim_start_matches('*');
                    if name != artifact && !name.ends_with(&format!("/{artifact}")) {
                        continue;
                    }
                    *digest
                }
                _ => continue,
            };

            let digest = normalize(digest);
            if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) {
                debug!("Found checksum for {}: {}", artifact, digest);
                return Some(digest);
            }
        }
        None
    }

    /// Verify `data` against a single expected digest.
    pub fn verify(data: &[u8], expected: &str, artifact: &str) -> Result<(), UpgradeError> {
        let actual = Self::compute_sha256(data);
        if normalize(&actual) != normalize(expected) {
            return Err(UpgradeError::ChecksumMismatch {
                artifact: artifact.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        info!("Checksum verification successful for {}", artifact);
        Ok(())
    }

    /// Verify `data` against the entry for `artifact` in a checksum listing.
    pub fn verify_listing(data: &[u8], listing: &str, artifact: &str) -> Result<(), UpgradeError> {
        match Self::expected_digest(listing, artifact) {
            Some(expected) => Self::verify(data, &expected, artifact),
            None => Err(UpgradeError::ChecksumMismatch {
                artifact: artifact.to_string(),
                expected: "a published digest".to_string(),
                actual: Self::compute_sha256(data),
            }),
        }
    }
}

fn normalize(digest: &str) -> String {
    digest.trim().trim_start_matches("sha256:").to_ascii_lowercase()
}
