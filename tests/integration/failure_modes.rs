use ferryctl::test_utils::StaticReleaseSource;
use ferryctl::upgrade::{
    Platform, SemanticVersion, UpgradeError, UpgradeState, VersionSelector,
};

use crate::common::{InstallFixture, published_releases};

#[tokio::test]
async fn test_malformed_running_version_is_fatal() {
    for version in ["v", "0.2.20", "v0.2", "vX.Y.Z", ""] {
        let fixture = InstallFixture::new(b"binary");
        let source = published_releases();
        let mut coordinator = fixture.coordinator(Platform::Linux, version, source.clone());

        let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();
        assert!(
            matches!(err, UpgradeError::VersionParse { .. }),
            "{version:?} should fail to parse, got {err:?}"
        );
        assert_eq!(source.request_count(), 0);
        assert_eq!(fixture.read_executable(), b"binary");
    }
}

#[tokio::test]
async fn test_development_build_is_refused_unless_forced() {
    let fixture = InstallFixture::new(b"dev build");
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.3.0-dev.4", published_releases());
    let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();
    assert!(matches!(err, UpgradeError::DevelopmentBuild { .. }));
    assert_eq!(fixture.read_executable(), b"dev build");

    let mut forced =
        fixture.coordinator(Platform::Linux, "v0.3.0-dev.4", published_releases()).force(true);
    forced.upgrade(&VersionSelector::Latest).await.unwrap();
    assert_eq!(fixture.read_executable(), b"v0.2.21-linux");
}

#[tokio::test]
async fn test_unknown_version_is_not_found() {
    let fixture = InstallFixture::new(b"v0.2.20-linux");
    let before = fixture.snapshot();
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", published_releases());

    let target = VersionSelector::Exact(SemanticVersion::new(0, 9, 0));
    let err = coordinator.upgrade(&target).await.unwrap_err();

    assert!(matches!(err, UpgradeError::NotFound { ref version, .. } if version == "v0.9.0"));
    assert!(!err.is_transient());
    assert_eq!(fixture.snapshot(), before);
}

#[tokio::test]
async fn test_missing_platform_artifact_is_not_found() {
    let fixture = InstallFixture::new(b"v0.2.20-darwin");
    let source = StaticReleaseSource::new().with_asset("v0.2.21", "ferryctl-linux-x86_64", b"linux only");
    let mut coordinator = fixture.coordinator(Platform::Darwin, "v0.2.20", source);

    let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();
    match err {
        UpgradeError::NotFound {
            platform,
            artifact,
            ..
        } => {
            assert_eq!(platform, Platform::Darwin);
            assert_eq!(artifact, "ferryctl-darwin-x86_64");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_failure_is_surfaced_and_transient() {
    let fixture = InstallFixture::new(b"v0.2.20-linux");
    let before = fixture.snapshot();
    let source = published_releases().failing("operation timed out");
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", source.clone());

    let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();

    assert!(err.is_transient());
    assert!(err.to_string().contains("operation timed out"));
    // Not retried internally.
    assert_eq!(source.request_count(), 1);
    assert_eq!(coordinator.state(), UpgradeState::Failed);
    assert_eq!(fixture.snapshot(), before);
}

#[tokio::test]
async fn test_checksum_mismatch_leaves_no_trace() {
    let fixture = InstallFixture::new(b"v0.2.20-linux");
    let before = fixture.snapshot();
    let source = published_releases().with_asset(
        "v0.2.21",
        "ferryctl-linux-x86_64.sha256",
        format!("{}  ferryctl-linux-x86_64\n", "ab".repeat(32)),
    );
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", source);

    let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();

    assert!(matches!(err, UpgradeError::ChecksumMismatch { .. }));
    assert_eq!(fixture.snapshot(), before);
}

#[tokio::test]
async fn test_empty_artifact_is_rejected_before_replacing() {
    let fixture = InstallFixture::new(b"v0.2.20-linux");
    let before = fixture.snapshot();
    let source = StaticReleaseSource::new().with_asset("v0.2.21", "ferryctl-linux-x86_64", b"");
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", source);

    let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();

    assert!(matches!(err, UpgradeError::Replace { .. }));
    assert_eq!(fixture.snapshot(), before);
}

#[tokio::test]
async fn test_missing_executable_fails_to_replace() {
    let fixture = InstallFixture::empty();
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", published_releases());

    let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();

    assert!(matches!(err, UpgradeError::Replace { .. }));
    assert!(fixture.snapshot().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_read_only_directory_keeps_current_executable() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = InstallFixture::new(b"v0.2.20-linux");
    std::fs::set_permissions(fixture.path(), std::fs::Permissions::from_mode(0o555)).unwrap();

    // Root ignores directory permissions; nothing to assert in that case.
    if std::fs::write(fixture.path().join("write-check"), b"").is_ok() {
        std::fs::remove_file(fixture.path().join("write-check")).unwrap();
        std::fs::set_permissions(fixture.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", published_releases());
    let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();
    std::fs::set_permissions(fixture.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(err, UpgradeError::Replace { .. }));
    assert!(err.suggestion().unwrap().contains("write"));
    assert_eq!(fixture.read_executable(), b"v0.2.20-linux");
    assert!(!fixture.backup().exists());
}

/// A damaged backup is refused and the working binary stays in place.
#[tokio::test]
async fn test_rollback_refuses_empty_backup() {
    let fixture = InstallFixture::new(b"v0.2.21-linux");
    fixture.write_backup(b"");
    let before = fixture.snapshot();
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.21", published_releases());

    let err = coordinator.rollback().await.unwrap_err();

    assert!(matches!(err, UpgradeError::Replace { .. }), "got {err:?}");
    assert_eq!(coordinator.state(), UpgradeState::Failed);
    assert_eq!(fixture.snapshot(), before);
}
