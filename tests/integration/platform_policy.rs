use ferryctl::upgrade::{
    Operation, Platform, PlatformPolicy, UpgradeError, UpgradeState, VersionSelector,
};

use crate::common::{InstallFixture, published_releases};

fn assert_unsupported(err: &UpgradeError, expected: Operation) {
    match err {
        UpgradeError::UnsupportedPlatform {
            operation,
            platform,
        } => {
            assert_eq!(*operation, expected);
            assert_eq!(*platform, Platform::Windows);
        }
        other => panic!("expected UnsupportedPlatform, got {other:?}"),
    }
}

/// Windows upgrade fails before any network or filesystem operation.
#[tokio::test]
async fn test_windows_upgrade_is_rejected_without_side_effects() {
    let fixture = InstallFixture::new(b"v0.2.20-windows");
    let before = fixture.snapshot();
    let source = published_releases();
    let mut coordinator = fixture.coordinator(Platform::Windows, "v0.2.20", source.clone());

    for target in [VersionSelector::Latest, VersionSelector::parse(Some("v0.2.21")).unwrap()] {
        let err = coordinator.upgrade(&target).await.unwrap_err();
        assert_unsupported(&err, Operation::Upgrade);
        assert!(err.suggestion().unwrap().contains("manually"));
    }

    let err = coordinator.check(&VersionSelector::Latest).await.unwrap_err();
    assert_unsupported(&err, Operation::Upgrade);

    assert_eq!(coordinator.state(), UpgradeState::Failed);
    assert_eq!(source.request_count(), 0);
    assert_eq!(fixture.snapshot(), before);
}

/// Default policy: rollback on Windows is unsupported too, even with a backup present.
#[tokio::test]
async fn test_windows_rollback_under_default_policy() {
    let fixture = InstallFixture::new(b"v0.2.21-windows");
    fixture.write_backup(b"v0.2.20-windows");
    let before = fixture.snapshot();
    let mut coordinator = fixture.coordinator(Platform::Windows, "v0.2.21", published_releases());

    let err = coordinator.rollback().await.unwrap_err();

    assert_unsupported(&err, Operation::Rollback);
    assert_eq!(fixture.snapshot(), before);
}

/// Rollback policy is independent of upgrade policy.
#[tokio::test]
async fn test_windows_rollback_when_policy_allows_it() {
    let fixture = InstallFixture::new(b"v0.2.21-windows");
    fixture.write_backup(b"v0.2.20-windows");

    let policy = PlatformPolicy::default().with_rollback(Platform::Windows, true);
    assert!(!policy.supports_upgrade(Platform::Windows));

    let source = published_releases();
    let mut coordinator = fixture
        .coordinator(Platform::Windows, "v0.2.21", source.clone())
        .with_policy(policy);

    let outcome = coordinator.rollback().await.unwrap();
    assert_eq!(outcome.message(), "Successfully rolled back to the previous version");
    assert_eq!(fixture.read_executable(), b"v0.2.20-windows");

    let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();
    assert_unsupported(&err, Operation::Upgrade);
    assert_eq!(source.request_count(), 0);
}

#[tokio::test]
async fn test_windows_upgrade_when_policy_allows_it() {
    let fixture = InstallFixture::new(b"v0.2.20-windows");
    let policy = PlatformPolicy::default().with_upgrade(Platform::Windows, true);
    let mut coordinator = fixture
        .coordinator(Platform::Windows, "v0.2.20", published_releases())
        .with_policy(policy);

    coordinator.upgrade(&VersionSelector::Latest).await.unwrap();
    assert_eq!(fixture.read_executable(), b"v0.2.21-windows");
}

#[tokio::test]
async fn test_linux_rollback_can_be_disabled() {
    let fixture = InstallFixture::new(b"v0.2.21-linux");
    fixture.write_backup(b"v0.2.20-linux");
    let policy = PlatformPolicy::default().with_rollback(Platform::Linux, false);
    let mut coordinator = fixture
        .coordinator(Platform::Linux, "v0.2.21", published_releases())
        .with_policy(policy);

    let err = coordinator.rollback().await.unwrap_err();
    assert!(matches!(
        err,
        UpgradeError::UnsupportedPlatform {
            operation: Operation::Rollback,
            platform: Platform::Linux,
        }
    ));
    assert_eq!(fixture.read_executable(), b"v0.2.21-linux");
}
