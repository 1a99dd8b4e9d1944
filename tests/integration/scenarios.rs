use ferryctl::test_utils::StaticReleaseSource;
use ferryctl::upgrade::{
    ChecksumVerifier, Platform, SemanticVersion, UpgradeError, UpgradeState, VersionSelector,
};

use crate::common::{InstallFixture, published_releases};

/// Running v0.2.20 with v0.2.21 published: upgrade installs v0.2.21 and keeps v0.2.20.
#[tokio::test]
async fn test_upgrade_to_latest_on_linux() {
    let fixture = InstallFixture::new(b"v0.2.20-linux");
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", published_releases());

    let outcome = coordinator.upgrade(&VersionSelector::Latest).await.unwrap();

    assert!(outcome.message().contains("v0.2.21"));
    assert_eq!(coordinator.state(), UpgradeState::Promoted);
    assert_eq!(fixture.read_executable(), b"v0.2.21-linux");
    assert_eq!(std::fs::read(fixture.backup()).unwrap(), b"v0.2.20-linux");
    assert!(!fixture.staging().exists());
}

/// Running v100.0.0 with nothing retained: rollback reports there is nothing to restore.
#[tokio::test]
async fn test_rollback_without_backup() {
    let fixture = InstallFixture::new(b"v100.0.0");
    let before = fixture.snapshot();
    let mut coordinator = fixture.coordinator(Platform::Linux, "v100.0.0", published_releases());

    let err = coordinator.rollback().await.unwrap_err();

    assert!(matches!(err, UpgradeError::NoBackupAvailable { .. }));
    assert!(!err.is_informational());
    assert_eq!(fixture.snapshot(), before);
}

#[tokio::test]
async fn test_rollback_restores_exact_prior_binary() {
    let original = b"\x7fELF v0.2.20 original bytes \x00\x01\x02".to_vec();
    let fixture = InstallFixture::new(&original);
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", published_releases());
    coordinator.upgrade(&VersionSelector::Latest).await.unwrap();

    // A later invocation finds the backup from the executable path alone.
    let mut later = fixture.coordinator(Platform::Linux, "v0.2.21", StaticReleaseSource::new());
    let outcome = later.rollback().await.unwrap();

    assert_eq!(outcome.message(), "Successfully rolled back to version v0.2.20");
    assert_eq!(fixture.read_executable(), original);
    assert!(!fixture.backup().exists());

    let err = later.rollback().await.unwrap_err();
    assert!(matches!(err, UpgradeError::NoBackupAvailable { .. }));
    assert_eq!(fixture.read_executable(), original);
}

#[tokio::test]
async fn test_consecutive_upgrades_keep_one_backup() {
    let fixture = InstallFixture::new(b"v0.2.19-linux");

    let target = VersionSelector::Exact(SemanticVersion::new(0, 2, 20));
    fixture
        .coordinator(Platform::Linux, "v0.2.19", published_releases())
        .upgrade(&target)
        .await
        .unwrap();
    fixture
        .coordinator(Platform::Linux, "v0.2.20", published_releases())
        .upgrade(&VersionSelector::Latest)
        .await
        .unwrap();

    assert_eq!(fixture.read_executable(), b"v0.2.21-linux");
    assert_eq!(std::fs::read(fixture.backup()).unwrap(), b"v0.2.20-linux");

    let names: Vec<String> = fixture.snapshot().into_keys().collect();
    assert_eq!(names, ["ferryctl", "ferryctl.backup", "ferryctl.backup.json"]);
}

#[tokio::test]
async fn test_explicit_version_on_darwin() {
    let fixture = InstallFixture::new(b"v0.2.19-darwin");
    let mut coordinator = fixture.coordinator(Platform::Darwin, "v0.2.19", published_releases());

    let target = VersionSelector::parse(Some("0.2.20")).unwrap();
    let outcome = coordinator.upgrade(&target).await.unwrap();

    assert_eq!(outcome.installed, SemanticVersion::new(0, 2, 20));
    assert_eq!(fixture.read_executable(), b"v0.2.20-darwin");
}

#[tokio::test]
async fn test_already_up_to_date_changes_nothing() {
    let fixture = InstallFixture::new(b"v0.2.21-linux");
    let before = fixture.snapshot();
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.21", published_releases());

    let err = coordinator.upgrade(&VersionSelector::Latest).await.unwrap_err();

    assert!(err.is_informational());
    assert_eq!(fixture.snapshot(), before);
}

#[tokio::test]
async fn test_forced_reinstall_of_same_version() {
    let fixture = InstallFixture::new(b"corrupted install");
    let mut coordinator =
        fixture.coordinator(Platform::Linux, "v0.2.21", published_releases()).force(true);

    coordinator.upgrade(&VersionSelector::Latest).await.unwrap();

    assert_eq!(fixture.read_executable(), b"v0.2.21-linux");
    assert_eq!(std::fs::read(fixture.backup()).unwrap(), b"corrupted install");
}

#[tokio::test]
async fn test_check_reports_without_side_effects() {
    let fixture = InstallFixture::new(b"v0.2.20-linux");
    let before = fixture.snapshot();
    let source = published_releases();
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", source.clone());

    let reference = coordinator.check(&VersionSelector::Latest).await.unwrap();

    assert_eq!(reference.version, SemanticVersion::new(0, 2, 21));
    assert_eq!(reference.artifact, "ferryctl-linux-x86_64");
    assert_eq!(source.request_count(), 1);
    assert_eq!(fixture.snapshot(), before);
}

#[tokio::test]
async fn test_verified_upgrade() {
    let fixture = InstallFixture::new(b"v0.2.20-linux");
    let digest = ChecksumVerifier::compute_sha256(b"v0.2.21-linux");
    let listing = format!("{}  ferryctl-linux-x86_64\n", digest.trim_start_matches("sha256:"));
    let source = published_releases().with_asset("v0.2.21", "ferryctl-linux-x86_64.sha256", listing);
    let mut coordinator = fixture.coordinator(Platform::Linux, "v0.2.20", source.clone());

    coordinator.upgrade(&VersionSelector::Latest).await.unwrap();

    // Release query, artifact, checksum listing.
    assert_eq!(source.request_count(), 3);
    assert_eq!(fixture.read_executable(), b"v0.2.21-linux");
}
