//! Smoke tests of the compiled `ferryctl` binary.
//!
//! None of these reach the network: they either fail before any release
//! query or exercise rollback, which is purely local.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn ferryctl() -> Command {
    let mut cmd = Command::cargo_bin("ferryctl").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("FERRYCTL_CONFIG_PATH").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    ferryctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upgrade"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_upgrade_help_mentions_rollback() {
    ferryctl()
        .args(["upgrade", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rollback"))
        .stdout(predicate::str::contains("--check"));
}

#[test]
fn test_version_command() {
    ferryctl()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Version: v"));
}

#[test]
fn test_version_json() {
    let output = ferryctl().args(["version", "--json"]).assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(value["version"].as_str().unwrap().starts_with('v'));
}

#[test]
fn test_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    fs::write(&config, "[upgrade\nrepo_owner = ").unwrap();

    ferryctl()
        .args(["upgrade", "--check", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("config.toml"));
}

#[test]
fn test_malformed_version_argument_fails() {
    ferryctl()
        .args(["upgrade", "banana"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid version 'banana'"));
}

#[test]
fn test_rollback_conflicts_with_force() {
    ferryctl().args(["upgrade", "rollback", "--force"]).assert().failure();
    ferryctl().args(["upgrade", "--rollback", "--check"]).assert().failure();
}

#[cfg(unix)]
mod local_rollback {
    use super::*;
    use ferryctl::test_utils::write_executable;

    fn config_for(temp: &TempDir) -> std::path::PathBuf {
        let executable = temp.path().join("ferryctl");
        write_executable(&executable, b"v0.2.21").unwrap();

        let config = temp.path().join("config.toml");
        fs::write(
            &config,
            format!("[upgrade]\noverride_executable = \"{}\"\n", executable.display()),
        )
        .unwrap();
        config
    }

    #[test]
    fn test_rollback_without_backup_fails() {
        let temp = TempDir::new().unwrap();
        let config = config_for(&temp);

        ferryctl()
            .args(["upgrade", "rollback"])
            .env("FERRYCTL_CONFIG_PATH", &config)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("No backup found"))
            .stderr(predicate::str::contains("suggestion"));
    }

    #[test]
    fn test_rollback_restores_backup() {
        let temp = TempDir::new().unwrap();
        let config = config_for(&temp);
        write_executable(&temp.path().join("ferryctl.backup"), b"v0.2.20").unwrap();
        fs::write(
            temp.path().join("ferryctl.backup.json"),
            r#"{"version":"v0.2.20","replaced_at":"2024-05-01T12:00:00Z"}"#,
        )
        .unwrap();

        ferryctl()
            .args(["upgrade", "rollback", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("Successfully rolled back to version v0.2.20"));

        assert_eq!(fs::read(temp.path().join("ferryctl")).unwrap(), b"v0.2.20");
        assert!(!temp.path().join("ferryctl.backup").exists());
    }
}
