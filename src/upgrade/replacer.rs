use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use super::error::UpgradeError;

/// The on-disk locations involved in replacing the ferryctl executable.
///
/// All paths are siblings of the current executable, so every move between
/// them stays on one filesystem and is a single atomic `rename`:
///
/// | Path | Name | Role |
/// |------|------|------|
/// | `current` | `ferryctl` | the live binary |
/// | `backup` | `ferryctl.backup` | the binary replaced by the last upgrade |
/// | `staging` | `ferryctl.staging` | a downloaded candidate awaiting promotion |
///
/// The backup location is derived from the current path alone, which lets
/// a later invocation find it without any bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableState {
    pub current: PathBuf,
    pub backup: PathBuf,
    pub staging: PathBuf,
}

impl ExecutableState {
    pub fn for_executable(current: PathBuf) -> Self {
        Self {
            backup: sibling(&current, "backup"),
            staging: sibling(&current, "staging"),
            current,
        }
    }

    /// Sidecar describing the retained backup.
    pub fn record_path(&self) -> PathBuf {
        sibling(&self.current, "backup.json")
    }

    fn pending_backup(&self) -> PathBuf {
        sibling(&self.current, "backup.tmp")
    }

    /// Where the previous backup waits while a promotion is in flight.
    fn previous_backup(&self) -> PathBuf {
        sibling(&self.current, "backup.prev")
    }

    fn previous_record(&self) -> PathBuf {
        sibling(&self.current, "backup.json.prev")
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    sibling.set_file_name(format!(
        "{}.{suffix}",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));
    sibling
}

/// Metadata stored next to the backup binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Version of the binary held in the backup slot.
    pub version: String,
    /// When the binary was moved into the backup slot.
    pub replaced_at: DateTime<Utc>,
}

/// Stages, promotes and rolls back the ferryctl executable.
///
/// # Guarantees
///
/// - `current` always holds a complete executable. It is only ever replaced
///   by `rename`, never truncated or written in place, so a process still
///   executing the old image is unaffected.
/// - A staged candidate is checked for being a non-empty executable file
///   before anything touches `current` or `backup`.
/// - Exactly one backup is retained. Each successful promotion replaces it;
///   a rollback consumes it, so a second rollback reports
///   [`UpgradeError::NoBackupAvailable`].
/// - A failed promotion discards the staged file and leaves `current` and
///   the backup as they were before the attempt.
/// - A backup is checked before it is restored.
pub struct ExecutableReplacer {
    state: ExecutableState,
}

impl ExecutableReplacer {
    /// Replacer for the executable at `current`.
    pub fn new(current: PathBuf) -> Self {
        Self {
            state: ExecutableState::for_executable(current),
        }
    }

    pub fn state(&self) -> &ExecutableState {
        &self.state
    }

    pub fn backup_exists(&self) -> bool {
        self.state.backup.is_file()
    }

    /// Write a freshly downloaded candidate to the staging path.
    ///
    /// Any leftover staging file from an earlier attempt is replaced.
    pub async fn stage(&self, artifact: &[u8]) -> Result<PathBuf, UpgradeError> {
        let staging = &self.state.staging;
        remove_if_present(staging).await;

        debug!("Staging {} bytes at {:?}", artifact.len(), staging);
        if let Err(e) = fs::write(staging, artifact).await {
            remove_if_present(staging).await;
            return Err(UpgradeError::replace("write staged binary", staging, e));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            if let Err(e) = fs::set_permissions(staging, std::fs::Permissions::from_mode(0o755)).await {
                remove_if_present(staging).await;
                return Err(UpgradeError::replace("mark staged binary executable", staging, e));
            }
        }

        Ok(staging.clone())
    }

    /// Make `staged` the live executable, retaining the current one as backup.
    ///
    /// `current_version` is recorded alongside the backup so a later rollback
    /// can name the version it restores.
    pub async fn promote(&self, staged: &Path, current_version: &str) -> Result<(), UpgradeError> {
        let result = self.try_promote(staged, current_version).await;
        if result.is_err() {
            remove_if_present(staged).await;
        }
        result
    }

    async fn try_promote(&self, staged: &Path, current_version: &str) -> Result<(), UpgradeError> {
        verify_executable(staged, "staged binary").await?;
        self.recover_interrupted().await;
        self.replace_verified(staged, current_version).await?;
        info!("Promoted {:?} to {:?}", staged, self.state.current);
        Ok(())
    }

    /// Back up `current` and rename a verified candidate over it.
    ///
    /// The previous backup is only discarded once the swap has succeeded. A
    /// failed swap puts it back, so the backup slot again describes the last
    /// successful upgrade.
    pub(crate) async fn replace_verified(
        &self,
        staged: &Path,
        current_version: &str,
    ) -> Result<(), UpgradeError> {
        self.retain_backup(current_version).await?;
        if let Err(e) = self.swap_in(staged).await {
            self.restore_previous_backup().await;
            return Err(e);
        }
        self.discard_previous_backup().await;
        Ok(())
    }

    /// Copy `current` into the backup slot without disturbing `current`.
    ///
    /// The copy lands under a temporary name first. Any existing backup is
    /// moved to `<exe>.backup.prev` rather than overwritten, and stays there
    /// until the promotion either completes or is undone.
    pub(crate) async fn retain_backup(&self, current_version: &str) -> Result<(), UpgradeError> {
        let ExecutableState {
            current,
            backup,
            ..
        } = &self.state;

        if !current.is_file() {
            return Err(UpgradeError::replace(
                "read current executable",
                current,
                std::io::Error::new(std::io::ErrorKind::NotFound, "executable does not exist"),
            ));
        }

        let pending = self.state.pending_backup();
        debug!("Copying {:?} to {:?}", current, pending);
        if let Err(e) = fs::copy(current, &pending).await {
            remove_if_present(&pending).await;
            return Err(UpgradeError::replace("copy current executable to backup", &pending, e));
        }

        if let Err(e) = self.set_aside_backup().await {
            remove_if_present(&pending).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&pending, backup).await {
            remove_if_present(&pending).await;
            self.restore_previous_backup().await;
            return Err(UpgradeError::replace("move copy into backup slot", backup, e));
        }
        info!("Retained backup at {:?}", backup);

        let record_path = self.state.record_path();
        let record = BackupRecord {
            version: current_version.to_string(),
            replaced_at: Utc::now(),
        };
        match serde_json::to_vec_pretty(&record) {
            Ok(bytes) => {
                if let Err(e) = fs::write(&record_path, bytes).await {
                    warn!("Failed to write backup record {:?}: {}", record_path, e);
                }
            }
            Err(e) => warn!("Failed to serialize backup record: {}", e),
        }

        Ok(())
    }

    async fn set_aside_backup(&self) -> Result<(), UpgradeError> {
        let backup = &self.state.backup;
        let previous = self.state.previous_backup();
        if backup.is_file() {
            fs::rename(backup, &previous)
                .await
                .map_err(|e| UpgradeError::replace("set aside previous backup", &previous, e))?;
            debug!("Set aside previous backup at {:?}", previous);
        }

        // The record must never describe a backup it does not belong to.
        let record_path = self.state.record_path();
        match fs::rename(&record_path, self.state.previous_record()).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to set aside backup record {:?}: {}", record_path, e);
                remove_if_present(&record_path).await;
            }
        }
        Ok(())
    }

    /// Return the backup slot to what it held before the current attempt.
    async fn restore_previous_backup(&self) {
        let backup = &self.state.backup;
        let record_path = self.state.record_path();
        let previous = self.state.previous_backup();

        if !previous.is_file() {
            // There was no backup before this attempt.
            remove_if_present(backup).await;
            remove_if_present(&record_path).await;
            return;
        }

        if let Err(e) = fs::rename(&previous, backup).await {
            warn!("Failed to restore previous backup {:?}: {}", previous, e);
            return;
        }
        remove_if_present(&record_path).await;
        match fs::rename(self.state.previous_record(), &record_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to restore backup record {:?}: {}", record_path, e),
        }
        info!("Restored previous backup at {:?}", backup);
    }

    async fn discard_previous_backup(&self) {
        remove_if_present(&self.state.previous_backup()).await;
        remove_if_present(&self.state.previous_record()).await;
    }

    /// Settle a promotion that stopped while the previous backup was set aside.
    ///
    /// If the swap never happened the backup slot holds a copy of `current`
    /// (or nothing), and the set-aside backup is put back. Otherwise the
    /// promotion had completed and the set-aside backup is stale.
    async fn recover_interrupted(&self) {
        if !self.state.previous_backup().is_file() {
            return;
        }

        let swapped = match (fs::read(&self.state.backup).await, fs::read(&self.state.current).await) {
            (Ok(backup), Ok(current)) => backup != current,
            _ => false,
        };
        if swapped {
            debug!("Discarding backup left by a completed upgrade");
            self.discard_previous_backup().await;
        } else {
            warn!("Recovering the backup set aside by an interrupted upgrade");
            self.restore_previous_backup().await;
        }
    }

    async fn swap_in(&self, staged: &Path) -> Result<(), UpgradeError> {
        let current = &self.state.current;
        fs::rename(staged, current)
            .await
            .map_err(|e| UpgradeError::replace("move staged binary into place", current, e))
    }

    /// Restore the backup over the live executable.
    ///
    /// The backup is checked the same way a staged binary is; a damaged
    /// backup is reported as [`UpgradeError::Replace`] and `current` is left
    /// alone. Returns the backup record when one was readable.
    pub async fn rollback(&self) -> Result<Option<BackupRecord>, UpgradeError> {
        self.recover_interrupted().await;

        let ExecutableState {
            current,
            backup,
            ..
        } = &self.state;

        if !self.backup_exists() {
            return Err(UpgradeError::NoBackupAvailable {
                path: backup.clone(),
            });
        }
        verify_executable(backup, "backup binary").await?;

        let record = self.read_record().await;
        warn!("Restoring {:?} from backup {:?}", current, backup);
        fs::rename(backup, current)
            .await
            .map_err(|e| UpgradeError::replace("restore backup over current executable", current, e))?;

        remove_if_present(&self.state.record_path()).await;
        info!("Successfully restored from backup");
        Ok(record)
    }

    /// The backup record, if present and well-formed.
    pub async fn read_record(&self) -> Option<BackupRecord> {
        let path = self.state.record_path();
        let content = fs::read(&path).await.ok()?;
        match serde_json::from_slice(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Ignoring unreadable backup record {:?}: {}", path, e);
                None
            }
        }
    }
}

async fn verify_executable(path: &Path, what: &str) -> Result<(), UpgradeError> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| UpgradeError::replace(format!("inspect {what}"), path, e))?;

    let invalid = |reason: &str| {
        UpgradeError::replace(
            format!("verify {what}"),
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, reason.to_string()),
        )
    };

    if !metadata.is_file() {
        return Err(invalid("not a regular file"));
    }
    if metadata.len() == 0 {
        return Err(invalid("file is empty"));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(invalid("file is not executable"));
        }
    }

    Ok(())
}

async fn remove_if_present(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {:?}: {}", path, e),
    }
}
