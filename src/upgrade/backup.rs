use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::core::{INSTALL_OPERATION, UpgradeError};

/// Suffix of the previous binary kept next to the installed one.
pub const OLD_SUFFIX: &str = ".old";

/// Swaps a verified binary into place and keeps the one it replaces.
///
/// The replaced binary is moved to `<binary>.old` in the same directory. Only
/// one previous version is kept: a stale `.old` file is removed before each
/// swap.
///
/// # Swap sequence
///
/// 1. remove `<binary>.old`, ignoring failures
/// 2. rename `<binary>` to `<binary>.old`
/// 3. rename the staged file to `<binary>`
///
/// If step 2 fails nothing has changed. If step 3 fails the destination path
/// is empty and the previous binary is at `<binary>.old`; the error names the
/// install operation so callers can point at [`restore_previous`](Self::restore_previous).
///
/// Both renames stay inside one directory, so they are atomic on the platforms
/// we target. A binary that is currently running may be renamed on all of
/// them.
///
/// # Examples
///
/// ```rust,no_run
/// use selfup::upgrade::backup::BackupManager;
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let manager = BackupManager::new(PathBuf::from("/usr/local/bin/widget"));
/// if manager.has_previous() {
///     manager.restore_previous().await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupManager {
    binary_path: PathBuf,
    old_path: PathBuf,
}

impl BackupManager {
    /// A manager for the binary at `binary_path`.
    pub fn new(binary_path: PathBuf) -> Self {
        let mut old = OsString::from(binary_path.as_os_str());
        old.push(OLD_SUFFIX);

        Self {
            binary_path,
            old_path: PathBuf::from(old),
        }
    }

    /// The managed binary.
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Where the previous binary is kept.
    pub fn old_path(&self) -> &Path {
        &self.old_path
    }

    /// Whether a previous binary is available.
    pub fn has_previous(&self) -> bool {
        self.old_path.is_file()
    }

    /// Install `staged` at the binary path, moving the current binary aside.
    ///
    /// `staged` must live in the same directory as the binary.
    ///
    /// # Errors
    ///
    /// [`UpgradeError::Io`] if either rename fails. A failure of the second
    /// rename uses [`INSTALL_OPERATION`] as its operation.
    pub async fn swap_in(&self, staged: NamedTempFile) -> Result<(), UpgradeError> {
        match fs::remove_file(&self.old_path).await {
            Ok(()) => debug!("Removed stale {}", self.old_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", self.old_path.display(), e),
        }

        fs::rename(&self.binary_path, &self.old_path)
            .await
            .map_err(|e| UpgradeError::io("move aside", &self.binary_path, e))?;
        debug!("Moved {} to {}", self.binary_path.display(), self.old_path.display());

        // On failure the staged file is handed back inside the error and
        // removed when it drops.
        staged.persist(&self.binary_path).map_err(|e| {
            warn!(
                "Install failed; the previous binary is at {}",
                self.old_path.display()
            );
            UpgradeError::io(INSTALL_OPERATION, &self.binary_path, e.error)
        })?;

        info!("Installed new binary at {}", self.binary_path.display());
        Ok(())
    }

    /// Move `<binary>.old` back over the binary.
    ///
    /// Windows may briefly lock a binary that just exited, so the rename is
    /// attempted up to three times there.
    ///
    /// # Errors
    ///
    /// [`UpgradeError::Io`] if there is no previous binary or it cannot be
    /// moved back.
    pub async fn restore_previous(&self) -> Result<(), UpgradeError> {
        if !self.has_previous() {
            return Err(UpgradeError::io(
                "restore previous binary from",
                &self.old_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no previous binary"),
            ));
        }

        warn!("Restoring {} from {}", self.binary_path.display(), self.old_path.display());

        const MAX_ATTEMPTS: u32 = if cfg!(windows) { 3 } else { 1 };
        let mut attempt = 1;
        loop {
            match fs::rename(&self.old_path, &self.binary_path).await {
                Ok(()) => {
                    info!("Restored previous binary at {}", self.binary_path.display());
                    return Ok(());
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!("Restore attempt {} failed: {}. Retrying...", attempt, e);
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(UpgradeError::io(
                        "restore previous binary from",
                        &self.old_path,
                        e,
                    ));
                }
            }
        }
    }
}

/// The running executable with symlinks resolved.
///
/// Both installing over and restoring the running executable go through
/// this, so `<binary>.old` always sits next to the real file.
pub async fn running_executable() -> Result<PathBuf, UpgradeError> {
    let current = std::env::current_exe()
        .map_err(|e| UpgradeError::io("locate", "the running executable", e))?;
    resolve_binary(&current).await
}

/// `path` with symlinks resolved.
pub async fn resolve_binary(path: &Path) -> Result<PathBuf, UpgradeError> {
    fs::canonicalize(path).await.map_err(|e| UpgradeError::io("resolve", path, e))
}
