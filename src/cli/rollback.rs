use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::upgrade::backup::{BackupManager, running_executable};

/// Restore the binary an upgrade replaced from `<binary>.old`.
#[derive(Args, Debug)]
pub struct RollbackCommand {
    /// Binary to restore; defaults to the running executable
    #[arg(long, value_name = "PATH")]
    pub binary: Option<PathBuf>,
}

impl RollbackCommand {
    pub async fn execute(self) -> Result<()> {
        let binary = match self.binary {
            Some(binary) => binary,
            None => running_executable().await?,
        };

        let manager = BackupManager::new(binary);
        if !manager.has_previous() {
            bail!("No previous binary found at {}", manager.old_path().display());
        }

        manager.restore_previous().await?;
        println!("{} Restored {}", "✓".green(), manager.binary_path().display());
        Ok(())
    }
}
