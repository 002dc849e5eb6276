use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::UpgradeConfig;
use crate::upgrade::SelfUpdater;

/// Install a release asset over a binary.
#[derive(Args, Debug)]
pub struct ApplyCommand {
    /// Download URL of the release archive
    pub url: String,

    /// Trusted public key file; defaults to `public_key` in the config file
    #[arg(long, value_name = "PATH")]
    pub key: Option<PathBuf>,

    /// Binary to replace; defaults to the running executable
    #[arg(long, value_name = "PATH")]
    pub binary: Option<PathBuf>,

    /// Executable name inside the archive; defaults to `binary_name` in the
    /// config file
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}

impl ApplyCommand {
    pub async fn execute(self, config: &UpgradeConfig) -> Result<()> {
        let key = match &self.key {
            Some(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read public key from {}", path.display()))?,
            None => config.read_public_key().await?,
        };

        let mut updater = SelfUpdater::from_config(config)?;
        if let Some(name) = &self.name {
            updater = updater.with_binary_name(name);
        }

        let target = match &self.binary {
            Some(binary) => {
                updater.apply_upgrade(binary, &self.url, &key).await?;
                binary.display().to_string()
            }
            None => {
                updater.upgrade_to_url(&self.url, &key).await?;
                "the running executable".to_string()
            }
        };

        println!("{} Upgraded {}; restart it to use the new version", "✓".green(), target);
        Ok(())
    }
}
