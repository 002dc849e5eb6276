//! Command-line interface for selfup.
//!
//! # Commands
//!
//! - `list` - releases of a project newer than a given version
//! - `apply` - download, verify and install a release asset
//! - `rollback` - restore the binary an upgrade replaced
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - no logging
//! - `--config <PATH>` - configuration file (default `~/.selfup/config.toml`,
//!   or `$SELFUP_CONFIG`)
//!
//! `RUST_LOG`, when set, overrides both verbosity flags.
//!
//! # Examples
//!
//! ```bash
//! selfup list --project acme/widget v1.3.0 --match linux-amd64
//! selfup apply https://example.com/widget-linux-amd64.tar.gz --key release.pub --binary ./widget
//! selfup rollback --binary ./widget
//! ```

mod apply;
mod list;
mod rollback;

pub use apply::ApplyCommand;
pub use list::{ListCommand, render_releases};
pub use rollback::RollbackCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::UpgradeConfig;

/// Top-level command line.
#[derive(Parser, Debug)]
#[command(
    name = "selfup",
    about = "Find and install signed releases of a command-line tool",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable logging; errors are still printed
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List releases newer than a version
    List(ListCommand),
    /// Install a release asset over a binary
    Apply(ApplyCommand),
    /// Restore the binary replaced by the last upgrade
    Rollback(RollbackCommand),
}

impl Cli {
    /// Run the parsed command.
    ///
    /// Logging is initialized first, then the configuration file is loaded
    /// (a missing file yields defaults) and handed to the subcommand.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        let config = UpgradeConfig::load_with_optional(self.config.clone()).await?;

        match self.command {
            Commands::List(cmd) => cmd.execute(&config).await,
            Commands::Apply(cmd) => cmd.execute(&config).await,
            Commands::Rollback(cmd) => cmd.execute().await,
        }
    }

    /// The log filter the flags ask for; `None` disables logging.
    fn log_filter(&self) -> Option<EnvFilter> {
        if std::env::var_os("RUST_LOG").is_some() {
            Some(EnvFilter::from_default_env())
        } else if self.quiet {
            None
        } else if self.verbose {
            Some(EnvFilter::new("selfup=debug"))
        } else {
            Some(EnvFilter::new("selfup=info"))
        }
    }

    fn init_logging(&self) {
        let Some(filter) = self.log_filter() else {
            return;
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}
