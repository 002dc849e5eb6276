//! selfup CLI entry point
//!
//! - `list` - list releases newer than a version
//! - `apply` - install a release asset over a binary
//! - `rollback` - put the previous binary back

use anyhow::Result;
use clap::Parser;
use selfup::cli;
use selfup::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
