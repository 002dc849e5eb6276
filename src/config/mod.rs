//! Configuration for selfup.
//!
//! Settings live in a single TOML file (see [`global`] for its location and
//! format). They describe where releases come from and which ones are
//! acceptable; the caller's flags override them per invocation.
//!
//! ```rust,no_run
//! use selfup::config::UpgradeConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = UpgradeConfig::load().await?;
//! if let Some(project) = &config.project {
//!     println!("checking {project} for releases of {}", config.binary_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod global;

pub use global::{CONFIG_ENV_VAR, UpgradeConfig, compile_asset_pattern};
