//! selfup - release discovery and signed self-update for command-line tools
//!
//! A binary that ships through a release index (the GitHub releases API, or
//! anything serving the same JSON shape) can use this crate to find newer
//! releases of itself and replace its own executable with one of them.
//!
//! # Architecture Overview
//!
//! - [`version`] - the five-valued version relation (`MajorOlder` .. `MajorNewer`)
//! - [`upgrade`] - release catalog, archive extraction, signature checks and the swap
//! - [`config`] - the optional `~/.selfup/config.toml`
//! - [`core`] - the error taxonomy and user-facing error rendering
//! - [`cli`] - the `selfup` command (`list`, `apply`, `rollback`)
//!
//! # Upgrading in-process
//!
//! ```rust,no_run
//! use selfup::config::UpgradeConfig;
//! use selfup::upgrade::{HttpFetcher, ReleaseCatalog, SelfUpdater};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = UpgradeConfig::load().await?;
//! let catalog = ReleaseCatalog::from_config(HttpFetcher::from_config(&config)?, &config);
//!
//! let releases = catalog.list_releases("acme/widget", "v1.3.0", false, false).await?;
//! if let Some(asset) = releases.first().and_then(|r| r.assets.first()) {
//!     let key = config.read_public_key().await?;
//!     SelfUpdater::from_config(&config)?.upgrade_to_url(&asset.url, &key).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The new binary takes effect the next time it is started.

pub mod cli;
pub mod config;
pub mod core;
pub mod upgrade;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
