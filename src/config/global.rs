//! The on-disk configuration file.
//!
//! # Location
//!
//! - **Unix/macOS**: `~/.selfup/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\selfup\config.toml`
//! - Overridden by the `SELFUP_CONFIG` environment variable or `--config`
//!
//! # Example
//!
//! ```toml
//! project = "acme/widget"
//! binary_name = "widget"
//! allow_prerelease = false
//! allow_major = false
//! asset_pattern = "linux-amd64"
//! public_key = "~/.selfup/release.pub"
//! ```

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::core::UpgradeError;

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV_VAR: &str = "SELFUP_CONFIG";

/// Settings shared by the `list` and `apply` commands.
///
/// Every field has a default, so an empty or missing file is valid. Command
/// line flags take precedence over values loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    /// Base URL of the release index API.
    pub index_url: String,

    /// Number of releases requested from the index. Only this first page is
    /// read.
    pub page_size: u32,

    /// Project whose releases are listed, as `owner/name`.
    pub project: Option<String>,

    /// Executable name expected inside release archives (without `.exe`).
    pub binary_name: String,

    /// Offer releases that cross a major version boundary.
    pub allow_major: bool,

    /// Offer releases flagged as prereleases.
    pub allow_prerelease: bool,

    /// Regular expression selecting the asset for this platform.
    pub asset_pattern: Option<String>,

    /// Path to the trusted release signing key. `~` is expanded.
    pub public_key: Option<String>,

    /// Skip TLS certificate validation. Releases are still signature checked.
    pub accept_invalid_certs: bool,

    /// Transport timeout in seconds; `0` disables it.
    pub timeout_secs: u64,

    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            index_url: "https://api.github.com".to_string(),
            page_size: 30,
            project: None,
            binary_name: "selfup".to_string(),
            allow_major: false,
            allow_prerelease: false,
            asset_pattern: None,
            public_key: None,
            accept_invalid_certs: true,
            timeout_secs: 0,
            user_agent: format!("selfup/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl UpgradeConfig {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` if given, otherwise from [`default_path`](Self::default_path).
    ///
    /// A missing file yields [`UpgradeConfig::default`].
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// The configuration path: `$SELFUP_CONFIG` if set, else the platform
    /// default.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data, on Windows) directory
    /// cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("selfup")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".selfup")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// The trusted key path with `~` expanded, if one is configured.
    #[must_use]
    pub fn public_key_path(&self) -> Option<PathBuf> {
        self.public_key.as_deref().map(|raw| PathBuf::from(shellexpand::tilde(raw).into_owned()))
    }

    /// Read the trusted key bytes from [`public_key_path`](Self::public_key_path).
    pub async fn read_public_key(&self) -> Result<Vec<u8>> {
        let path = self
            .public_key_path()
            .context("No trusted public key configured; set `public_key` or pass --key")?;
        fs::read(&path)
            .await
            .with_context(|| format!("Failed to read public key from {}", path.display()))
    }

    /// Compile [`asset_pattern`](Self::asset_pattern), if set.
    pub fn asset_regex(&self) -> Result<Option<Regex>, UpgradeError> {
        self.asset_pattern.as_deref().map(compile_asset_pattern).transpose()
    }

    /// Transport timeout, `None` when disabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Compile an asset name pattern, mapping failures to
/// [`UpgradeError::InvalidPattern`].
pub fn compile_asset_pattern(pattern: &str) -> Result<Regex, UpgradeError> {
    Regex::new(pattern).map_err(|e| UpgradeError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
