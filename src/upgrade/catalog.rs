//! Release discovery against a release index.
//!
//! [`ReleaseCatalog::list_releases`] performs a single request for the first
//! page of a project's releases, then keeps only the entries an upgrade
//! policy allows:
//!
//! 1. prereleases are dropped unless `allow_prerelease` is set;
//! 2. anything not strictly newer than the current version is dropped;
//! 3. major upgrades are dropped unless `allow_major_upgrade` is set.
//!
//! Survivors are sorted newest first and capped at [`MAX_RELEASES`]. An empty
//! result with `Ok` means the index answered but nothing qualifies.
//!
//! The index schema is the GitHub releases API: an array of objects with
//! `tag_name`, `prerelease` and `assets[].{name,url}`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::UpgradeConfig;
use crate::core::UpgradeError;
use crate::upgrade::fetch::{ACCEPT_JSON, Fetcher};
use crate::version::{Relation, compare_versions};

/// Maximum number of releases returned by [`ReleaseCatalog::list_releases`].
pub const MAX_RELEASES: usize = 5;

/// One published version and its downloadable files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Version tag, e.g. `v1.2.3` or `0.4.0-rc.1`
    pub version: String,
    /// One archive per OS/architecture, in index order
    pub assets: Vec<Asset>,
}

/// A downloadable archive belonging to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Display name, usually encoding OS and architecture
    pub name: String,
    /// Download URL; request it with `Accept: application/octet-stream`
    pub url: String,
}

impl Release {
    /// Keep only the assets whose name matches `pattern`.
    pub fn retain_assets(&mut self, pattern: &Regex) {
        self.assets.retain(|asset| pattern.is_match(&asset.name));
    }
}

/// Assets of `release` whose name matches `pattern`.
///
/// ```rust,no_run
/// use regex::Regex;
/// use selfup::upgrade::catalog::{Asset, Release, matching_assets};
///
/// let release = Release {
///     version: "v1.2.0".into(),
///     assets: vec![
///         Asset { name: "app-linux-amd64.tar.gz".into(), url: "https://x/1".into() },
///         Asset { name: "app-windows-amd64.zip".into(), url: "https://x/2".into() },
///     ],
/// };
/// let linux = matching_assets(&Regex::new("linux-amd64").unwrap(), &release);
/// assert_eq!(linux.len(), 1);
/// ```
#[must_use]
pub fn matching_assets(pattern: &Regex, release: &Release) -> Vec<Asset> {
    release.assets.iter().filter(|asset| pattern.is_match(&asset.name)).cloned().collect()
}

/// Wire shape of one index entry.
#[derive(Debug, Deserialize)]
struct IndexEntry {
    tag_name: String,
    prerelease: bool,
    assets: Vec<Asset>,
}

/// Lists upgrade candidates from a release index.
#[derive(Debug, Clone)]
pub struct ReleaseCatalog<F> {
    fetcher: F,
    index_url: String,
    page_size: u32,
}

impl<F: Fetcher> ReleaseCatalog<F> {
    /// A catalog for the GitHub API with a page size of 30.
    pub fn new(fetcher: F) -> Self {
        let defaults = UpgradeConfig::default();
        Self {
            fetcher,
            index_url: defaults.index_url,
            page_size: defaults.page_size,
        }
    }

    /// A catalog using the index URL and page size from `config`.
    pub fn from_config(fetcher: F, config: &UpgradeConfig) -> Self {
        Self {
            fetcher,
            index_url: config.index_url.clone(),
            page_size: config.page_size,
        }
    }

    /// Use a different index base URL.
    #[must_use]
    pub fn with_index_url(mut self, index_url: impl Into<String>) -> Self {
        self.index_url = index_url.into();
        self
    }

    /// Request a different number of releases per page.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn releases_url(&self, project: &str) -> String {
        format!(
            "{}/repos/{}/releases?per_page={}",
            self.index_url.trim_end_matches('/'),
            project,
            self.page_size
        )
    }

    /// Releases of `project` that are newer than `current_version` and allowed
    /// by the policy flags, newest first, at most [`MAX_RELEASES`].
    ///
    /// # Errors
    ///
    /// - [`UpgradeError::Fetch`] / [`UpgradeError::FetchStatus`] if the request
    ///   fails or returns a non-2xx status
    /// - [`UpgradeError::Decode`] if the body is not a list of releases
    pub async fn list_releases(
        &self,
        project: &str,
        current_version: &str,
        allow_major_upgrade: bool,
        allow_prerelease: bool,
    ) -> Result<Vec<Release>, UpgradeError> {
        let url = self.releases_url(project);
        debug!("Listing releases of {} newer than {}", project, current_version);

        let body = self.fetcher.get(&url, ACCEPT_JSON).await?.error_for_status()?.bytes().await?;

        let entries: Vec<IndexEntry> =
            serde_json::from_slice(&body).map_err(|e| UpgradeError::Decode {
                reason: e.to_string(),
            })?;
        debug!("Release index returned {} entries", entries.len());

        let releases = select_candidates(entries, current_version, allow_major_upgrade, allow_prerelease);
        info!("{} eligible release(s) for {} above {}", releases.len(), project, current_version);
        Ok(releases)
    }
}

fn select_candidates(
    entries: Vec<IndexEntry>,
    current_version: &str,
    allow_major_upgrade: bool,
    allow_prerelease: bool,
) -> Vec<Release> {
    let mut releases: Vec<Release> = entries
        .into_iter()
        .filter(|entry| {
            if entry.prerelease && !allow_prerelease {
                debug!("Skipping prerelease {}", entry.tag_name);
                return false;
            }
            match compare_versions(&entry.tag_name, current_version) {
                Relation::MajorNewer if !allow_major_upgrade => {
                    debug!("Skipping major upgrade {}", entry.tag_name);
                    false
                }
                relation => relation.is_newer(),
            }
        })
        .map(|entry| Release {
            version: entry.tag_name,
            assets: entry.assets,
        })
        .collect();

    releases.sort_by(|a, b| compare_versions(&b.version, &a.version).to_ordering());
    releases.truncate(MAX_RELEASES);
    releases
}
