use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use regex::Regex;
use std::fmt::Write;

use crate::config::{UpgradeConfig, compile_asset_pattern};
use crate::upgrade::{HttpFetcher, Release, ReleaseCatalog};

/// List releases newer than the current version.
///
/// Output has one `Release <version>` line per release, followed by an
/// indented `Asset <name> at <url>` line per asset. With `--match`, only
/// matching assets are shown. Releases without assets to show are skipped.
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Version to compare against, e.g. v1.3.0
    pub current_version: String,

    /// Project as owner/name; defaults to `project` in the config file
    #[arg(long, value_name = "OWNER/NAME")]
    pub project: Option<String>,

    /// Include prereleases
    #[arg(long)]
    pub pre: bool,

    /// Include releases with a newer major version
    #[arg(long)]
    pub major: bool,

    /// Only show assets whose name matches this regular expression
    #[arg(long = "match", value_name = "REGEX")]
    pub pattern: Option<String>,
}

impl ListCommand {
    pub async fn execute(self, config: &UpgradeConfig) -> Result<()> {
        let project = self.project.or_else(|| config.project.clone()).context(
            "No project given; pass --project or set `project` in the config file",
        )?;
        let pattern = match self.pattern.as_deref() {
            Some(pattern) => Some(compile_asset_pattern(pattern)?),
            None => config.asset_regex()?,
        };

        let catalog = ReleaseCatalog::from_config(HttpFetcher::from_config(config)?, config);
        let releases = catalog
            .list_releases(
                &project,
                &self.current_version,
                self.major || config.allow_major,
                self.pre || config.allow_prerelease,
            )
            .await
            .with_context(|| format!("Failed to list releases of {project}"))?;

        let output = render_releases(&releases, pattern.as_ref());
        if output.is_empty() {
            eprintln!("{}", format!("No release newer than {}", self.current_version).dimmed());
        } else {
            print!("{output}");
        }
        Ok(())
    }
}

/// Render releases in the `list` output format.
pub fn render_releases(releases: &[Release], pattern: Option<&Regex>) -> String {
    let mut out = String::new();
    for release in releases {
        let mut release = release.clone();
        if let Some(pattern) = pattern {
            release.retain_assets(pattern);
        }
        if release.assets.is_empty() {
            continue;
        }
        let _ = writeln!(out, "Release {}", release.version);
        for asset in &release.assets {
            let _ = writeln!(out, "    Asset {} at {}", asset.name, asset.url);
        }
    }
    out
}
