//! Version parsing and comparison for release tags.
//!
//! Release tags are compared with a small, permissive dialect of semantic
//! versioning rather than strict semver, because release indexes in the wild
//! carry tags such as `v1.2.3.4`, `0.9.0-beta7` or `V2.0`:
//!
//! - a leading `v` or `V` is ignored;
//! - the release part is a dot-separated list of any length (`1`, `1.2`,
//!   `1.2.3.4`);
//! - everything after the first `-` is the prerelease part, split on `.`;
//! - everything after the first `+` is build metadata and is discarded.
//!
//! The comparison does not only say "older" or "newer": it also reports when
//! the difference crosses a major boundary (see [`Relation`]), which is what
//! upgrade policies key off.
//!
//! # Module Organization
//!
//! - [`Version`] / [`PrereleaseIdent`] - the parsed form of a tag
//! - [`comparison`] - [`Relation`] and [`compare_versions`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use selfup::version::{Relation, compare_versions};
//!
//! assert_eq!(compare_versions("v0.3.0", "0.1.2"), Relation::MajorNewer);
//! assert_eq!(compare_versions("1.0.0-rc.1", "1.0.0"), Relation::Older);
//! assert_eq!(compare_versions("1.0.0+45", "1.0.0+23-dev-foo"), Relation::Equal);
//! ```

pub mod comparison;

pub use comparison::{Relation, compare_versions};

use std::fmt;

/// One dot-separated identifier of a prerelease tag.
///
/// Identifiers that parse as integers compare numerically (`beta.2` sorts
/// before `beta.11`), everything else compares as text. When the two kinds
/// meet at the same position, the numeric identifier is the older one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrereleaseIdent {
    /// An identifier that parsed as an integer, e.g. the `2` in `beta.2`
    Numeric(i64),
    /// Any other identifier, e.g. `beta` or `beta7`
    Text(String),
}

impl PrereleaseIdent {
    fn parse(field: &str) -> Self {
        match field.parse::<i64>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Text(field.to_string()),
        }
    }
}

impl fmt::Display for PrereleaseIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A release tag split into its comparable parts.
///
/// This is a transient parse result; build metadata is dropped during
/// parsing so two tags that differ only after `+` produce equal values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    /// Numeric release components, e.g. `[1, 2, 3]` for `1.2.3`. Never empty.
    pub release: Vec<u64>,
    /// Prerelease identifiers, e.g. `[Text("beta"), Numeric(2)]` for `-beta.2`.
    pub prerelease: Vec<PrereleaseIdent>,
}

impl Version {
    /// Parse a release tag.
    ///
    /// Parsing never fails. A release component that is not a number is read
    /// as `0`, so `1.x.3` parses like `1.0.3`; historical tags keep comparing
    /// instead of being rejected.
    ///
    /// ```rust,no_run
    /// use selfup::version::{PrereleaseIdent, Version};
    ///
    /// let v = Version::parse("v1.2.3-beta.2+build.7");
    /// assert_eq!(v.release, vec![1, 2, 3]);
    /// assert_eq!(
    ///     v.prerelease,
    ///     vec![PrereleaseIdent::Text("beta".into()), PrereleaseIdent::Numeric(2)]
    /// );
    /// ```
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let tag = tag.strip_prefix(['v', 'V']).unwrap_or(tag);
        let without_build = tag.split_once('+').map_or(tag, |(head, _)| head);
        let (release_part, prerelease_part) = match without_build.split_once('-') {
            Some((release, pre)) => (release, Some(pre)),
            None => (without_build, None),
        };

        let release = release_part.split('.').map(|field| field.parse::<u64>().unwrap_or(0)).collect();

        let prerelease = prerelease_part
            .map(|pre| pre.split('.').map(PrereleaseIdent::parse).collect())
            .unwrap_or_default();

        Self {
            release,
            prerelease,
        }
    }

    /// Whether this version carries a prerelease tag.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        f.write_str(&release.join("."))?;
        if !self.prerelease.is_empty() {
            let pre: Vec<String> = self.prerelease.iter().map(ToString::to_string).collect();
            write!(f, "-{}", pre.join("."))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_prefix_and_build_metadata() {
        let v = Version::parse("V1.0.0-beta.23+23-dev-foo");
        assert_eq!(v.release, vec![1, 0, 0]);
        assert_eq!(
            v.prerelease,
            vec![PrereleaseIdent::Text("beta".to_string()), PrereleaseIdent::Numeric(23)]
        );
    }

    #[test]
    fn test_parse_keeps_dashes_inside_prerelease() {
        let v = Version::parse("2.1-rc-1.x");
        assert_eq!(v.release, vec![2, 1]);
        assert_eq!(
            v.prerelease,
            vec![
                PrereleaseIdent::Text("rc-1".to_string()),
                PrereleaseIdent::Text("x".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_malformed_release_fields_become_zero() {
        assert_eq!(Version::parse("1.x.3").release, vec![1, 0, 3]);
        assert_eq!(Version::parse("").release, vec![0]);
        assert_eq!(Version::parse("latest").release, vec![0]);
    }

    #[test]
    fn test_parse_only_strips_one_prefix() {
        assert_eq!(Version::parse("vv1.2").release, vec![0, 2]);
    }

    #[test]
    fn test_display_round_trips_normalised_form() {
        assert_eq!(Version::parse("v1.2.3-beta.2+meta").to_string(), "1.2.3-beta.2");
        assert!(Version::parse("1.0.0-alpha").is_prerelease());
        assert!(!Version::parse("1.0.0+alpha").is_prerelease());
    }
}
