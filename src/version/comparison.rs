//! Five-valued version relation.
//!
//! [`compare_versions`] is the single comparator used to filter, sort and
//! gate releases. Besides older/equal/newer it reports whether the first
//! differing component is the "major" one: the first component, or the second
//! component while the first is `0` (a `0.x.y` scheme treats `x` as major).

use std::cmp::Ordering;
use std::fmt;

use super::{PrereleaseIdent, Version};

/// How version `a` relates to version `b` in `compare_versions(a, b)`.
///
/// Variants are declared in ascending order, so the derived [`Ord`] ranks
/// `MajorOlder < Older < Equal < Newer < MajorNewer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    /// Older by a major version (`x` in `x.y.z`, or `y` in `0.y.z`)
    MajorOlder,
    /// Older by a minor, patch or prerelease difference
    Older,
    /// Semantically equal
    Equal,
    /// Newer by a minor, patch or prerelease difference
    Newer,
    /// Newer by a major version (`x` in `x.y.z`, or `y` in `0.y.z`)
    MajorNewer,
}

impl Relation {
    /// `true` for [`Newer`](Self::Newer) and [`MajorNewer`](Self::MajorNewer).
    #[must_use]
    pub const fn is_newer(self) -> bool {
        matches!(self, Self::Newer | Self::MajorNewer)
    }

    /// `true` for [`Older`](Self::Older) and [`MajorOlder`](Self::MajorOlder).
    #[must_use]
    pub const fn is_older(self) -> bool {
        matches!(self, Self::Older | Self::MajorOlder)
    }

    /// `true` when the difference crosses a major boundary.
    #[must_use]
    pub const fn is_major(self) -> bool {
        matches!(self, Self::MajorOlder | Self::MajorNewer)
    }

    /// The relation seen from the other side: `compare(b, a)`.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::MajorOlder => Self::MajorNewer,
            Self::Older => Self::Newer,
            Self::Equal => Self::Equal,
            Self::Newer => Self::Older,
            Self::MajorNewer => Self::MajorOlder,
        }
    }

    /// Collapse to a plain [`Ordering`], dropping the major bit.
    #[must_use]
    pub const fn to_ordering(self) -> Ordering {
        match self {
            Self::MajorOlder | Self::Older => Ordering::Less,
            Self::Equal => Ordering::Equal,
            Self::Newer | Self::MajorNewer => Ordering::Greater,
        }
    }

    const fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Self::Older,
            Ordering::Equal => Self::Equal,
            Ordering::Greater => Self::Newer,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MajorOlder => "major older",
            Self::Older => "older",
            Self::Equal => "equal",
            Self::Newer => "newer",
            Self::MajorNewer => "major newer",
        };
        f.write_str(name)
    }
}

/// Compare two release tags.
///
/// The strings are parsed with [`Version::parse`], so this never fails;
/// malformed numeric components compare as `0`.
///
/// ```rust,no_run
/// use selfup::version::{Relation, compare_versions};
///
/// assert_eq!(compare_versions("0.1.3", "0.1.2"), Relation::Newer);
/// assert_eq!(compare_versions("1.0.0-beta.2", "1.0.0-beta.11"), Relation::Older);
/// assert_eq!(compare_versions("v1.1.2", "V1.1.2"), Relation::Equal);
/// ```
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Relation {
    Version::parse(a).relation_to(&Version::parse(b))
}

impl Version {
    /// How `self` relates to `other`.
    #[must_use]
    pub fn relation_to(&self, other: &Self) -> Relation {
        for (i, (a, b)) in self.release.iter().zip(&other.release).enumerate() {
            let ordering = a.cmp(b);
            if ordering == Ordering::Equal {
                continue;
            }
            let crosses_major = i == 0 || (i == 1 && self.release[0] == 0);
            return match ordering {
                Ordering::Less if crosses_major => Relation::MajorOlder,
                Ordering::Greater if crosses_major => Relation::MajorNewer,
                ordering => Relation::from_ordering(ordering),
            };
        }

        // 1.2.3.1 is newer than 1.2.3
        let by_length = self.release.len().cmp(&other.release.len());
        if by_length != Ordering::Equal {
            return Relation::from_ordering(by_length);
        }

        // A release is newer than any prerelease of the same version
        match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
            (true, true) => return Relation::Equal,
            (true, false) => return Relation::Newer,
            (false, true) => return Relation::Older,
            (false, false) => {}
        }

        for (a, b) in self.prerelease.iter().zip(&other.prerelease) {
            let ordering = compare_idents(a, b);
            if ordering != Ordering::Equal {
                return Relation::from_ordering(ordering);
            }
        }

        Relation::from_ordering(self.prerelease.len().cmp(&other.prerelease.len()))
    }
}

fn compare_idents(a: &PrereleaseIdent, b: &PrereleaseIdent) -> Ordering {
    match (a, b) {
        (PrereleaseIdent::Numeric(x), PrereleaseIdent::Numeric(y)) => x.cmp(y),
        (PrereleaseIdent::Text(x), PrereleaseIdent::Text(y)) => x.as_bytes().cmp(y.as_bytes()),
        (PrereleaseIdent::Numeric(_), PrereleaseIdent::Text(_)) => Ordering::Less,
        (PrereleaseIdent::Text(_), PrereleaseIdent::Numeric(_)) => Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: &[(&str, &str, Relation)] = &[
        ("0.1.2", "0.1.2", Relation::Equal),
        ("0.1.3", "0.1.2", Relation::Newer),
        ("0.1.1", "0.1.2", Relation::Older),
        ("0.3.0", "0.1.2", Relation::MajorNewer),
        ("0.0.9", "0.1.2", Relation::MajorOlder),
        ("1.3.0", "1.1.2", Relation::Newer),
        ("1.0.9", "1.1.2", Relation::Older),
        ("2.3.0", "1.1.2", Relation::MajorNewer),
        ("1.0.9", "2.1.2", Relation::MajorOlder),
        ("1.1.2", "0.1.2", Relation::MajorNewer),
        ("0.1.2", "1.1.2", Relation::MajorOlder),
        ("0.1.10", "0.1.9", Relation::Newer),
        ("0.10.0", "0.2.0", Relation::MajorNewer),
        ("30.10.0", "4.9.0", Relation::MajorNewer),
        ("0.9.0-beta7", "0.9.0-beta6", Relation::Newer),
        ("0.9.0-beta7", "1.0.0-alpha", Relation::MajorOlder),
        ("1.0.0-alpha", "1.0.0-alpha.1", Relation::Older),
        ("1.0.0-alpha.1", "1.0.0-alpha.beta", Relation::Older),
        ("1.0.0-alpha.beta", "1.0.0-beta", Relation::Older),
        ("1.0.0-beta", "1.0.0-beta.2", Relation::Older),
        ("1.0.0-beta.2", "1.0.0-beta.11", Relation::Older),
        ("1.0.0-beta.11", "1.0.0-rc.1", Relation::Older),
        ("1.0.0-rc.1", "1.0.0", Relation::Older),
        ("1.0.0+45", "1.0.0+23-dev-foo", Relation::Equal),
        ("1.0.0-beta.23+45", "1.0.0-beta.23+23-dev-foo", Relation::Equal),
        ("1.0.0-beta.3+99", "1.0.0-beta.24+0", Relation::Older),
        ("v1.1.2", "1.1.2", Relation::Equal),
        ("v1.1.2", "V1.1.2", Relation::Equal),
        ("1.1.2", "V1.1.2", Relation::Equal),
        ("1.2.3.1", "1.2.3", Relation::Newer),
        ("1.2", "1.2.0", Relation::Older),
    ];

    #[test]
    fn test_compare_versions_table() {
        for &(a, b, expected) in CASES {
            assert_eq!(compare_versions(a, b), expected, "compare_versions({a:?}, {b:?})");
        }
    }

    #[test]
    fn test_compare_versions_is_antisymmetric() {
        for &(a, b, expected) in CASES {
            assert_eq!(compare_versions(b, a), expected.reverse(), "compare_versions({b:?}, {a:?})");
        }
    }

    #[test]
    fn test_compare_with_self_is_equal() {
        for &(a, b, _) in CASES {
            assert_eq!(compare_versions(a, a), Relation::Equal);
            assert_eq!(compare_versions(b, b), Relation::Equal);
        }
    }

    #[test]
    fn test_numeric_prerelease_sorts_before_text() {
        assert_eq!(compare_versions("1.0.0-1", "1.0.0-alpha"), Relation::Older);
        assert_eq!(compare_versions("1.0.0-alpha", "1.0.0-1"), Relation::Newer);
    }

    #[test]
    fn test_second_component_is_minor_once_past_zero() {
        assert_eq!(compare_versions("1.5.0", "1.3.0"), Relation::Newer);
        assert_eq!(compare_versions("0.5.0", "0.3.0"), Relation::MajorNewer);
        assert_eq!(compare_versions("0.0.5", "0.0.3"), Relation::Newer);
    }

    #[test]
    fn test_relation_helpers() {
        assert!(Relation::MajorNewer.is_newer());
        assert!(Relation::MajorNewer.is_major());
        assert!(Relation::Older.is_older());
        assert!(!Relation::Equal.is_newer());
        assert!(Relation::MajorOlder < Relation::Older);
        assert!(Relation::Newer < Relation::MajorNewer);
        assert_eq!(Relation::MajorOlder.to_ordering(), Ordering::Less);
        assert_eq!(Relation::Newer.to_string(), "newer");
    }
}
