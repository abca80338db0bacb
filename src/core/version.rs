//! core::version
//!
//! Semantic versions, compatibility rules, and changelog inspection.
//!
//! # Version grammar
//!
//! ```text
//! MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]
//! ```
//!
//! Ordering compares major, minor, and patch numerically. When both versions
//! carry a prerelease tag the tags compare lexically; a release outranks the
//! same numeric version with a prerelease (`2.0.0-alpha < 2.0.0`). Build
//! metadata never participates in ordering.
//!
//! # Compatibility
//!
//! [`check_compatibility`] evaluates a component version against an optional
//! [`CompatibilityRule`]. A component with no rule is always compatible; a
//! rule's constraints apply in a fixed order (min, max, allow-list,
//! deny-list) and the first violation wins.
//!
//! # Example
//!
//! ```
//! use refhub::core::version::VersionInfo;
//! use std::cmp::Ordering;
//!
//! let a = VersionInfo::parse("2.0.0-alpha").unwrap();
//! let b = VersionInfo::parse("2.0.0").unwrap();
//! assert_eq!(a.compare(&b), Ordering::Less);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;

/// `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`.
static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z.-]+))?(?:\+([0-9A-Za-z.-]+))?$")
        .expect("version pattern is valid")
});

/// Unanchored pattern locating a version inside a changelog heading.
static HEADING_VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?)")
        .expect("heading version pattern is valid")
});

/// Errors from version parsing and rule evaluation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version '{0}': expected MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]")]
    Malformed(String),

    #[error("numeric component of '{0}' is out of range")]
    NumberOutOfRange(String),

    #[error("rule for component '{component}' has invalid {field} '{value}'")]
    InvalidRule {
        component: String,
        field: &'static str,
        value: String,
    },
}

/// A parsed semantic version.
///
/// Constructed only through [`VersionInfo::parse`]; comparison is defined
/// only between parsed values. `Ord` implements the same relation as
/// [`VersionInfo::compare`], so build metadata and the original text never
/// affect ordering or equality.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
    /// The input text, preserved for display.
    pub original: String,
}

impl VersionInfo {
    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Malformed`] when the input does not match the
    /// grammar. Never panics.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let text = text.trim();
        let caps = VERSION_PATTERN
            .captures(text)
            .ok_or_else(|| VersionError::Malformed(text.to_string()))?;

        let number = |idx: usize| -> Result<u64, VersionError> {
            caps[idx]
                .parse()
                .map_err(|_| VersionError::NumberOutOfRange(text.to_string()))
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            prerelease: caps.get(4).map(|m| m.as_str().to_string()),
            build: caps.get(5).map(|m| m.as_str().to_string()),
            original: text.to_string(),
        })
    }

    /// Compare two versions.
    ///
    /// Major, minor, and patch compare numerically. Prerelease tags compare
    /// lexically when both are present; a release outranks the same numeric
    /// version with a prerelease. Build metadata is ignored.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialEq for VersionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for VersionInfo {}

impl PartialOrd for VersionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for VersionInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.original)
    }
}

/// Version constraints for one component.
///
/// All fields are optional; an absent field imposes no constraint.
/// Constraints apply in declaration order: `min_version`, `max_version`,
/// `compatible` allow-list, `incompatible` deny-list.
///
/// # Example
///
/// ```toml
/// [compatibility.assetutilities]
/// min_version = "1.2.0"
/// max_version = "2.0.0"
/// incompatible = ["1.3.1"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompatibilityRule {
    /// Lowest accepted version (inclusive).
    pub min_version: Option<String>,

    /// Highest accepted version (inclusive).
    pub max_version: Option<String>,

    /// Explicit allow-list; when non-empty, only these versions pass.
    pub compatible: Vec<String>,

    /// Explicit deny-list; these versions always fail.
    pub incompatible: Vec<String>,
}

/// Outcome of a compatibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    Incompatible { reason: String },
}

impl Compatibility {
    pub fn is_compatible(&self) -> bool {
        matches!(self, Compatibility::Compatible)
    }
}

/// Evaluate `version` of `component` against the rule table.
///
/// A component with no rule is always compatible. With a rule present the
/// constraints apply in order (min, max, allow-list, deny-list) and the
/// first violation wins.
///
/// # Errors
///
/// Returns an error when the component has a rule but `version` (or a bound
/// inside the rule) does not parse; the rule cannot be evaluated and
/// guessing either way would be wrong.
pub fn check_compatibility(
    component: &str,
    version: &str,
    rules: &HashMap<String, CompatibilityRule>,
) -> Result<Compatibility, VersionError> {
    let Some(rule) = rules.get(component) else {
        return Ok(Compatibility::Compatible);
    };

    let parsed = VersionInfo::parse(version)?;
    let bound = |field: &'static str, value: &str| -> Result<VersionInfo, VersionError> {
        VersionInfo::parse(value).map_err(|_| VersionError::InvalidRule {
            component: component.to_string(),
            field,
            value: value.to_string(),
        })
    };

    if let Some(min) = &rule.min_version {
        if parsed.compare(&bound("min_version", min)?) == Ordering::Less {
            return Ok(Compatibility::Incompatible {
                reason: format!("version {version} is below minimum {min}"),
            });
        }
    }

    if let Some(max) = &rule.max_version {
        if parsed.compare(&bound("max_version", max)?) == Ordering::Greater {
            return Ok(Compatibility::Incompatible {
                reason: format!("version {version} is above maximum {max}"),
            });
        }
    }

    if !rule.compatible.is_empty() && !rule.compatible.iter().any(|v| v == version) {
        return Ok(Compatibility::Incompatible {
            reason: format!("version {version} is not in the compatible list"),
        });
    }

    if rule.incompatible.iter().any(|v| v == version) {
        return Ok(Compatibility::Incompatible {
            reason: format!("version {version} is marked incompatible"),
        });
    }

    Ok(Compatibility::Compatible)
}

/// One breaking change extracted from a changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakingChange {
    /// The changelog section's version heading.
    pub version: String,
    /// The bullet text describing the change.
    pub description: String,
}

/// Result of scanning a changelog between two versions.
#[derive(Debug, Clone, Default)]
pub struct BreakingChanges {
    pub has_breaking_changes: bool,
    pub changes: Vec<BreakingChange>,
}

/// Scan `changelog` for breaking changes between `from` (exclusive) and
/// `to` (inclusive).
///
/// Sections are delimited by version-bearing headings (`#`-prefixed lines);
/// a section counts when its heading contains a version in `(from, to]`.
/// Within a section, a case-insensitive "breaking change" marker (heading or
/// plain line) starts collection of the bullet list beneath it, up to the
/// next heading. Version-less headings never start a section.
///
/// # Errors
///
/// Returns an error when `from` or `to` does not parse. Never panics.
pub fn check_breaking_changes(
    from: &str,
    to: &str,
    changelog: &str,
) -> Result<BreakingChanges, VersionError> {
    let from = VersionInfo::parse(from)?;
    let to = VersionInfo::parse(to)?;

    let mut result = BreakingChanges::default();
    let mut section: Option<String> = None;
    let mut in_marker = false;

    for line in changelog.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('#') {
            let version = HEADING_VERSION_PATTERN
                .captures(trimmed)
                .map(|caps| caps[1].to_string());
            match version {
                Some(v) => {
                    in_marker = false;
                    section = Some(v).filter(|v| match VersionInfo::parse(v) {
                        Ok(parsed) => parsed.compare(&from) == Ordering::Greater
                            && parsed.compare(&to) != Ordering::Greater,
                        Err(_) => false,
                    });
                }
                None => {
                    // A version-less sub-heading either opens a breaking
                    // section or closes the current one.
                    in_marker = section.is_some()
                        && trimmed.to_lowercase().contains("breaking change");
                }
            }
            continue;
        }

        let Some(version) = &section else {
            continue;
        };

        if trimmed.to_lowercase().contains("breaking change") {
            in_marker = true;
            continue;
        }

        if in_marker {
            if let Some(bullet) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                result.changes.push(BreakingChange {
                    version: version.clone(),
                    description: bullet.trim().to_string(),
                });
            } else if !trimmed.is_empty() {
                // End of the bullet list.
                in_marker = false;
            }
        }
    }

    result.has_breaking_changes = !result.changes.is_empty();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parsing {
        use super::*;

        #[test]
        fn plain_version() {
            let v = VersionInfo::parse("1.2.3").unwrap();
            assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
            assert_eq!(v.prerelease, None);
            assert_eq!(v.build, None);
            assert_eq!(v.original, "1.2.3");
        }

        #[test]
        fn prerelease_and_build() {
            let v = VersionInfo::parse("2.0.0-alpha.1+build.42").unwrap();
            assert_eq!(v.prerelease.as_deref(), Some("alpha.1"));
            assert_eq!(v.build.as_deref(), Some("build.42"));
        }

        #[test]
        fn build_only() {
            let v = VersionInfo::parse("1.0.0+sha.abc123").unwrap();
            assert_eq!(v.prerelease, None);
            assert_eq!(v.build.as_deref(), Some("sha.abc123"));
        }

        #[test]
        fn surrounding_whitespace_is_trimmed() {
            assert!(VersionInfo::parse(" 1.0.0 ").is_ok());
        }

        #[test]
        fn malformed_inputs_rejected() {
            for text in ["", "1", "1.2", "1.2.3.4", "v1.2.3", "a.b.c", "1.2.x", "1.2.3-"] {
                assert!(
                    matches!(VersionInfo::parse(text), Err(VersionError::Malformed(_))),
                    "expected '{text}' to be rejected"
                );
            }
        }

        #[test]
        fn oversized_number_rejected() {
            let text = format!("{}.0.0", "9".repeat(40));
            assert_eq!(
                VersionInfo::parse(&text),
                Err(VersionError::NumberOutOfRange(text.clone()))
            );
        }
    }

    mod ordering {
        use super::*;

        fn compare(a: &str, b: &str) -> Ordering {
            VersionInfo::parse(a)
                .unwrap()
                .compare(&VersionInfo::parse(b).unwrap())
        }

        #[test]
        fn numeric_components() {
            assert_eq!(compare("1.0.0", "2.0.0"), Ordering::Less);
            assert_eq!(compare("1.2.0", "1.1.9"), Ordering::Greater);
            assert_eq!(compare("1.1.2", "1.1.10"), Ordering::Less);
            assert_eq!(compare("1.2.3", "1.2.3"), Ordering::Equal);
        }

        #[test]
        fn prerelease_sorts_below_release() {
            assert_eq!(compare("2.0.0-alpha", "2.0.0"), Ordering::Less);
            assert_eq!(compare("2.0.0", "2.0.0-rc.1"), Ordering::Greater);
        }

        #[test]
        fn prerelease_tags_compare_lexically() {
            assert_eq!(compare("1.0.0-alpha", "1.0.0-beta"), Ordering::Less);
            assert_eq!(compare("1.0.0-rc", "1.0.0-rc"), Ordering::Equal);
        }

        #[test]
        fn build_metadata_ignored() {
            assert_eq!(compare("1.0.0+a", "1.0.0+b"), Ordering::Equal);
            assert_eq!(compare("1.0.0-rc+a", "1.0.0-rc"), Ordering::Equal);
        }

        #[test]
        fn ord_matches_compare() {
            let a = VersionInfo::parse("1.0.0-alpha").unwrap();
            let b = VersionInfo::parse("1.0.0").unwrap();
            assert!(a < b);
            assert_eq!(
                VersionInfo::parse("3.1.4+x").unwrap(),
                VersionInfo::parse("3.1.4+y").unwrap()
            );
        }
    }

    mod compatibility {
        use super::*;

        fn rules(component: &str, rule: CompatibilityRule) -> HashMap<String, CompatibilityRule> {
            HashMap::from([(component.to_string(), rule)])
        }

        #[test]
        fn no_rule_is_compatible() {
            let result = check_compatibility("unknown", "0.0.1", &HashMap::new()).unwrap();
            assert!(result.is_compatible());
        }

        #[test]
        fn no_rule_never_inspects_the_version() {
            // The version string is only parsed once a rule exists.
            let result = check_compatibility("unknown", "not-a-version", &HashMap::new()).unwrap();
            assert!(result.is_compatible());
        }

        #[test]
        fn min_version_rejects_older() {
            let table = rules(
                "util",
                CompatibilityRule {
                    min_version: Some("1.2.0".to_string()),
                    ..Default::default()
                },
            );
            assert!(!check_compatibility("util", "1.1.9", &table)
                .unwrap()
                .is_compatible());
            assert!(check_compatibility("util", "1.2.0", &table)
                .unwrap()
                .is_compatible());
        }

        #[test]
        fn max_version_rejects_newer() {
            let table = rules(
                "util",
                CompatibilityRule {
                    max_version: Some("2.0.0".to_string()),
                    ..Default::default()
                },
            );
            assert!(!check_compatibility("util", "2.0.1", &table)
                .unwrap()
                .is_compatible());
            assert!(check_compatibility("util", "2.0.0", &table)
                .unwrap()
                .is_compatible());
        }

        #[test]
        fn allow_list_is_exclusive() {
            let table = rules(
                "util",
                CompatibilityRule {
                    compatible: vec!["1.0.0".to_string(), "1.1.0".to_string()],
                    ..Default::default()
                },
            );
            assert!(check_compatibility("util", "1.1.0", &table)
                .unwrap()
                .is_compatible());
            assert!(!check_compatibility("util", "1.2.0", &table)
                .unwrap()
                .is_compatible());
        }

        #[test]
        fn deny_list_wins_last() {
            let table = rules(
                "util",
                CompatibilityRule {
                    min_version: Some("1.0.0".to_string()),
                    incompatible: vec!["1.3.1".to_string()],
                    ..Default::default()
                },
            );
            assert!(!check_compatibility("util", "1.3.1", &table)
                .unwrap()
                .is_compatible());
            assert!(check_compatibility("util", "1.3.2", &table)
                .unwrap()
                .is_compatible());
        }

        #[test]
        fn min_violation_reported_before_deny() {
            let table = rules(
                "util",
                CompatibilityRule {
                    min_version: Some("2.0.0".to_string()),
                    incompatible: vec!["1.0.0".to_string()],
                    ..Default::default()
                },
            );
            let result = check_compatibility("util", "1.0.0", &table).unwrap();
            match result {
                Compatibility::Incompatible { reason } => {
                    assert!(reason.contains("below minimum"), "reason: {reason}")
                }
                Compatibility::Compatible => panic!("expected incompatible"),
            }
        }

        #[test]
        fn invalid_version_under_rule_is_an_error() {
            let table = rules("util", CompatibilityRule::default());
            assert!(check_compatibility("util", "not-a-version", &table).is_err());
        }

        #[test]
        fn invalid_rule_bound_is_an_error() {
            let table = rules(
                "util",
                CompatibilityRule {
                    min_version: Some("garbage".to_string()),
                    ..Default::default()
                },
            );
            assert_eq!(
                check_compatibility("util", "1.0.0", &table),
                Err(VersionError::InvalidRule {
                    component: "util".to_string(),
                    field: "min_version",
                    value: "garbage".to_string(),
                })
            );
        }
    }

    mod breaking_changes {
        use super::*;

        const CHANGELOG: &str = "\
# Changelog

## [2.0.0] - 2025-06-01

### Breaking Changes

- removed the legacy export API
- renamed `load` to `open`

### Added

- new streaming reader

## [1.5.0] - 2025-03-10

BREAKING CHANGE:

- configuration file moved to TOML

## [1.0.0] - 2024-12-01

- initial release
";

        #[test]
        fn collects_changes_in_range() {
            let result = check_breaking_changes("1.0.0", "2.0.0", CHANGELOG).unwrap();
            assert!(result.has_breaking_changes);
            assert_eq!(
                result.changes,
                vec![
                    BreakingChange {
                        version: "2.0.0".to_string(),
                        description: "removed the legacy export API".to_string(),
                    },
                    BreakingChange {
                        version: "2.0.0".to_string(),
                        description: "renamed `load` to `open`".to_string(),
                    },
                    BreakingChange {
                        version: "1.5.0".to_string(),
                        description: "configuration file moved to TOML".to_string(),
                    },
                ]
            );
        }

        #[test]
        fn range_is_exclusive_below_inclusive_above() {
            // from = 1.5.0 excludes the 1.5.0 section; to = 2.0.0 includes it.
            let result = check_breaking_changes("1.5.0", "2.0.0", CHANGELOG).unwrap();
            assert_eq!(result.changes.len(), 2);
            assert!(result.changes.iter().all(|c| c.version == "2.0.0"));
        }

        #[test]
        fn no_sections_in_range() {
            let result = check_breaking_changes("2.0.0", "3.0.0", CHANGELOG).unwrap();
            assert!(!result.has_breaking_changes);
            assert!(result.changes.is_empty());
        }

        #[test]
        fn marker_match_is_case_insensitive() {
            let log = "## 1.1.0\nBreAkInG cHaNgE\n- shouted\n";
            let result = check_breaking_changes("1.0.0", "1.1.0", log).unwrap();
            assert_eq!(result.changes.len(), 1);
        }

        #[test]
        fn bullets_stop_at_next_heading() {
            let log = "\
## 1.1.0
### Breaking Changes
- real change
### Added
- not a breaking change
";
            let result = check_breaking_changes("1.0.0", "1.1.0", log).unwrap();
            assert_eq!(result.changes.len(), 1);
            assert_eq!(result.changes[0].description, "real change");
        }

        #[test]
        fn headings_without_versions_are_skipped() {
            let log = "## Unreleased\n### Breaking Changes\n- pending change\n";
            let result = check_breaking_changes("1.0.0", "2.0.0", log).unwrap();
            assert!(!result.has_breaking_changes);
        }

        #[test]
        fn malformed_bounds_are_errors_not_panics() {
            assert!(check_breaking_changes("nope", "2.0.0", CHANGELOG).is_err());
            assert!(check_breaking_changes("1.0.0", "nope", CHANGELOG).is_err());
        }
    }
}
