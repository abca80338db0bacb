//! Property-based tests for core domain types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::cmp::Ordering;

use proptest::prelude::*;

use refhub::cache::cache_key;
use refhub::core::reference::{Reference, SecurityPolicy, DEFAULT_ALLOWED_REPOSITORIES};
use refhub::core::version::VersionInfo;

/// Strategy for identifier-shaped segments (types, repos, branches).
fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,11}"
}

/// Strategy for a safe reference path.
fn safe_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9_-]{0,7}(\\.[a-z]{1,4})?", 1..4)
        .prop_map(|segments| segments.join("/"))
}

/// Strategy for an allow-listed repository.
fn allowed_repository() -> impl Strategy<Value = String> {
    prop::sample::select(
        DEFAULT_ALLOWED_REPOSITORIES
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>(),
    )
}

/// Strategy for a well-formed, allow-listed reference.
fn valid_reference() -> impl Strategy<Value = String> {
    (
        identifier(),
        allowed_repository(),
        prop::option::of(identifier()),
        safe_path(),
    )
        .prop_map(|(ref_type, repo, branch, path)| match branch {
            Some(branch) => format!("@{ref_type}:{repo}@{branch}/{path}"),
            None => format!("@{ref_type}:{repo}/{path}"),
        })
}

/// Strategy for a version string within the grammar.
fn valid_version() -> impl Strategy<Value = String> {
    (
        0u64..1000,
        0u64..1000,
        0u64..1000,
        prop::option::of("[a-z0-9]{1,6}(\\.[a-z0-9]{1,4})?"),
        prop::option::of("[a-z0-9]{1,6}"),
    )
        .prop_map(|(major, minor, patch, pre, build)| {
            let mut s = format!("{major}.{minor}.{patch}");
            if let Some(pre) = pre {
                s.push('-');
                s.push_str(&pre);
            }
            if let Some(build) = build {
                s.push('+');
                s.push_str(&build);
            }
            s
        })
}

proptest! {
    // ==========================================================================
    // Reference grammar
    // ==========================================================================

    #[test]
    fn parse_and_is_valid_always_agree(text in "\\PC{0,60}") {
        let policy = SecurityPolicy::default();
        prop_assert_eq!(
            Reference::parse(&text, &policy).is_ok(),
            Reference::is_valid(&text, &policy)
        );
    }

    #[test]
    fn well_formed_references_parse(text in valid_reference()) {
        let policy = SecurityPolicy::default();
        let reference = Reference::parse(&text, &policy);
        prop_assert!(reference.is_ok(), "rejected '{}': {:?}", text, reference);
    }

    #[test]
    fn parse_never_panics(text in "\\PC{0,200}") {
        let _ = Reference::parse(&text, &SecurityPolicy::default());
    }

    #[test]
    fn traversal_in_path_always_rejected(
        repo in allowed_repository(),
        prefix in "[a-z]{0,6}",
        suffix in "[a-z]{0,6}",
    ) {
        let text = format!("@github:{repo}/{prefix}../{suffix}");
        prop_assert!(Reference::parse(&text, &SecurityPolicy::default()).is_err());
    }

    #[test]
    fn forbidden_path_characters_always_rejected(
        repo in allowed_repository(),
        path in safe_path(),
        bad in prop::sample::select(vec!['~', '<', '>', ':', '"', '|', '?', '*']),
    ) {
        let text = format!("@github:{repo}/{path}{bad}x");
        prop_assert!(Reference::parse(&text, &SecurityPolicy::default()).is_err());
    }

    #[test]
    fn allow_list_gates_unknown_repositories(
        ref_type in identifier(),
        repo in "[a-z]{3,10}",
        path in safe_path(),
    ) {
        prop_assume!(!DEFAULT_ALLOWED_REPOSITORIES.contains(&repo.as_str()));
        let text = format!("@{ref_type}:{repo}/{path}");

        let enforcing = SecurityPolicy::default();
        prop_assert!(Reference::parse(&text, &enforcing).is_err());

        let permissive = SecurityPolicy::permissive();
        prop_assert!(Reference::parse(&text, &permissive).is_ok());
    }

    #[test]
    fn display_round_trips_through_parse(text in valid_reference()) {
        let policy = SecurityPolicy::default();
        let reference = Reference::parse(&text, &policy).unwrap();
        let rendered = reference.to_string();
        let reparsed = Reference::parse(&rendered, &policy).unwrap();
        prop_assert_eq!(reference, reparsed);
    }

    // ==========================================================================
    // Version ordering
    // ==========================================================================

    #[test]
    fn compare_is_reflexive(v in valid_version()) {
        let parsed = VersionInfo::parse(&v).unwrap();
        prop_assert_eq!(parsed.compare(&parsed), Ordering::Equal);
    }

    #[test]
    fn compare_is_antisymmetric(a in valid_version(), b in valid_version()) {
        let a = VersionInfo::parse(&a).unwrap();
        let b = VersionInfo::parse(&b).unwrap();
        prop_assert_eq!(a.compare(&b), b.compare(&a).reverse());
    }

    #[test]
    fn prerelease_sorts_below_release(
        major in 0u64..1000,
        minor in 0u64..1000,
        patch in 0u64..1000,
        pre in "[a-z0-9]{1,8}",
    ) {
        let with_pre = VersionInfo::parse(&format!("{major}.{minor}.{patch}-{pre}")).unwrap();
        let release = VersionInfo::parse(&format!("{major}.{minor}.{patch}")).unwrap();
        prop_assert_eq!(with_pre.compare(&release), Ordering::Less);
    }

    #[test]
    fn build_metadata_never_affects_ordering(
        v in valid_version(),
        build_a in "[a-z0-9]{1,8}",
        build_b in "[a-z0-9]{1,8}",
    ) {
        prop_assume!(!v.contains('+'));
        let a = VersionInfo::parse(&format!("{v}+{build_a}")).unwrap();
        let b = VersionInfo::parse(&format!("{v}+{build_b}")).unwrap();
        prop_assert_eq!(a.compare(&b), Ordering::Equal);
    }

    #[test]
    fn version_parse_never_panics(text in "\\PC{0,60}") {
        let _ = VersionInfo::parse(&text);
    }

    // ==========================================================================
    // Cache keys
    // ==========================================================================

    #[test]
    fn cache_keys_are_deterministic(reference in valid_reference(), version in valid_version()) {
        prop_assert_eq!(
            cache_key(&reference, &version),
            cache_key(&reference, &version)
        );
    }

    #[test]
    fn distinct_versions_get_distinct_keys(
        reference in valid_reference(),
        a in valid_version(),
        b in valid_version(),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(cache_key(&reference, &a), cache_key(&reference, &b));
    }
}
