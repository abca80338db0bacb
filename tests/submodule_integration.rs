//! Integration tests for submodule plumbing against real git repositories.
//!
//! Each test builds throwaway repositories on disk with the system `git`,
//! so these cover the actual porcelain output, not canned fixtures.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use refhub::resolver::{ResolveOptions, Resolver, ResolverConfig};
use refhub::vcs::{self, SubmoduleState, Submodules};

// =============================================================================
// Test Helpers
// =============================================================================

/// A real git repository in a temporary directory.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn init() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let repo = Self { dir };
        repo.git(&["init", "-b", "main"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "user.name", "Test"]);
        repo
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn url(&self) -> String {
        self.path().display().to_string()
    }

    fn commit_file(&self, rel: &str, content: &str, message: &str) {
        let path = self.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("create dirs");
        fs::write(path, content).expect("write file");
        self.git(&["add", "."]);
        self.git(&["commit", "-m", message]);
    }

    fn git(&self, args: &[&str]) {
        let output = Command::new("git")
            .current_dir(self.path())
            .args(args)
            .output()
            .expect("run git");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

const CHECKOUT_PATH: &str = "src/external/assetutilities";

/// An upstream repository plus a hub with it added as a submodule.
fn hub_with_submodule() -> (TestRepo, TestRepo, Submodules) {
    let upstream = TestRepo::init();
    upstream.commit_file("src/workflow.md", "hello", "add workflow");

    let hub = TestRepo::init();
    hub.commit_file("README.md", "hub", "initial");

    // Local-path clones need the file protocol allowed explicitly.
    let submodules = Submodules::new(hub.path()).with_config("protocol.file.allow", "always");
    submodules
        .add(&upstream.url(), CHECKOUT_PATH, Some("main"))
        .expect("add submodule");

    (upstream, hub, submodules)
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn add_registers_and_checks_out_the_repository() {
    let (_upstream, hub, submodules) = hub_with_submodule();

    assert!(submodules.exists(CHECKOUT_PATH));
    let workflow = hub.path().join(CHECKOUT_PATH).join("src/workflow.md");
    assert_eq!(fs::read_to_string(workflow).unwrap(), "hello");
}

#[test]
fn status_reports_the_checkout() {
    let (_upstream, _hub, submodules) = hub_with_submodule();

    let infos = submodules.status().expect("status");
    assert_eq!(infos.len(), 1);
    let info = &infos[0];
    assert_eq!(info.name, CHECKOUT_PATH);
    assert_ne!(info.state, SubmoduleState::NotInitialized);
    assert_eq!(info.commit.len(), 40);
}

#[test]
fn update_pulls_new_upstream_commits() {
    let (upstream, hub, submodules) = hub_with_submodule();

    upstream.commit_file("src/extra.md", "more", "add extra");
    submodules.update(CHECKOUT_PATH).expect("update");

    let extra = hub.path().join(CHECKOUT_PATH).join("src/extra.md");
    assert_eq!(fs::read_to_string(extra).unwrap(), "more");
}

#[test]
fn remove_deregisters_the_checkout() {
    let (_upstream, hub, submodules) = hub_with_submodule();
    assert!(submodules.exists(CHECKOUT_PATH));

    submodules.remove(CHECKOUT_PATH).expect("remove");

    assert!(!submodules.exists(CHECKOUT_PATH));
    assert!(!hub.path().join(CHECKOUT_PATH).join("src/workflow.md").exists());
}

#[test]
fn exists_is_false_in_an_empty_repository() {
    let hub = TestRepo::init();
    let submodules = Submodules::new(hub.path());
    assert!(!submodules.exists(CHECKOUT_PATH));
}

// =============================================================================
// Resolution through a real checkout
// =============================================================================

#[test]
fn references_resolve_through_the_real_checkout() {
    let (_upstream, hub, _submodules) = hub_with_submodule();

    let mut resolver = Resolver::new(ResolverConfig::new(hub.path()));
    let resolved = resolver
        .resolve(
            "@github:assetutilities/src/workflow.md",
            &ResolveOptions::default(),
        )
        .expect("resolve through checkout");
    assert_eq!(resolved.content, "hello");
}

// =============================================================================
// Hub discovery
// =============================================================================

#[test]
fn hub_root_is_discovered_from_a_subdirectory() {
    let hub = TestRepo::init();
    hub.commit_file("docs/guide.md", "x", "add docs");

    let root = vcs::discover_hub_root(&hub.path().join("docs")).expect("discover");
    // Temp paths may differ by symlink resolution; compare canonicalized.
    assert_eq!(
        root.canonicalize().unwrap(),
        hub.path().canonicalize().unwrap()
    );
}

#[test]
fn discovery_outside_any_repository_fails() {
    let dir = TempDir::new().unwrap();
    assert!(vcs::discover_hub_root(dir.path()).is_err());
}
