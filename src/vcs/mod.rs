//! vcs
//!
//! Thin shell around the external `git` tool for submodule plumbing, plus
//! hub-root discovery through libgit2.
//!
//! Every call here is opaque and possibly-failing; this layer never parses
//! git internals beyond the `git submodule status` porcelain line format:
//!
//! ```text
//! <state-char><commit> <name>[ (<branch>)]
//! ```
//!
//! where the leading character is a space (up to date), `-` (not
//! initialized), or `+` (checked out at a different commit).

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors from VCS operations.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("malformed submodule status line: '{0}'")]
    MalformedStatus(String),

    #[error("no repository found at or above '{path}': {message}")]
    NotARepository { path: PathBuf, message: String },

    #[error("repository at '{path}' has no working directory")]
    BareRepository { path: PathBuf },
}

/// Checkout state of one submodule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmoduleState {
    UpToDate,
    NotInitialized,
    DifferentCommit,
}

/// One line of `git submodule status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleInfo {
    pub name: String,
    pub commit: String,
    pub branch: Option<String>,
    pub state: SubmoduleState,
}

/// Submodule operations rooted at one repository.
#[derive(Debug, Clone)]
pub struct Submodules {
    repo_root: PathBuf,
    /// Extra `-c key=value` pairs passed to every invocation.
    config: Vec<(String, String)>,
}

impl Submodules {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            config: Vec::new(),
        }
    }

    /// Add a `-c key=value` pair to every invocation (test rigs need
    /// `protocol.file.allow=always`).
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.push((key.into(), value.into()));
        self
    }

    /// Whether a submodule named `name` is registered.
    pub fn exists(&self, name: &str) -> bool {
        self.status()
            .map(|infos| infos.iter().any(|info| info.name == name))
            .unwrap_or(false)
    }

    /// Register and clone a submodule.
    pub fn add(&self, url: &str, path: &str, branch: Option<&str>) -> Result<(), VcsError> {
        let mut args = vec!["submodule", "add"];
        if let Some(branch) = branch {
            args.extend(["-b", branch]);
        }
        args.extend([url, path]);
        self.git(&args).map(|_| ())
    }

    /// Update one submodule to its upstream state.
    pub fn update(&self, name: &str) -> Result<(), VcsError> {
        self.git(&["submodule", "update", "--init", "--remote", "--", name])
            .map(|_| ())
    }

    /// Initialize all registered submodules.
    pub fn init(&self) -> Result<(), VcsError> {
        self.git(&["submodule", "update", "--init", "--recursive"])
            .map(|_| ())
    }

    /// Status of every registered submodule.
    pub fn status(&self) -> Result<Vec<SubmoduleInfo>, VcsError> {
        let output = self.git(&["submodule", "status"])?;
        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_status_line)
            .collect()
    }

    /// Deregister and remove a submodule.
    pub fn remove(&self, name: &str) -> Result<(), VcsError> {
        self.git(&["submodule", "deinit", "-f", "--", name])?;
        self.git(&["rm", "-f", name]).map(|_| ())
    }

    fn git(&self, args: &[&str]) -> Result<String, VcsError> {
        let mut command = Command::new("git");
        command.current_dir(&self.repo_root);
        for (key, value) in &self.config {
            command.arg("-c").arg(format!("{key}={value}"));
        }
        command.args(args);

        debug!(?args, root = %self.repo_root.display(), "running git");
        let output = command.output()?;
        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse one `git submodule status` porcelain line.
fn parse_status_line(line: &str) -> Result<SubmoduleInfo, VcsError> {
    let malformed = || VcsError::MalformedStatus(line.to_string());

    let mut chars = line.chars();
    let state = match chars.next().ok_or_else(malformed)? {
        ' ' => SubmoduleState::UpToDate,
        '-' => SubmoduleState::NotInitialized,
        '+' => SubmoduleState::DifferentCommit,
        _ => return Err(malformed()),
    };

    let rest = chars.as_str();
    let (commit, rest) = rest.split_once(' ').ok_or_else(malformed)?;
    if commit.is_empty() || !commit.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    let (name, branch) = match rest.rsplit_once(" (") {
        Some((name, tail)) => {
            let branch = tail.strip_suffix(')').ok_or_else(malformed)?;
            (name, Some(branch.to_string()))
        }
        None => (rest, None),
    };
    if name.is_empty() {
        return Err(malformed());
    }

    Ok(SubmoduleInfo {
        name: name.to_string(),
        commit: commit.to_string(),
        branch,
        state,
    })
}

/// Locate the root of the repository containing `start`.
///
/// Used by the CLI to default the hub base directory.
pub fn discover_hub_root(start: &Path) -> Result<PathBuf, VcsError> {
    let repo = git2::Repository::discover(start).map_err(|err| VcsError::NotARepository {
        path: start.to_path_buf(),
        message: err.message().to_string(),
    })?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| VcsError::BareRepository {
            path: start.to_path_buf(),
        })?
        .to_path_buf();
    Ok(workdir)
}
