//! core::reference
//!
//! The cross-repository reference grammar and its security policy.
//!
//! # Grammar
//!
//! ```text
//! @<type>:<repository>[@<branch>]/<path>
//! ```
//!
//! `type` and `repository` exclude `:`, `@` and `/`; `branch` is optional
//! and excludes `/`; `path` is the remainder. When the branch is omitted it
//! defaults to the policy's default branch.
//!
//! # Validation
//!
//! References are validated at construction time. A [`Reference`] value
//! always satisfies the security policy it was parsed under: the repository
//! is allow-listed (when checks are enabled) and the path contains no
//! parent-directory segments, home-directory shorthand, or shell
//! metacharacters. Invalid input is reported as a typed [`GrammarError`],
//! never a panic.
//!
//! # Examples
//!
//! ```
//! use refhub::core::reference::{Reference, SecurityPolicy};
//!
//! let policy = SecurityPolicy::default();
//!
//! let r = Reference::parse("@github:assetutilities/src/workflow.md", &policy).unwrap();
//! assert_eq!(r.repository(), "assetutilities");
//! assert_eq!(r.branch(), "main");
//! assert_eq!(r.path(), "src/workflow.md");
//!
//! // Path traversal is rejected at parse time.
//! assert!(Reference::parse("@github:assetutilities/../secrets", &policy).is_err());
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Repositories trusted by default.
pub const DEFAULT_ALLOWED_REPOSITORIES: [&str; 3] =
    ["assetutilities", "agent-os-core", "shared-templates"];

/// Branch assumed when a reference names none.
pub const DEFAULT_BRANCH: &str = "main";

/// Characters that may never appear in a reference path.
const FORBIDDEN_PATH_CHARS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

/// Unanchored pattern locating reference candidates inside arbitrary text.
///
/// The pattern is deliberately permissive; every candidate it produces is
/// re-validated through [`Reference::parse`], which is the authority.
pub(crate) static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@[A-Za-z][A-Za-z0-9_-]*:[^\s:@/'"`]+(?:@[^\s/'"`]+)?/[^\s'"`<>|)\]]+"#)
        .expect("reference pattern is valid")
});

/// Errors from reference parsing and policy validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("reference must start with '@'")]
    MissingLeadingAt,

    #[error("reference is missing ':' between type and repository")]
    MissingTypeSeparator,

    #[error("reference type cannot be empty")]
    EmptyType,

    #[error("reference type cannot contain '{0}'")]
    InvalidTypeCharacter(char),

    #[error("repository cannot be empty")]
    EmptyRepository,

    #[error("repository cannot contain '{0}'")]
    InvalidRepositoryCharacter(char),

    #[error("branch cannot be empty")]
    EmptyBranch,

    #[error("reference is missing '/' before the path")]
    MissingPath,

    #[error("path cannot be empty")]
    EmptyPath,

    #[error("path cannot be absolute")]
    AbsolutePath,

    #[error("path contains a parent-directory segment")]
    PathTraversal,

    #[error("path contains home-directory shorthand")]
    HomeShorthand,

    #[error("path contains forbidden character '{0}'")]
    ForbiddenPathCharacter(char),

    #[error("repository '{0}' is not in the allow-list")]
    RepositoryNotAllowed(String),
}

/// Security policy applied while parsing references.
///
/// The allow-list is only consulted while `enabled` is true; the path-safety
/// rules always hold. Defaults mirror the standard hub setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    /// Whether the repository allow-list is enforced.
    pub enabled: bool,
    /// Repositories references may point into.
    pub allowed_repositories: Vec<String>,
    /// Branch assumed when a reference names none.
    pub default_branch: String,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_repositories: DEFAULT_ALLOWED_REPOSITORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl SecurityPolicy {
    /// A policy with the allow-list check disabled.
    ///
    /// Path-safety rules still apply; only the repository membership check
    /// is skipped.
    pub fn permissive() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    fn allows(&self, repository: &str) -> bool {
        !self.enabled || self.allowed_repositories.iter().any(|r| r == repository)
    }
}

/// A validated cross-repository reference.
///
/// Immutable value type; constructed only through [`Reference::parse`].
///
/// # Example
///
/// ```
/// use refhub::core::reference::{Reference, SecurityPolicy};
///
/// let policy = SecurityPolicy::default();
/// let r = Reference::parse("@github:shared-templates@develop/spec.md", &policy).unwrap();
///
/// assert_eq!(r.ref_type(), "github");
/// assert_eq!(r.branch(), "develop");
/// assert_eq!(r.to_string(), "@github:shared-templates@develop/spec.md");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    ref_type: String,
    repository: String,
    branch: String,
    path: String,
}

impl Reference {
    /// Parse and validate a reference against the given policy.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] describing the first rule the input
    /// violates. Never panics on malformed input.
    pub fn parse(text: &str, policy: &SecurityPolicy) -> Result<Self, GrammarError> {
        let text = text.trim();
        let rest = text
            .strip_prefix('@')
            .ok_or(GrammarError::MissingLeadingAt)?;

        let (ref_type, rest) = rest
            .split_once(':')
            .ok_or(GrammarError::MissingTypeSeparator)?;
        if ref_type.is_empty() {
            return Err(GrammarError::EmptyType);
        }
        if let Some(c) = ref_type.chars().find(|c| matches!(c, '@' | '/')) {
            return Err(GrammarError::InvalidTypeCharacter(c));
        }

        // Everything before the first '/' is `repository[@branch]`.
        let (head, path) = rest.split_once('/').ok_or(GrammarError::MissingPath)?;
        let (repository, branch) = match head.split_once('@') {
            Some((repository, branch)) => (repository, Some(branch)),
            None => (head, None),
        };

        if repository.is_empty() {
            return Err(GrammarError::EmptyRepository);
        }
        if let Some(c) = repository.chars().find(|c| *c == ':') {
            return Err(GrammarError::InvalidRepositoryCharacter(c));
        }
        if matches!(branch, Some("")) {
            return Err(GrammarError::EmptyBranch);
        }

        Self::validate_path(path)?;

        if !policy.allows(repository) {
            return Err(GrammarError::RepositoryNotAllowed(repository.to_string()));
        }

        Ok(Self {
            ref_type: ref_type.to_string(),
            repository: repository.to_string(),
            branch: branch.unwrap_or(&policy.default_branch).to_string(),
            path: path.to_string(),
        })
    }

    /// Check whether `text` parses under the policy.
    ///
    /// Pure convenience over [`Reference::parse`]; the two always agree.
    pub fn is_valid(text: &str, policy: &SecurityPolicy) -> bool {
        Self::parse(text, policy).is_ok()
    }

    /// Path-safety rules that hold regardless of the allow-list.
    fn validate_path(path: &str) -> Result<(), GrammarError> {
        if path.is_empty() {
            return Err(GrammarError::EmptyPath);
        }
        if path.starts_with('/') {
            return Err(GrammarError::AbsolutePath);
        }
        if path.contains("..") {
            return Err(GrammarError::PathTraversal);
        }
        if path.contains('~') {
            return Err(GrammarError::HomeShorthand);
        }
        if let Some(c) = path.chars().find(|c| FORBIDDEN_PATH_CHARS.contains(c)) {
            return Err(GrammarError::ForbiddenPathCharacter(c));
        }
        Ok(())
    }

    /// The reference type (`github` in `@github:...`).
    pub fn ref_type(&self) -> &str {
        &self.ref_type
    }

    /// The target repository name.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The target branch (defaulted when the reference named none).
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// The path inside the target repository.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "@{}:{}@{}/{}",
            self.ref_type, self.repository, self.branch, self.path
        )
    }
}
