//! resolver
//!
//! Reference resolution orchestration.
//!
//! # Pipeline
//!
//! [`Resolver::resolve`] runs a fixed sequence: parse and validate the
//! reference, check the in-memory memo, compute the candidate local path,
//! read the file, optionally extract structured content, optionally resolve
//! embedded references, and finally record the outcome in the memo. A memo
//! hit short-circuits everything after validation.
//!
//! # Local paths
//!
//! A reference maps to `<base>/src/external/<repo>/<path>` when resolving
//! through a checked-out submodule, or to
//! `<base>/.cross-repo-cache/<repo>/<branch>/<path>` against a local
//! checkout cache.
//!
//! # Embedded references
//!
//! Content may itself contain references. Embedded resolution is depth-first
//! and left-to-right in the order references appear, threading one explicit
//! visited set seeded with the outer reference. Revisiting a reference is a
//! hard circular-reference failure; growing the set past the depth bound is
//! a hard depth failure. An embedded reference that merely fails to resolve
//! is logged and left verbatim in the text.

pub mod format;
pub mod memo;

pub use format::{extract, ContentFormat, ExtractError};

use crate::core::reference::{GrammarError, Reference, SecurityPolicy, REFERENCE_PATTERN};
use chrono::Duration;
use memo::{Memo, DEFAULT_MEMO_CAPACITY};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Default bound on distinct references in one resolution chain.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default memo TTL in seconds (5 minutes).
pub const DEFAULT_MEMO_TTL_SECS: i64 = 300;

/// Subdirectory holding submodule checkouts.
const SUBMODULE_ROOT: &str = "src/external";

/// Subdirectory holding branch-addressed checkout caches.
const CHECKOUT_CACHE_ROOT: &str = ".cross-repo-cache";

/// Errors from reference resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The reference failed the grammar or security policy.
    #[error("invalid reference: {0}")]
    Grammar(#[from] GrammarError),

    /// The candidate local path could not be read. Distinct from a parse
    /// failure: the file is missing or unreadable, not malformed.
    #[error("content unavailable at '{path}': {source}")]
    ContentUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file was read but its content failed structured extraction.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// An embedded reference chain revisited a reference.
    #[error("circular reference detected: '{0}'")]
    CircularReference(String),

    /// An embedded reference chain grew past the depth bound.
    #[error("nested resolution exceeded maximum depth {max_depth}")]
    DepthExceeded { max_depth: usize },
}

/// Options for one resolution call.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Resolve through `src/external/<repo>` instead of the checkout cache.
    pub use_submodule: bool,
    /// Parse the content under this format after reading.
    pub extract: Option<ContentFormat>,
    /// Resolve references embedded in the content.
    pub resolve_nested: bool,
    /// Bound on distinct references in one resolution chain, root included.
    pub max_depth: usize,
    /// Consult and populate the in-memory memo.
    pub use_cache: bool,
    /// Freshness bound for memo hits.
    pub cache_ttl: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            use_submodule: true,
            extract: None,
            resolve_nested: false,
            max_depth: DEFAULT_MAX_DEPTH,
            use_cache: true,
            cache_ttl: Duration::seconds(DEFAULT_MEMO_TTL_SECS),
        }
    }
}

/// Resolver construction parameters.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Hub root all local paths are computed under.
    pub base_dir: PathBuf,
    /// Policy references are validated against.
    pub policy: SecurityPolicy,
    /// Memo bound in entries.
    pub memo_capacity: usize,
}

impl ResolverConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            policy: SecurityPolicy::default(),
            memo_capacity: DEFAULT_MEMO_CAPACITY,
        }
    }

    pub fn with_policy(mut self, policy: SecurityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.memo_capacity = capacity;
        self
    }
}

/// A successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The validated reference.
    pub reference: Reference,
    /// Where the content was read from.
    pub local_path: PathBuf,
    /// The raw file content.
    pub content: String,
    /// Structured content, when extraction was requested.
    pub parsed: Option<serde_json::Value>,
    /// Content with embedded references substituted, when requested.
    pub resolved: Option<String>,
    /// Whether this result came from the in-memory memo.
    pub from_cache: bool,
}

/// The reference resolver; see the module docs for the pipeline.
///
/// The memo inside is private to this instance; concurrent hosts create one
/// resolver each and need no coordination.
pub struct Resolver {
    config: ResolverConfig,
    memo: Memo<Resolved>,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        let memo = Memo::new(config.memo_capacity);
        Self { config, memo }
    }

    /// The policy this resolver validates against.
    pub fn policy(&self) -> &SecurityPolicy {
        &self.config.policy
    }

    /// Resolve `text` to content.
    ///
    /// # Errors
    ///
    /// See [`ResolveError`]; every expected failure mode is a returned
    /// variant, never a panic.
    pub fn resolve(
        &mut self,
        text: &str,
        options: &ResolveOptions,
    ) -> Result<Resolved, ResolveError> {
        let reference = Reference::parse(text, &self.config.policy)?;
        let memo_key = text.trim().to_string();

        if options.use_cache {
            if let Some(mut hit) = self.memo.get(&memo_key, options.cache_ttl) {
                debug!(reference = %reference, "memo hit");
                hit.from_cache = true;
                return Ok(hit);
            }
        }

        let local_path = self.local_path(&reference, options);
        let content =
            fs::read_to_string(&local_path).map_err(|source| ResolveError::ContentUnavailable {
                path: local_path.clone(),
                source,
            })?;

        let parsed = match options.extract {
            Some(format) => Some(extract(format, &content)?),
            None => None,
        };

        let resolved = if options.resolve_nested {
            let mut visited = HashSet::new();
            visited.insert(reference.to_string());
            Some(self.resolve_embedded(&content, &mut visited, options)?)
        } else {
            None
        };

        let outcome = Resolved {
            reference,
            local_path,
            content,
            parsed,
            resolved,
            from_cache: false,
        };

        if options.use_cache {
            self.memo.put(memo_key, outcome.clone());
        }

        Ok(outcome)
    }

    /// Candidate local path for a reference under the current base.
    pub fn local_path(&self, reference: &Reference, options: &ResolveOptions) -> PathBuf {
        if options.use_submodule {
            self.config
                .base_dir
                .join(SUBMODULE_ROOT)
                .join(reference.repository())
                .join(reference.path())
        } else {
            self.config
                .base_dir
                .join(CHECKOUT_CACHE_ROOT)
                .join(reference.repository())
                .join(reference.branch())
                .join(reference.path())
        }
    }

    /// Substitute embedded references in `content`, depth-first and
    /// left-to-right, sharing one visited set across the whole chain.
    fn resolve_embedded(
        &self,
        content: &str,
        visited: &mut HashSet<String>,
        options: &ResolveOptions,
    ) -> Result<String, ResolveError> {
        let mut output = String::with_capacity(content.len());
        let mut tail = 0;

        for m in REFERENCE_PATTERN.find_iter(content) {
            output.push_str(&content[tail..m.start()]);
            tail = m.end();
            let raw = m.as_str();

            let reference = match Reference::parse(raw, &self.config.policy) {
                Ok(reference) => reference,
                Err(err) => {
                    warn!(%raw, %err, "embedded reference rejected, leaving verbatim");
                    output.push_str(raw);
                    continue;
                }
            };

            // The canonical form collapses the defaulted-branch spelling, so
            // `@t:r/p` and `@t:r@main/p` count as the same visit.
            let canonical = reference.to_string();
            if visited.contains(&canonical) {
                return Err(ResolveError::CircularReference(canonical));
            }
            if visited.len() >= options.max_depth {
                return Err(ResolveError::DepthExceeded {
                    max_depth: options.max_depth,
                });
            }
            visited.insert(canonical);

            let path = self.local_path(&reference, options);
            match fs::read_to_string(&path) {
                Ok(sub_content) => {
                    let substituted = self.resolve_embedded(&sub_content, visited, options)?;
                    output.push_str(&substituted);
                }
                Err(err) => {
                    warn!(reference = %reference, %err, "embedded reference unresolvable, leaving verbatim");
                    output.push_str(raw);
                }
            }
        }

        output.push_str(&content[tail..]);
        Ok(output)
    }
}
