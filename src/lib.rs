//! Refhub - cross-repository reference resolution and caching
//!
//! Refhub resolves symbolic references of the form
//! `@<type>:<repository>[@<branch>]/<path>` to concrete file content from
//! locally checked-out shared repositories - safely, repeatably, and with
//! graceful degradation when the target file or the network is unavailable.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture, leaf modules first:
//!
//! - [`core`] - Reference grammar and security policy, reference discovery,
//!   semantic versions and compatibility rules, configuration
//! - [`cache`] - Persistent, size- and TTL-bounded component cache
//! - [`fallback`] - Offline fallback store, reachability probe, and
//!   reconciliation
//! - [`resolver`] - Resolution orchestration: validation, path computation,
//!   structured extraction, cycle-safe embedded resolution, memoization
//! - [`vcs`] - Thin shell around the external VCS tool for submodule
//!   plumbing
//! - [`cli`] - Command-line interface layer (parses args, wires modules)
//!
//! # Correctness Invariants
//!
//! Refhub maintains the following invariants:
//!
//! 1. A constructed [`core::reference::Reference`] always satisfies the
//!    security policy it was parsed under
//! 2. Expected failures (bad input, missing file, offline) are returned
//!    values, never panics
//! 3. Cache and fallback stores are optimizations: their I/O errors are
//!    logged and folded into misses, never escalated to the caller
//! 4. Embedded resolution is cycle- and depth-bounded through one explicit
//!    visited set

pub mod cache;
pub mod cli;
pub mod core;
pub mod fallback;
pub mod resolver;
pub mod vcs;
