//! fallback
//!
//! Offline fallback store and degraded-mode content.
//!
//! # Overview
//!
//! The fallback layer is the last resort when live resolution is impossible:
//! a version-independent store of previously resolved content, written
//! through on every successful online resolution and consulted only when
//! resolution fails or the system is offline. When even the store misses, a
//! minimal default document can be synthesized from the reference path's
//! file extension.
//!
//! # Layout
//!
//! One JSON file per entry at `<dir>/<key>.json`, where
//! `key = hex(sha256(reference))`. Unlike the component cache, the key
//! carries no version: fallback serves whatever was last known good.
//!
//! # States
//!
//! [`FallbackManager::network_state`] reports [`NetworkState::Online`] or
//! [`NetworkState::Offline`] from a [`Reachability`] probe; with the network
//! check disabled the manager always reports online. Reconciliation
//! ([`FallbackManager::sync_with`]) is only meaningful while online.

pub mod probe;

pub use probe::{HttpProbe, Reachability, StaticProbe};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from fallback operations.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("failed to create fallback directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write fallback entry '{path}': {source}")]
    WriteEntry {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to scan fallback directory '{path}': {source}")]
    ScanDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no fallback content available for '{reference}'")]
    NoFallback { reference: String },
}

/// Derive the store key for a reference.
pub fn fallback_key(reference: &str) -> String {
    hex::encode(Sha256::digest(reference.as_bytes()))
}

/// One persisted fallback entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FallbackEntry {
    /// The reference this entry backs.
    pub reference: String,
    /// The last known good content.
    pub content: String,
    /// Caller-supplied metadata, stored verbatim.
    pub metadata: serde_json::Value,
    /// When the entry was last written.
    pub timestamp: DateTime<Utc>,
}

/// The on-disk fallback store.
#[derive(Debug, Clone)]
pub struct FallbackStore {
    dir: PathBuf,
}

impl FallbackStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write (or overwrite) the entry for `reference`.
    ///
    /// Idempotent: the prior entry for the same reference is always
    /// replaced whole.
    pub fn write_through(
        &self,
        reference: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<String, FallbackError> {
        fs::create_dir_all(&self.dir).map_err(|source| FallbackError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let key = fallback_key(reference);
        let path = self.entry_path(&key);
        let entry = FallbackEntry {
            reference: reference.to_string(),
            content: content.to_string(),
            metadata,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&entry)
            .unwrap_or_else(|_| "{}".to_string());
        fs::write(&path, json).map_err(|source| FallbackError::WriteEntry {
            path: path.clone(),
            source,
        })?;

        debug!(%key, %reference, "wrote fallback entry");
        Ok(key)
    }

    /// Read the entry for `reference`, if any.
    ///
    /// Unreadable or corrupt entries are logged and reported as absent.
    pub fn read(&self, reference: &str) -> Option<FallbackEntry> {
        let key = fallback_key(reference);
        let path = self.entry_path(&key);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(%key, %err, "unreadable fallback entry, treating as absent");
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(%key, %err, "corrupt fallback entry, treating as absent");
                None
            }
        }
    }

    /// All stored entries, for reconciliation and reporting.
    ///
    /// Corrupt entries are skipped with a warning.
    pub fn entries(&self) -> Result<Vec<FallbackEntry>, FallbackError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(FallbackError::ScanDir {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut entries = Vec::new();
        for item in read_dir {
            let item = item.map_err(|source| FallbackError::ScanDir {
                path: self.dir.clone(),
                source,
            })?;
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()))
            {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(path = %path.display(), %err, "skipping corrupt fallback entry"),
            }
        }
        Ok(entries)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

/// Whether the upstream is currently reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Online,
    Offline,
}

/// Where fallback content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSource {
    /// A stored [`FallbackEntry`].
    Store,
    /// A synthesized default document.
    Template,
}

/// Degraded-mode content plus its provenance.
#[derive(Debug, Clone)]
pub struct FallbackContent {
    pub content: String,
    pub source: FallbackSource,
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Entries examined.
    pub checked: usize,
    /// Entries rewritten because live content differed.
    pub updated: usize,
    /// Per-entry failures; never abort the pass.
    pub errors: Vec<String>,
}

/// Fallback store plus reachability, wired per the hub configuration.
pub struct FallbackManager {
    store: FallbackStore,
    probe: Box<dyn Reachability>,
    enable_network_check: bool,
}

impl FallbackManager {
    pub fn new(
        store: FallbackStore,
        probe: Box<dyn Reachability>,
        enable_network_check: bool,
    ) -> Self {
        Self {
            store,
            probe,
            enable_network_check,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &FallbackStore {
        &self.store
    }

    /// Current network state.
    ///
    /// With the network check disabled this always reports online; otherwise
    /// a failed probe means offline.
    pub fn network_state(&self) -> NetworkState {
        if !self.enable_network_check || self.probe.is_reachable() {
            NetworkState::Online
        } else {
            NetworkState::Offline
        }
    }

    /// Write (or overwrite) the entry for `reference`.
    pub fn write_through(
        &self,
        reference: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<String, FallbackError> {
        self.store.write_through(reference, content, metadata)
    }

    /// Degraded-mode content for `reference`.
    ///
    /// The store is consulted first. On a miss, and only when
    /// `use_default_template` is set, a stub document shaped by the
    /// reference path's extension is synthesized.
    ///
    /// # Errors
    ///
    /// [`FallbackError::NoFallback`] when neither source can serve.
    pub fn fallback_content(
        &self,
        reference: &str,
        use_default_template: bool,
    ) -> Result<FallbackContent, FallbackError> {
        if let Some(entry) = self.store.read(reference) {
            return Ok(FallbackContent {
                content: entry.content,
                source: FallbackSource::Store,
            });
        }

        if use_default_template {
            return Ok(FallbackContent {
                content: default_template(reference),
                source: FallbackSource::Template,
            });
        }

        Err(FallbackError::NoFallback {
            reference: reference.to_string(),
        })
    }

    /// Reconcile every stored entry against live content.
    ///
    /// `resolve` is the live resolution hook (the CLI wires the resolver in
    /// here); it receives the stored entry, so metadata recorded at
    /// write-through time can steer the re-resolution, and returns the
    /// current content or a message on failure. Entries whose live content
    /// differs are rewritten; per-entry failures collect into the report and
    /// never abort the pass.
    pub fn sync_with<F>(&self, mut resolve: F) -> Result<SyncReport, FallbackError>
    where
        F: FnMut(&FallbackEntry) -> Result<String, String>,
    {
        let mut report = SyncReport::default();

        for entry in self.store.entries()? {
            report.checked += 1;
            match resolve(&entry) {
                Ok(live) if live != entry.content => {
                    match self
                        .store
                        .write_through(&entry.reference, &live, entry.metadata.clone())
                    {
                        Ok(_) => report.updated += 1,
                        Err(err) => report
                            .errors
                            .push(format!("{}: {err}", entry.reference)),
                    }
                }
                Ok(_) => {}
                Err(err) => report.errors.push(format!("{}: {err}", entry.reference)),
            }
        }

        Ok(report)
    }
}

/// Synthesize a minimal default document for a reference.
///
/// The document shape follows the reference path's extension: markdown stub
/// for `.md`, mapping stub for `.yml`/`.yaml`, object stub for `.json`,
/// plain text otherwise. Extension semantics mirror [`std::path::Path`]:
/// a dot-less file name, or a name that is only an extension, has none.
pub fn default_template(reference: &str) -> String {
    let path = reference.rsplit('/').next().unwrap_or(reference);
    let extension = match path.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => extension,
        _ => "",
    };

    match extension {
        "md" => format!(
            "# {path}\n\n> Offline fallback document.\n\nThe live content for `{reference}` \
             is currently unavailable.\n"
        ),
        "yml" | "yaml" => format!(
            "# Offline fallback for {reference}\nreference: \"{reference}\"\nstatus: offline-fallback\n"
        ),
        "json" => serde_json::to_string_pretty(&serde_json::json!({
            "reference": reference,
            "status": "offline-fallback",
        }))
        .unwrap_or_else(|_| "{}".to_string()),
        _ => format!("Offline fallback content for {reference}\n"),
    }
}
