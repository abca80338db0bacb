//! cache
//!
//! Persistent, content-addressed component cache.
//!
//! # Layout
//!
//! One JSON file per entry at `<dir>/<key>.json`, where
//! `key = hex(sha256("<reference>:<version>"))`. Keys are deterministic:
//! identical `(reference, version)` pairs always produce the same key, and
//! the hash keeps near-identical inputs from colliding.
//!
//! # Bounds
//!
//! Entries carry a write timestamp; a lookup older than the TTL reports
//! [`Lookup::Expired`] and callers treat it as a miss. Aggregate store size
//! is bounded in bytes; [`ComponentCache::evict_if_needed`] deletes
//! oldest-modified entries first until the store fits. Modification time is
//! the only eviction signal.
//!
//! # Failure policy
//!
//! The cache is an optimization. Read-side I/O errors are logged and folded
//! into [`Lookup::Miss`]; write-side errors surface as [`CacheError`] and
//! callers treat them as non-fatal.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};

/// Default store budget in megabytes.
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

/// Default entry TTL in seconds (1 hour).
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Version recorded when the caller names none.
pub const DEFAULT_VERSION: &str = "latest";

/// Errors from cache store operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to create cache directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write cache entry '{path}': {source}")]
    WriteEntry {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize cache entry for '{reference}': {message}")]
    Serialize { reference: String, message: String },

    #[error("failed to scan cache directory '{path}': {source}")]
    ScanDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to delete cache entry '{path}': {source}")]
    DeleteEntry {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Derive the store key for a `(reference, version)` pair.
pub fn cache_key(reference: &str, version: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(b":");
    hasher.update(version.as_bytes());
    hex::encode(hasher.finalize())
}

/// One persisted cache entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    /// The reference this entry resolves.
    pub reference: String,
    /// The resolved content.
    pub content: String,
    /// The component version the content belongs to.
    pub version: String,
    /// When the entry was written; drives TTL expiry.
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied metadata, stored verbatim.
    pub metadata: serde_json::Value,
}

impl CacheEntry {
    /// Whether this entry is older than `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.timestamp > ttl
    }
}

/// Receipt for a successful store.
#[derive(Debug, Clone)]
pub struct StoreReceipt {
    pub key: String,
    pub path: PathBuf,
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// A fresh entry.
    Hit(CacheEntry),
    /// An entry exists but is older than the TTL; treat as a miss.
    Expired,
    /// No usable entry.
    Miss,
}

/// Result of an eviction pass.
#[derive(Debug, Clone, Default)]
pub struct EvictionReport {
    /// Entries deleted by this pass.
    pub removed: usize,
    /// Aggregate store size after the pass.
    pub remaining_bytes: u64,
}

/// Store statistics for reporting.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
}

/// The persistent component cache; see the module docs for layout and
/// bounds.
#[derive(Debug, Clone)]
pub struct ComponentCache {
    dir: PathBuf,
    max_size_bytes: u64,
    ttl: Duration,
}

impl ComponentCache {
    /// A cache at `dir` with the default budget and TTL.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_size_bytes: DEFAULT_MAX_SIZE_MB * 1024 * 1024,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }

    /// Override the size budget (megabytes) and TTL.
    pub fn with_limits(mut self, max_size_mb: u64, ttl: Duration) -> Self {
        self.max_size_bytes = max_size_mb * 1024 * 1024;
        self.ttl = ttl;
        self
    }

    /// The store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an entry for `(reference, version)`, then run eviction.
    ///
    /// The version defaults to `"latest"`. A re-store for the same pair
    /// overwrites by key; entries are never updated in place.
    pub fn store(
        &self,
        reference: &str,
        content: &str,
        version: Option<&str>,
        metadata: serde_json::Value,
    ) -> Result<StoreReceipt, CacheError> {
        let version = version.unwrap_or(DEFAULT_VERSION);
        let key = cache_key(reference, version);
        let path = self.entry_path(&key);

        fs::create_dir_all(&self.dir).map_err(|source| CacheError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let entry = CacheEntry {
            reference: reference.to_string(),
            content: content.to_string(),
            version: version.to_string(),
            timestamp: Utc::now(),
            metadata,
        };
        let json =
            serde_json::to_string_pretty(&entry).map_err(|err| CacheError::Serialize {
                reference: reference.to_string(),
                message: err.to_string(),
            })?;
        fs::write(&path, json).map_err(|source| CacheError::WriteEntry {
            path: path.clone(),
            source,
        })?;

        debug!(%key, %reference, %version, "cached component");
        self.evict_if_needed()?;

        Ok(StoreReceipt { key, path })
    }

    /// Look up an entry by key.
    ///
    /// Unreadable or corrupt entry files are logged and reported as
    /// [`Lookup::Miss`]; cache reads never fail the caller.
    pub fn lookup(&self, key: &str) -> Lookup {
        let path = self.entry_path(key);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Lookup::Miss,
            Err(err) => {
                warn!(%key, %err, "unreadable cache entry, treating as miss");
                return Lookup::Miss;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&json) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%key, %err, "corrupt cache entry, treating as miss");
                return Lookup::Miss;
            }
        };

        if entry.is_expired(self.ttl) {
            Lookup::Expired
        } else {
            Lookup::Hit(entry)
        }
    }

    /// Look up by `(reference, version)`; version defaults to `"latest"`.
    pub fn lookup_reference(&self, reference: &str, version: Option<&str>) -> Lookup {
        self.lookup(&cache_key(reference, version.unwrap_or(DEFAULT_VERSION)))
    }

    /// Delete oldest-modified entries until the store fits its byte budget.
    pub fn evict_if_needed(&self) -> Result<EvictionReport, CacheError> {
        let mut entries = self.scan_entries()?;
        let mut total: u64 = entries.iter().map(|e| e.size).sum();
        let mut report = EvictionReport {
            removed: 0,
            remaining_bytes: total,
        };

        if total <= self.max_size_bytes {
            return Ok(report);
        }

        entries.sort_by_key(|e| e.modified);
        for entry in entries {
            if total <= self.max_size_bytes {
                break;
            }
            fs::remove_file(&entry.path).map_err(|source| CacheError::DeleteEntry {
                path: entry.path.clone(),
                source,
            })?;
            debug!(path = %entry.path.display(), "evicted cache entry");
            total -= entry.size;
            report.removed += 1;
        }

        report.remaining_bytes = total;
        Ok(report)
    }

    /// Unconditionally delete every entry; returns how many were removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let entries = self.scan_entries()?;
        let count = entries.len();
        for entry in entries {
            fs::remove_file(&entry.path).map_err(|source| CacheError::DeleteEntry {
                path: entry.path,
                source,
            })?;
        }
        Ok(count)
    }

    /// Entry count and aggregate size.
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let entries = self.scan_entries()?;
        Ok(CacheStats {
            entries: entries.len(),
            total_bytes: entries.iter().map(|e| e.size).sum(),
        })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn scan_entries(&self) -> Result<Vec<StoredFile>, CacheError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CacheError::ScanDir {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut entries = Vec::new();
        for item in read_dir {
            let item = item.map_err(|source| CacheError::ScanDir {
                path: self.dir.clone(),
                source,
            })?;
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let meta = match item.metadata() {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => continue,
                Err(err) => {
                    warn!(path = %path.display(), %err, "unreadable cache entry metadata");
                    continue;
                }
            };
            entries.push(StoredFile {
                path,
                size: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(entries)
    }
}

/// An on-disk entry file as seen by eviction.
#[derive(Debug)]
struct StoredFile {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}
