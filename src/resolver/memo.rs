//! resolver::memo
//!
//! In-memory resolution memo.
//!
//! A strict LRU bounded by entry count, private to one resolver instance.
//! Entries carry their write time; a lookup passes the TTL it wants, so the
//! same memo serves calls with different freshness requirements.

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

/// Default memo capacity in entries.
pub const DEFAULT_MEMO_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
struct MemoEntry<T> {
    value: T,
    cached_at: DateTime<Utc>,
}

/// TTL-aware LRU memo.
#[derive(Debug)]
pub struct Memo<T> {
    inner: LruCache<String, MemoEntry<T>>,
}

impl<T: Clone> Memo<T> {
    /// A memo bounded to `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is non-zero");
        Self {
            inner: LruCache::new(capacity),
        }
    }

    /// Fetch a value younger than `ttl`, marking it most recently used.
    ///
    /// An entry older than the TTL is dropped and reported as a miss.
    pub fn get(&mut self, key: &str, ttl: Duration) -> Option<T> {
        let entry = self.inner.get(key)?;
        if Utc::now() - entry.cached_at > ttl {
            debug!(%key, "memo entry expired");
            self.inner.pop(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Record a value, evicting the least recently used entry when full.
    pub fn put(&mut self, key: String, value: T) {
        self.inner.put(
            key,
            MemoEntry {
                value,
                cached_at: Utc::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
