//! Context-scoped result cache.
//!
//! [`ResultCache`] stores the last delivered `(task id, payload)` pair per
//! canonical query key. It is an explicit value owned by (or injected into)
//! the consuming session rather than process-global state, and it is bounded:
//! oldest-inserted entries are evicted beyond the configured capacity, and an
//! optional time-to-live drops entries on access.
//!
//! An entry is only served when its stored task identifier equals the
//! identifier currently requested; a mismatch means the backend has handed
//! out a new computation for the same logical request and the entry is stale.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::types::{QueryKey, ResultPayload, TaskId};

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct CacheEntry {
    task_id: TaskId,
    payload: ResultPayload,
    inserted_at: Instant,
}

/// Bounded store of the last result payload per query key.
///
/// Thread-safe; share it across a session tree with `Arc`.
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<IndexMap<String, CacheEntry>>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl ResultCache {
    /// Creates an empty cache with the default capacity of 64 entries and
    /// no time-to-live.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            capacity: DEFAULT_CAPACITY,
            ttl: None,
        }
    }

    /// Sets the maximum number of entries. Inserting beyond the bound
    /// evicts the oldest-inserted entry. A capacity of zero disables
    /// caching entirely.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets a time-to-live; entries older than this are dropped on lookup.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns the cached payload for `key` if one exists, has not
    /// expired, and was stored under the same task identifier.
    ///
    /// A stored identifier that differs from `task_id` is stale and is
    /// ignored (the entry is left in place; the next delivery overwrites
    /// it).
    pub fn lookup(&self, key: &QueryKey, task_id: &TaskId) -> Option<ResultPayload> {
        let canonical = key.canonical();
        let mut entries = self.entries.lock();
        let entry = entries.get(&canonical)?;

        if let Some(ttl) = self.ttl {
            if entry.inserted_at.elapsed() >= ttl {
                tracing::debug!(key = %canonical, "cache entry expired");
                entries.shift_remove(&canonical);
                return None;
            }
        }

        if entry.task_id != *task_id {
            tracing::debug!(
                key = %canonical,
                stored = %entry.task_id,
                requested = %task_id,
                "cache entry stale"
            );
            return None;
        }

        Some(entry.payload.clone())
    }

    /// Stores `(task_id, payload)` for `key`, overwriting any previous
    /// entry and evicting the oldest-inserted entry beyond capacity.
    pub fn insert(&self, key: &QueryKey, task_id: TaskId, payload: ResultPayload) {
        if self.capacity == 0 {
            return;
        }
        let canonical = key.canonical();
        let mut entries = self.entries.lock();
        // Re-inserting must refresh the entry's position in eviction order.
        entries.shift_remove(&canonical);
        entries.insert(
            canonical,
            CacheEntry {
                task_id,
                payload,
                inserted_at: Instant::now(),
            },
        );
        while entries.len() > self.capacity {
            entries.shift_remove_index(0);
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}
