//! Bounded LRU cache mapping source links to resolved thumbnail URLs.
//!
//! Explicit structure: a hash map for lookup plus a recency queue for
//! eviction order. Both reads and writes refresh recency; inserting past
//! capacity evicts the least-recently-used entry. Entries persist for the
//! process lifetime (or until evicted) and outlive any single page.
//!
//! Failed resolutions are never inserted, so a later resolve may retry a
//! transiently failing link.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tracing::debug;

use crate::config::CacheConfig;

/// Thread-safe bounded LRU store of `source_link -> image_url`.
///
/// The mutex guards both the map and the recency order so concurrent
/// resolutions cannot corrupt eviction bookkeeping. Critical sections are
/// short (no awaiting while held).
#[derive(Debug)]
pub struct ImageCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, String>,
    /// Keys ordered least-recently-used first.
    recency: VecDeque<String>,
}

impl ImageCache {
    /// Creates a cache with the configured capacity (minimum 1).
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity: config.capacity.max(1),
        }
    }

    /// Returns the cached image URL for `source_link`, refreshing its
    /// recency, or `None` if absent.
    #[must_use]
    pub fn get(&self, source_link: &str) -> Option<String> {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let value = inner.entries.get(source_link).cloned()?;
        touch(&mut inner.recency, source_link);
        Some(value)
    }

    /// Inserts or refreshes `source_link -> image_url`, evicting the
    /// least-recently-used entry when inserting past capacity.
    pub fn put(&self, source_link: &str, image_url: &str) {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if inner
            .entries
            .insert(source_link.to_string(), image_url.to_string())
            .is_some()
        {
            touch(&mut inner.recency, source_link);
            return;
        }
        inner.recency.push_back(source_link.to_string());
        if inner.entries.len() > self.capacity
            && let Some(evicted) = inner.recency.pop_front()
        {
            inner.entries.remove(&evicted);
            debug!(link = %evicted, "evicted least-recently-used cache entry");
        }
    }

    /// Returns the number of entries currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.entries.len(),
            Err(poisoned) => poisoned.into_inner().entries.len(),
        }
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Moves `key` to the most-recently-used end of the queue.
fn touch(recency: &mut VecDeque<String>, key: &str) {
    if let Some(position) = recency.iter().position(|entry| entry == key) {
        // Capacity is small (default 100), so the linear scan stays cheap.
        if let Some(entry) = recency.remove(position) {
            recency.push_back(entry);
        }
    }
}
