//! Resolution caching
//!
//! Memoizes resolver output per pathname with LRU eviction. The route table
//! never changes after construction, so entries never go stale; snapshots
//! handed to listeners are still allocated fresh from the cached routes.

use crate::{trace_log, ActiveRoute};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache performance statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Resolution cache with LRU eviction
///
/// Default capacity: 1000 pathnames. A capacity of zero disables caching.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: Option<LruCache<String, Vec<ActiveRoute>>>,
    stats: CacheStats,
}

impl ResolutionCache {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            stats: CacheStats::default(),
        }
    }

    /// Cached routes for `pathname`, counting the lookup
    ///
    /// A disabled cache counts nothing.
    pub fn get(&mut self, pathname: &str) -> Option<Vec<ActiveRoute>> {
        let entries = self.entries.as_mut()?;
        if let Some(routes) = entries.get(pathname) {
            self.stats.hits += 1;
            trace_log!("Resolution cache hit for '{}'", pathname);
            Some(routes.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Resolution cache miss for '{}'", pathname);
            None
        }
    }

    pub fn insert(&mut self, pathname: String, routes: Vec<ActiveRoute>) {
        if let Some(entries) = self.entries.as_mut() {
            entries.push(pathname, routes);
        }
    }

    pub fn clear(&mut self) {
        trace_log!("Clearing resolution cache");
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of pathnames kept (0 when disabled)
    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.cap().get())
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}
