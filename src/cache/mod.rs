//! Kernel cache for training pairs
//!
//! SMO evaluates K(x_i, x_j) for the same training pairs over and over: the
//! pair kernels of every step and one row per committed update when the error
//! cache is refreshed. Kernel values are symmetric, so a pair is stored once
//! under the key (min, max).

use lru::LruCache;
use std::num::NonZeroUsize;

/// Approximate cost of one entry: two indices, the value and LRU bookkeeping
const ENTRY_BYTES: usize = 48;

/// Unordered pair of training indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PairKey {
    lo: usize,
    hi: usize,
}

impl PairKey {
    fn new(i: usize, j: usize) -> Self {
        Self {
            lo: i.min(j),
            hi: i.max(j),
        }
    }
}

/// LRU cache of kernel values addressed by training index pairs
///
/// A cache with zero capacity is disabled: every lookup is a miss and nothing
/// is stored.
pub struct KernelCache {
    entries: Option<LruCache<PairKey, f64>>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache holding at most `capacity` kernel values
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache whose capacity fits in roughly `memory_bytes`
    pub fn with_memory_limit(memory_bytes: usize) -> Self {
        Self::new(memory_bytes / ENTRY_BYTES)
    }

    /// Look up K(i, j), computing and storing it on a miss
    pub fn get_or_compute<F>(&mut self, i: usize, j: usize, compute: F) -> f64
    where
        F: FnOnce() -> f64,
    {
        let key = PairKey::new(i, j);
        let Some(entries) = self.entries.as_mut() else {
            self.misses += 1;
            return compute();
        };
        if let Some(&value) = entries.get(&key) {
            self.hits += 1;
            return value;
        }
        self.misses += 1;
        let value = compute();
        entries.put(key, value);
        value
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.entries.as_ref().map_or(0, |e| e.cap().get()),
            size: self.entries.as_ref().map_or(0, |e| e.len()),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
