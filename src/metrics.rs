//! Cache observability counters.
//!
//! Grounded on the grounding codebase's `metrics` module, which gives every
//! algorithm its own metrics struct implementing a common `CacheMetrics`
//! trait reporting a `BTreeMap<String, f64>` (chosen there, and here, over
//! a `HashMap` for deterministic iteration order in test/debug output).
//! The per-algorithm structs in the grounding codebase differ only in
//! *which* of a common set of counters they populate — LRU/MRU/FIFO/RR
//! track hits/misses/evictions, LFU/LFUDA add nothing metrics-wise beyond
//! that, the TTL variants add expirations. One shared [`CoreCacheMetrics`]
//! covering the union of those counters is the non-duplicative
//! generalization of the same idea, so this crate keeps one struct instead
//! of nine.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

/// Reports a cache's runtime counters as an ordered map, for diagnostics
/// and benchmarking.
pub trait CacheMetrics {
    /// Current counter values, keyed by name.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// The policy name, e.g. `"lru"`.
    fn algorithm_name(&self) -> &'static str;
}

/// Hit/miss/eviction/expiration counters shared by every container variant.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreCacheMetrics {
    /// Number of `find` calls that located a live entry.
    pub hits: u64,
    /// Number of `find` calls that did not (absent or TTL-expired).
    pub misses: u64,
    /// Number of entries removed to make room for a new insert.
    pub evictions: u64,
    /// Number of entries removed because their TTL had elapsed
    /// (`clean_expired`, or an inline expiry check during another
    /// operation). Always zero for variants without a TTL.
    pub expirations: u64,
}

impl CoreCacheMetrics {
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub(crate) fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    /// Fraction of `find` calls that hit, in `[0, 1]`; `0.0` if there have
    /// been no lookups yet.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn as_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("hits".to_string(), self.hits as f64);
        map.insert("misses".to_string(), self.misses as f64);
        map.insert("evictions".to_string(), self.evictions as f64);
        map.insert("expirations".to_string(), self.expirations as f64);
        map.insert("hit_ratio".to_string(), self.hit_ratio());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_with_no_lookups_is_zero() {
        assert_eq!(CoreCacheMetrics::default().hit_ratio(), 0.0);
    }

    #[test]
    fn hit_ratio_tracks_hits_and_misses() {
        let mut metrics = CoreCacheMetrics::default();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        assert!((metrics.hit_ratio() - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn as_map_contains_every_counter() {
        let metrics = CoreCacheMetrics::default();
        let map = metrics.as_map();
        for key in ["hits", "misses", "evictions", "expirations", "hit_ratio"] {
            assert!(map.contains_key(key));
        }
    }
}
