//! Most recently used cache (§4.3).
//!
//! A thin public wrapper over [`crate::recency::RecencyCache`] with the
//! eviction end fixed to the list head: the most-recently-touched entry
//! is the one reclaimed under capacity pressure — the useful case being
//! workloads where a just-used item is unlikely to be reused soon (e.g.
//! a full sequential scan), so it's the best candidate to sacrifice.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
extern crate std;
#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

use crate::allow::Allow;
use crate::config::MruCacheConfig;
use crate::lock::ThreadSafety;
use crate::metrics::CacheMetrics;
use crate::peek::Peek;
use crate::recency::{EvictHead, RecencyCache};

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;

/// A fixed-capacity cache evicting the most-recently-used entry.
///
/// `TS` selects the [`ThreadSafety`] policy; `S` selects the hash builder.
pub struct MruCache<K, V, TS = crate::lock::ThreadSafe, S = DefaultHashBuilder>
where
    TS: ThreadSafety,
{
    inner: RecencyCache<K, V, EvictHead, TS, S>,
}

impl<K, V, TS, S> MruCache<K, V, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    /// Builds a cache from `config`, using a default-constructed hasher.
    pub fn from_config(config: MruCacheConfig) -> Self {
        Self::from_config_and_hasher(config, S::default())
    }

    /// Builds a cache from `config` with an explicit hasher.
    pub fn from_config_and_hasher(config: MruCacheConfig, hasher: S) -> Self {
        MruCache {
            inner: RecencyCache::from_parts(config.capacity.get(), hasher),
        }
    }

    /// Inserts or updates `key` according to `allow`, splicing it to the
    /// most-recently-used end (and thus the next eviction candidate).
    pub fn insert(&self, key: K, value: V, allow: Allow) -> bool {
        self.inner.insert(key, value, allow)
    }

    /// Looks up `key`. Unless `peek` is [`Peek::Yes`], marks it
    /// most-recently-used.
    pub fn find<Q>(&self, key: &Q, peek: Peek) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.find(key, peek)
    }

    /// Removes `key` if present, returning whether it was.
    pub fn erase<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.erase(key)
    }

    /// Inserts or updates every `(key, value)` pair under one lock
    /// acquisition. Returns the number that succeeded.
    pub fn insert_range<I>(&self, pairs: I, allow: Allow) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.inner.insert_range(pairs, allow)
    }

    /// Current number of live entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// `true` if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Maximum number of live entries.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Removes every live entry.
    pub fn clear(&self) {
        self.inner.clear();
    }
}

impl<K, V, TS, S> CacheMetrics for MruCache<K, V, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.inner.metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        self.inner.algorithm_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::NotThreadSafe;
    use core::num::NonZeroUsize;

    fn cache(capacity: usize) -> MruCache<i32, &'static str, NotThreadSafe> {
        MruCache::from_config(MruCacheConfig::new(NonZeroUsize::new(capacity).unwrap()))
    }

    #[test]
    fn most_recently_touched_entry_is_evicted() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.insert(2, "b", Allow::InsertOrUpdate);
        cache.find(&2, Peek::No);
        cache.insert(3, "c", Allow::InsertOrUpdate);
        assert_eq!(cache.find(&2, Peek::No), None);
        assert_eq!(cache.find(&1, Peek::No), Some("a"));
        assert_eq!(cache.find(&3, Peek::No), Some("c"));
    }

    #[test]
    fn peek_does_not_expose_entry_to_eviction() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.insert(2, "b", Allow::InsertOrUpdate);
        cache.find(&1, Peek::Yes);
        cache.insert(3, "c", Allow::InsertOrUpdate);
        // 1 was peeked, not touched, so 2 (the prior head) is evicted instead.
        assert_eq!(cache.find(&2, Peek::No), None);
        assert_eq!(cache.find(&1, Peek::No), Some("a"));
    }

    #[test]
    fn erase_then_find_returns_none() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        assert!(cache.erase(&1));
        assert_eq!(cache.find(&1, Peek::No), None);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn algorithm_name_is_mru() {
        let cache = cache(1);
        assert_eq!(cache.algorithm_name(), "mru");
    }
}
