//! Least recently used cache (§4.2).
//!
//! A thin public wrapper over [`crate::recency::RecencyCache`] with the
//! eviction end fixed to the list tail: the least-recently-touched entry
//! is the one reclaimed under capacity pressure. See `recency.rs` for why
//! LRU and [`MruCache`](crate::mru::MruCache) share one engine instead of
//! two independently hand-rolled ones.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
extern crate std;
#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

use crate::allow::Allow;
use crate::config::LruCacheConfig;
use crate::lock::ThreadSafety;
use crate::metrics::CacheMetrics;
use crate::peek::Peek;
use crate::recency::{EvictTail, RecencyCache};

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;

/// A fixed-capacity cache evicting the least-recently-used entry.
///
/// `TS` selects the [`ThreadSafety`] policy; `S` selects the hash builder.
pub struct LruCache<K, V, TS = crate::lock::ThreadSafe, S = DefaultHashBuilder>
where
    TS: ThreadSafety,
{
    inner: RecencyCache<K, V, EvictTail, TS, S>,
}

impl<K, V, TS, S> LruCache<K, V, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    /// Builds a cache from `config`, using a default-constructed hasher.
    pub fn from_config(config: LruCacheConfig) -> Self {
        Self::from_config_and_hasher(config, S::default())
    }

    /// Builds a cache from `config` with an explicit hasher.
    pub fn from_config_and_hasher(config: LruCacheConfig, hasher: S) -> Self {
        LruCache {
            inner: RecencyCache::from_parts(config.capacity.get(), hasher),
        }
    }

    /// Inserts or updates `key` according to `allow`, splicing it to the
    /// most-recently-used end.
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

impl<K, V, TS, S> CacheMetrics for LruCache<K, V, TS, S>
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

    fn cache(capacity: usize) -> LruCache<i32, &'static str, NotThreadSafe> {
        LruCache::from_config(LruCacheConfig::new(NonZeroUsize::new(capacity).unwrap()))
    }

    #[test]
    fn scenario_2_lru_capacity_2() {
        let cache = cache(2);
        cache.insert(1, "Hello", Allow::InsertOrUpdate);
        cache.insert(2, "World", Allow::InsertOrUpdate);
        cache.insert(3, "Hola", Allow::InsertOrUpdate);
        assert_eq!(cache.find(&1, Peek::No), None);
        assert_eq!(cache.find(&2, Peek::No), Some("World"));
        assert_eq!(cache.find(&3, Peek::No), Some("Hola"));
    }

    #[test]
    fn find_protects_entry_from_eviction() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.insert(2, "b", Allow::InsertOrUpdate);
        cache.find(&1, Peek::No);
        cache.insert(3, "c", Allow::InsertOrUpdate);
        assert_eq!(cache.find(&1, Peek::No), Some("a"));
        assert_eq!(cache.find(&2, Peek::No), None);
    }

    #[test]
    fn peek_does_not_protect_from_eviction() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.insert(2, "b", Allow::InsertOrUpdate);
        cache.find(&1, Peek::Yes);
        cache.insert(3, "c", Allow::InsertOrUpdate);
        assert_eq!(cache.find(&1, Peek::Yes), None);
    }

    #[test]
    fn insert_mode_refuses_existing_key() {
        let cache = cache(2);
        assert!(cache.insert(1, "a", Allow::Insert));
        assert!(!cache.insert(1, "b", Allow::Insert));
    }

    #[test]
    fn update_mode_refuses_missing_key() {
        let cache = cache(2);
        assert!(!cache.insert(1, "a", Allow::Update));
        assert_eq!(cache.len(), 0);
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
    fn insert_range_reports_count_of_successes() {
        let cache = cache(4);
        let inserted = cache.insert_range([(1, "a"), (2, "b"), (1, "c")], Allow::Insert);
        assert_eq!(inserted, 2);
    }

    #[cfg(feature = "concurrent")]
    #[test]
    fn thread_safe_cache_is_shareable() {
        extern crate std;
        use crate::lock::ThreadSafe;
        use std::sync::Arc;
        use std::thread;
        use std::vec::Vec;

        let cache: Arc<LruCache<i32, i32, ThreadSafe>> =
            Arc::new(LruCache::from_config(LruCacheConfig::new(NonZeroUsize::new(64).unwrap())));
        let mut handles = Vec::new();
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    cache.insert(t * 100 + i, i, Allow::InsertOrUpdate);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 64);
    }
}
