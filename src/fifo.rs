//! First-in-first-out cache (§4.1).
//!
//! Maintains a single insertion-order [`IndexList`]: the head is the next
//! eviction victim, the tail is the most recently inserted slot. `find`
//! never touches the ordering. Structurally this is the grounding
//! codebase's `LruSegment`/`LruCache` split (config + arena + index +
//! metrics behind a thin public wrapper, guarded by the
//! [`ThreadSafety`](crate::lock::ThreadSafety) cell) with the recency
//! splice on `find` removed and the eviction end fixed at the head.

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
extern crate std;
#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use crate::allow::Allow;
use crate::config::FifoCacheConfig;
use crate::entry::CacheEntry;
use crate::list::IndexList;
use crate::lock::ThreadSafety;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;

struct FifoSegment<K, V, S = DefaultHashBuilder> {
    arena: alloc::vec::Vec<Option<CacheEntry<K, V>>>,
    free: alloc::vec::Vec<u32>,
    order: IndexList,
    map: HashMap<K, u32, S>,
    metrics: CoreCacheMetrics,
}

// `FifoSegment` holds no raw pointers — unlike the grounding codebase's
// pointer-based segments, which need a manual `unsafe impl Send/Sync`, this
// one is built entirely from `Vec`/`HashMap`, so the auto traits already
// give the right answer without an explicit, and therefore unnecessary,
// unsafe impl.

impl<K, V, S> FifoSegment<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default,
{
    fn new(config: FifoCacheConfig, hasher: S) -> Self {
        let capacity = config.capacity.get();
        let mut arena = alloc::vec::Vec::with_capacity(capacity);
        arena.resize_with(capacity, || None);
        let free = (0..capacity as u32).rev().collect();
        let mut map = HashMap::with_capacity_and_hasher(capacity, hasher);
        map.reserve(capacity);
        FifoSegment {
            arena,
            free,
            order: IndexList::with_capacity(capacity),
            map,
            metrics: CoreCacheMetrics::default(),
        }
    }

    fn capacity(&self) -> usize {
        self.arena.len()
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    fn evict_one(&mut self) {
        if let Some(victim) = self.order.pop_front() {
            let entry = self.arena[victim as usize].take().expect("live slot");
            self.map.remove(&entry.key);
            self.free.push(victim);
            self.metrics.record_eviction();
        }
    }

    fn insert(&mut self, key: K, value: V, allow: Allow) -> bool
    where
        K: Clone,
    {
        if let Some(&idx) = self.map.get(&key) {
            if !allow.permits_update() {
                return false;
            }
            self.arena[idx as usize].as_mut().expect("live slot").value = value;
            return true;
        }

        if !allow.permits_insert() {
            return false;
        }

        if self.is_full() {
            self.evict_one();
        }

        let idx = self.free.pop().expect("freed a slot above");
        self.arena[idx as usize] = Some(CacheEntry::new(key.clone(), value, ()));
        self.map.insert(key, idx);
        self.order.push_back(idx);
        true
    }

    fn find<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key) {
            Some(&idx) => {
                self.metrics.record_hit();
                Some(self.arena[idx as usize].as_ref().expect("live slot").value.clone())
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.remove(key) {
            Some(idx) => {
                self.order.unlink(idx);
                self.arena[idx as usize] = None;
                self.free.push(idx);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        for slot in &mut self.arena {
            *slot = None;
        }
        self.free = (0..self.arena.len() as u32).rev().collect();
        self.order = IndexList::with_capacity(self.arena.len());
        self.map.clear();
    }
}

/// A fixed-capacity cache evicting in strict insertion order.
///
/// `TS` selects the [`ThreadSafety`] policy (defaults to
/// [`ThreadSafe`](crate::lock::ThreadSafe)); `S` selects the hash builder.
pub struct FifoCache<K, V, TS = crate::lock::ThreadSafe, S = DefaultHashBuilder>
where
    TS: ThreadSafety,
{
    inner: TS::Cell<FifoSegment<K, V, S>>,
}

impl<K, V, TS, S> FifoCache<K, V, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    /// Builds a cache from `config`, using a default-constructed hasher.
    pub fn from_config(config: FifoCacheConfig) -> Self {
        Self::from_config_and_hasher(config, S::default())
    }

    /// Builds a cache from `config` with an explicit hasher.
    pub fn from_config_and_hasher(config: FifoCacheConfig, hasher: S) -> Self {
        FifoCache {
            inner: TS::Cell::new(FifoSegment::new(config, hasher)),
        }
    }

    /// Inserts or updates `key` according to `allow` (defaults to
    /// [`Allow::InsertOrUpdate`]). Returns whether the mutation happened.
    pub fn insert(&self, key: K, value: V, allow: Allow) -> bool {
        self.inner.with_mut(|segment| segment.insert(key, value, allow))
    }

    /// Looks up `key`. FIFO has no recency ordering, so there is no `peek`
    /// variant: every `find` is side-effect-free on the ordering.
    pub fn find<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.with_mut(|segment| segment.find(key))
    }

    /// Removes `key` if present, returning whether it was.
    pub fn erase<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.with_mut(|segment| segment.erase(key))
    }

    /// Inserts or updates every `(key, value)` pair under one lock
    /// acquisition. Returns the number that succeeded.
    pub fn insert_range<I>(&self, pairs: I, allow: Allow) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.inner.with_mut(|segment| {
            pairs.into_iter().fold(0usize, |count, (key, value)| {
                count + usize::from(segment.insert(key, value, allow))
            })
        })
    }

    /// Current number of live entries.
    pub fn len(&self) -> usize {
        self.inner.with_mut(|segment| segment.len())
    }

    /// `true` if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of live entries.
    pub fn capacity(&self) -> usize {
        self.inner.with_mut(|segment| segment.capacity())
    }

    /// Removes every live entry.
    pub fn clear(&self) {
        self.inner.with_mut(|segment| segment.clear());
    }
}

impl<K, V, TS, S> CacheMetrics for FifoCache<K, V, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.inner.with_mut(|segment| segment.metrics.as_map())
    }

    fn algorithm_name(&self) -> &'static str {
        "fifo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::NotThreadSafe;
    use core::num::NonZeroUsize;

    fn cache(capacity: usize) -> FifoCache<i32, &'static str, NotThreadSafe> {
        FifoCache::from_config(FifoCacheConfig::new(NonZeroUsize::new(capacity).unwrap()))
    }

    #[test]
    fn scenario_1_fifo_capacity_4() {
        let cache = cache(4);
        assert!(cache.insert(1, "one", Allow::InsertOrUpdate));
        assert!(cache.insert(2, "two", Allow::InsertOrUpdate));
        assert!(cache.insert(3, "three", Allow::InsertOrUpdate));
        assert!(cache.insert(4, "four", Allow::InsertOrUpdate));
        assert_eq!(cache.find(&1), Some("one"));
        assert_eq!(cache.find(&2), Some("two"));
        assert_eq!(cache.find(&3), Some("three"));
        assert_eq!(cache.find(&4), Some("four"));

        assert!(cache.insert(5, "five", Allow::InsertOrUpdate));
        assert_eq!(cache.find(&1), None);
        for (k, v) in [(2, "two"), (3, "three"), (4, "four"), (5, "five")] {
            assert_eq!(cache.find(&k), Some(v));
        }

        assert!(cache.insert(6, "six", Allow::InsertOrUpdate));
        assert_eq!(cache.find(&2), None);
        for (k, v) in [(3, "three"), (4, "four"), (5, "five"), (6, "six")] {
            assert_eq!(cache.find(&k), Some(v));
        }
    }

    #[test]
    fn filling_past_capacity_leaves_newest_c_keys() {
        let cache = cache(3);
        for i in 1..=4 {
            cache.insert(i, i, Allow::InsertOrUpdate);
        }
        assert_eq!(cache.find(&1), None);
        assert_eq!(cache.find(&2), Some(2));
        assert_eq!(cache.find(&3), Some(3));
        assert_eq!(cache.find(&4), Some(4));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn insert_mode_refuses_existing_key() {
        let cache = cache(2);
        assert!(cache.insert(1, "a", Allow::Insert));
        assert!(!cache.insert(1, "b", Allow::Insert));
        assert_eq!(cache.find(&1), Some("a"));
    }

    #[test]
    fn update_mode_refuses_missing_key() {
        let cache = cache(2);
        assert!(!cache.insert(1, "a", Allow::Update));
        assert_eq!(cache.find(&1), None);
    }

    #[test]
    fn find_does_not_affect_eviction_order() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.insert(2, "b", Allow::InsertOrUpdate);
        // Even though 1 is the most recently found, FIFO still evicts it
        // first since insertion order, not recency, drives eviction.
        cache.find(&1);
        cache.insert(3, "c", Allow::InsertOrUpdate);
        assert_eq!(cache.find(&1), None);
        assert_eq!(cache.find(&2), Some("b"));
        assert_eq!(cache.find(&3), Some("c"));
    }

    #[test]
    fn erase_then_find_returns_none() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        assert!(cache.erase(&1));
        assert_eq!(cache.find(&1), None);
        assert!(!cache.erase(&1));
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.insert(2, "b", Allow::InsertOrUpdate);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.find(&1), None);
    }

    #[test]
    fn insert_range_reports_count_of_successes() {
        let cache = cache(4);
        let inserted = cache.insert_range(
            [(1, "a"), (2, "b"), (1, "c")],
            Allow::Insert,
        );
        // key 1 succeeds once (insert), then fails the second time under
        // `Allow::Insert` since it now exists.
        assert_eq!(inserted, 2);
    }

    #[cfg(feature = "concurrent")]
    #[test]
    fn thread_safe_cache_is_shareable() {
        extern crate std;
        use crate::lock::ThreadSafe;
        use std::sync::Arc;
        use std::thread;

        let cache: Arc<FifoCache<i32, i32, ThreadSafe>> =
            Arc::new(FifoCache::from_config(FifoCacheConfig::new(NonZeroUsize::new(64).unwrap())));
        let mut handles = alloc::vec::Vec::new();
        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..16 {
                    cache.insert(t * 16 + i, i, Allow::InsertOrUpdate);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 64);
    }
}
