//! Least frequently used cache (§4.5).
//!
//! Maintains a frequency multi-index from use-count to the set of slots
//! currently at that count: a [`BTreeMap<u64, Vec<u32>>`](alloc::collections::BTreeMap),
//! lowest key first. A touched slot is removed from its current bucket and
//! reinserted one bucket up; eviction pops an arbitrary element out of the
//! lowest-keyed bucket (ties are broken arbitrarily, per §4.5). Each slot's
//! [`LfuMeta`] records which bucket it's in and its position within that
//! bucket's `Vec`, so the remove-then-reinsert on every touch is O(1)
//! (swap-remove) rather than a linear scan of the bucket.
//!
//! Grounded on the original C++ source's `lfu_cache::do_access`, which
//! erases and re-emplaces into a `std::multimap<size_t, iterator>` on every
//! touch; a `BTreeMap<u64, Vec<u32>>` is the same "bucket of equally-used
//! slots" idea translated to index handles instead of iterators, following
//! this crate's own `list.rs`/`arena.rs` substitution (see DESIGN.md). The
//! use-count accounting (insert counts as one use, `find`/`update`
//! increment, eviction never bumps survivors) matches the original's
//! `do_insert`/`do_access` exactly — see SPEC_FULL.md §9's open question.

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
use crate::config::LfuCacheConfig;
use crate::entry::CacheEntry;
use crate::lock::ThreadSafety;
use crate::meta::LfuMeta;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use crate::peek::Peek;

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

struct LfuSegment<K, V, S = DefaultHashBuilder> {
    arena: Vec<Option<CacheEntry<K, V, LfuMeta>>>,
    free: Vec<u32>,
    buckets: BTreeMap<u64, Vec<u32>>,
    map: HashMap<K, u32, S>,
    metrics: CoreCacheMetrics,
}

impl<K, V, S> LfuSegment<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default,
{
    fn new(config: LfuCacheConfig, hasher: S) -> Self {
        let capacity = config.capacity.get();
        let mut arena = Vec::with_capacity(capacity);
        arena.resize_with(capacity, || None);
        let free = (0..capacity as u32).rev().collect();
        let mut map = HashMap::with_capacity_and_hasher(capacity, hasher);
        map.reserve(capacity);
        LfuSegment {
            arena,
            free,
            buckets: BTreeMap::new(),
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

    /// Removes `idx` from the bucket keyed by `count` via swap-remove,
    /// fixing up the moved neighbor's recorded position.
    fn remove_from_bucket(&mut self, count: u64, pos: u32) {
        let bucket = self.buckets.get_mut(&count).expect("bucket must exist");
        bucket.swap_remove(pos as usize);
        if let Some(&moved) = bucket.get(pos as usize) {
            self.arena[moved as usize].as_mut().expect("live slot").metadata.bucket_pos = pos;
        }
        if bucket.is_empty() {
            self.buckets.remove(&count);
        }
    }

    /// Inserts `idx` into the bucket keyed by `count`, stamping its
    /// metadata with the new count and bucket position.
    fn push_to_bucket(&mut self, count: u64, idx: u32) {
        let bucket = self.buckets.entry(count).or_default();
        let pos = bucket.len() as u32;
        bucket.push(idx);
        let entry = self.arena[idx as usize].as_mut().expect("live slot");
        entry.metadata.use_count = count;
        entry.metadata.bucket_pos = pos;
    }

    /// Bumps `idx`'s use-count by one, moving it to the next bucket up.
    fn bump(&mut self, idx: u32) {
        let meta = self.arena[idx as usize].as_ref().expect("live slot").metadata;
        self.remove_from_bucket(meta.use_count, meta.bucket_pos);
        self.push_to_bucket(meta.use_count + 1, idx);
    }

    fn evict_one(&mut self) {
        let Some((&count, _)) = self.buckets.iter().next() else {
            return;
        };
        let victim = {
            let bucket = self.buckets.get_mut(&count).expect("bucket must exist");
            let victim = bucket.pop().expect("non-empty bucket");
            if bucket.is_empty() {
                self.buckets.remove(&count);
            }
            victim
        };
        let entry = self.arena[victim as usize].take().expect("live slot");
        self.map.remove(&entry.key);
        self.free.push(victim);
        self.metrics.record_eviction();
    }

    fn insert(&mut self, key: K, value: V, allow: Allow) -> bool {
        if let Some(&idx) = self.map.get(&key) {
            if !allow.permits_update() {
                return false;
            }
            self.arena[idx as usize].as_mut().expect("live slot").value = value;
            self.bump(idx);
            return true;
        }

        if !allow.permits_insert() {
            return false;
        }

        if self.is_full() {
            self.evict_one();
        }

        let idx = self.free.pop().expect("freed a slot above");
        self.arena[idx as usize] = Some(CacheEntry::new(key.clone(), value, LfuMeta::default()));
        self.push_to_bucket(1, idx);
        self.map.insert(key, idx);
        true
    }

    fn find<Q>(&mut self, key: &Q, peek: Peek) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key).copied() {
            Some(idx) => {
                if !peek.is_peeking() {
                    self.bump(idx);
                }
                self.metrics.record_hit();
                Some(self.arena[idx as usize].as_ref().expect("live slot").value.clone())
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    fn find_with_use_count<Q>(&mut self, key: &Q, peek: Peek) -> Option<(V, u64)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key).copied() {
            Some(idx) => {
                if !peek.is_peeking() {
                    self.bump(idx);
                }
                self.metrics.record_hit();
                let entry = self.arena[idx as usize].as_ref().expect("live slot");
                Some((entry.value.clone(), entry.metadata.use_count))
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
                let meta = self.arena[idx as usize].as_ref().expect("live slot").metadata;
                self.remove_from_bucket(meta.use_count, meta.bucket_pos);
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
        self.buckets.clear();
        self.map.clear();
    }
}

/// A fixed-capacity cache evicting the least-frequently-used entry.
///
/// `TS` selects the [`ThreadSafety`] policy; `S` selects the hash builder.
pub struct LfuCache<K, V, TS = crate::lock::ThreadSafe, S = DefaultHashBuilder>
where
    TS: ThreadSafety,
{
    inner: TS::Cell<LfuSegment<K, V, S>>,
}

impl<K, V, TS, S> LfuCache<K, V, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    /// Builds a cache from `config`, using a default-constructed hasher.
    pub fn from_config(config: LfuCacheConfig) -> Self {
        Self::from_config_and_hasher(config, S::default())
    }

    /// Builds a cache from `config` with an explicit hasher.
    pub fn from_config_and_hasher(config: LfuCacheConfig, hasher: S) -> Self {
        LfuCache {
            inner: TS::Cell::new(LfuSegment::new(config, hasher)),
        }
    }

    /// Inserts or updates `key` according to `allow`. Either outcome bumps
    /// the entry's use-count (§4.5: "on successful `find`… or on `update`").
    pub fn insert(&self, key: K, value: V, allow: Allow) -> bool {
        self.inner.with_mut(|segment| segment.insert(key, value, allow))
    }

    /// Looks up `key`. Unless `peek` is [`Peek::Yes`], bumps its use-count.
    pub fn find<Q>(&self, key: &Q, peek: Peek) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.with_mut(|segment| segment.find(key, peek))
    }

    /// Looks up `key`, returning its current use-count alongside the value.
    pub fn find_with_use_count<Q>(&self, key: &Q, peek: Peek) -> Option<(V, u64)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.with_mut(|segment| segment.find_with_use_count(key, peek))
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

impl<K, V, TS, S> CacheMetrics for LfuCache<K, V, TS, S>
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
        "lfu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::NotThreadSafe;
    use core::num::NonZeroUsize;

    fn cache(capacity: usize) -> LfuCache<i32, &'static str, NotThreadSafe> {
        LfuCache::from_config(LfuCacheConfig::new(NonZeroUsize::new(capacity).unwrap()))
    }

    #[test]
    fn scenario_3_lfu_capacity_2() {
        let cache = cache(2);
        cache.insert(1, "Hello", Allow::InsertOrUpdate);
        cache.insert(2, "World", Allow::InsertOrUpdate);
        cache.find(&1, Peek::No);
        cache.find(&1, Peek::No);
        cache.find(&2, Peek::No);
        cache.insert(3, "HW", Allow::InsertOrUpdate);

        assert_eq!(cache.find_with_use_count(&2, Peek::No), None);
        // insert=1, two prior finds=+2, this find=+1 => 4: this find
        // itself also counts as a use. Eviction never bumps a survivor's
        // use-count. See the module doc and DESIGN.md.
        assert_eq!(cache.find_with_use_count(&1, Peek::No), Some(("Hello", 4)));
        assert_eq!(cache.find_with_use_count(&3, Peek::No), Some(("HW", 2)));
    }

    #[test]
    fn least_frequently_used_is_evicted() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.insert(2, "b", Allow::InsertOrUpdate);
        cache.find(&1, Peek::No);
        cache.insert(3, "c", Allow::InsertOrUpdate);
        assert_eq!(cache.find(&2, Peek::No), None);
        assert_eq!(cache.find(&1, Peek::No), Some("a"));
        assert_eq!(cache.find(&3, Peek::No), Some("c"));
    }

    #[test]
    fn peek_does_not_bump_use_count() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        assert_eq!(cache.find_with_use_count(&1, Peek::Yes), Some(("a", 1)));
        assert_eq!(cache.find_with_use_count(&1, Peek::Yes), Some(("a", 1)));
    }

    #[test]
    fn update_bumps_use_count() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.insert(1, "a2", Allow::Update);
        assert_eq!(cache.find_with_use_count(&1, Peek::Yes), Some(("a2", 2)));
    }

    #[test]
    fn insert_mode_refuses_existing_key() {
        let cache = cache(2);
        assert!(cache.insert(1, "a", Allow::Insert));
        assert!(!cache.insert(1, "b", Allow::Insert));
        assert_eq!(cache.find(&1, Peek::No), Some("a"));
    }

    #[test]
    fn erase_removes_entry_and_its_bucket_membership() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.insert(2, "b", Allow::InsertOrUpdate);
        assert!(cache.erase(&1));
        assert_eq!(cache.find(&1, Peek::No), None);
        cache.insert(3, "c", Allow::InsertOrUpdate);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = cache(2);
        cache.insert(1, "a", Allow::InsertOrUpdate);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.find(&1, Peek::No), None);
    }

    #[test]
    fn insert_range_reports_count_of_successes() {
        let cache = cache(4);
        let inserted = cache.insert_range([(1, "a"), (2, "b"), (1, "c")], Allow::Insert);
        assert_eq!(inserted, 2);
    }
}
