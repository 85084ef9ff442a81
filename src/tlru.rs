//! Time-aware least recently used cache, per-entry TTL (§4.7).
//!
//! Combines an LRU recency list with a second ordering — an expiry
//! multi-index bucketed by absolute instant, lowest first — so that an
//! already-expired entry is preferred for eviction over the true LRU tail.
//! Grounded on the original C++ source's `tlru_cache::do_prune`
//! (`examples/original_source/inc/cappuccino/tlru_cache.hpp`): check the
//! earliest-expiring entry first; only fall back to the recency tail if
//! nothing has expired yet.
//!
//! Two details carried over verbatim from that source, both confirmed by
//! reading `do_insert_update`/`do_insert`/`do_find`:
//! - An `insert` in `Allow::Insert`-only mode still succeeds against an
//!   existing key if that key's entry has already expired — functionally
//!   equivalent to replacing a dead entry, even though the key is
//!   technically still present in the index.
//! - A brand new insert also touches the recency list (splices to the
//!   most-recently-used end), not just `find`/`update`.

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

extern crate std;
use std::time::{Duration, Instant};

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use crate::allow::Allow;
use crate::config::TlruCacheConfig;
use crate::entry::CacheEntry;
use crate::list::IndexList;
use crate::lock::ThreadSafety;
use crate::meta::timed::TtlMeta;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use crate::peek::Peek;

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

struct TlruSegment<K, V, S = DefaultHashBuilder> {
    arena: Vec<Option<CacheEntry<K, V, TtlMeta>>>,
    free: Vec<u32>,
    buckets: BTreeMap<Instant, Vec<u32>>,
    order: IndexList,
    map: HashMap<K, u32, S>,
    metrics: CoreCacheMetrics,
}

impl<K, V, S> TlruSegment<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default,
{
    fn new(config: TlruCacheConfig, hasher: S) -> Self {
        let capacity = config.capacity.get();
        let mut arena = Vec::with_capacity(capacity);
        arena.resize_with(capacity, || None);
        let free = (0..capacity as u32).rev().collect();
        let map = HashMap::with_capacity_and_hasher(capacity, hasher);
        TlruSegment {
            arena,
            free,
            buckets: BTreeMap::new(),
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

    fn remove_from_bucket(&mut self, expires_at: Instant, pos: u32) {
        let bucket = self.buckets.get_mut(&expires_at).expect("bucket must exist");
        bucket.swap_remove(pos as usize);
        if let Some(&moved) = bucket.get(pos as usize) {
            self.arena[moved as usize].as_mut().expect("live slot").metadata.bucket_pos = pos;
        }
        if bucket.is_empty() {
            self.buckets.remove(&expires_at);
        }
    }

    fn push_to_bucket(&mut self, expires_at: Instant, idx: u32) {
        let bucket = self.buckets.entry(expires_at).or_default();
        let pos = bucket.len() as u32;
        bucket.push(idx);
        let entry = self.arena[idx as usize].as_mut().expect("live slot");
        entry.metadata.expires_at = expires_at;
        entry.metadata.bucket_pos = pos;
    }

    fn is_expired(&self, idx: u32, now: Instant) -> bool {
        self.arena[idx as usize].as_ref().expect("live slot").metadata.is_expired(now)
    }

    fn erase_idx(&mut self, idx: u32, key: &K) {
        let meta = self.arena[idx as usize].as_ref().expect("live slot").metadata;
        self.remove_from_bucket(meta.expires_at, meta.bucket_pos);
        self.order.unlink(idx);
        self.arena[idx as usize] = None;
        self.free.push(idx);
        self.map.remove(key);
    }

    /// Evicts the earliest-to-expire entry if one has already expired,
    /// else falls back to the true LRU tail.
    fn evict_one(&mut self, now: Instant) {
        let earliest_expired = self
            .buckets
            .iter()
            .next()
            .filter(|&(&expires_at, _)| expires_at <= now)
            .map(|(_, bucket)| bucket[0]);

        let victim = earliest_expired.or_else(|| self.order.tail());
        if let Some(victim) = victim {
            let key = self.arena[victim as usize].as_ref().expect("live slot").key.clone();
            self.erase_idx(victim, &key);
            self.metrics.record_eviction();
        }
    }

    fn do_update(&mut self, idx: u32, value: V, ttl: Duration, now: Instant) {
        self.arena[idx as usize].as_mut().expect("live slot").value = value;
        let meta = self.arena[idx as usize].as_ref().expect("live slot").metadata;
        self.remove_from_bucket(meta.expires_at, meta.bucket_pos);
        self.push_to_bucket(now + ttl, idx);
        self.order.move_to_front(idx);
    }

    fn insert(&mut self, key: K, value: V, ttl: Duration, allow: Allow, now: Instant) -> bool {
        if let Some(&idx) = self.map.get(&key) {
            if allow.permits_update() {
                self.do_update(idx, value, ttl, now);
                return true;
            }
            if allow.permits_insert() && self.is_expired(idx, now) {
                self.do_update(idx, value, ttl, now);
                return true;
            }
            return false;
        }

        if !allow.permits_insert() {
            return false;
        }

        if self.is_full() {
            self.evict_one(now);
        }

        let idx = self.free.pop().expect("freed a slot above");
        let expires_at = now + ttl;
        self.arena[idx as usize] = Some(CacheEntry::new(key.clone(), value, TtlMeta::new(expires_at)));
        self.push_to_bucket(expires_at, idx);
        self.order.push_front(idx);
        self.map.insert(key, idx);
        true
    }

    fn find<Q>(&mut self, key: &Q, peek: Peek, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&idx) = self.map.get(key) else {
            self.metrics.record_miss();
            return None;
        };

        if self.is_expired(idx, now) {
            let owned_key = self.arena[idx as usize].as_ref().expect("live slot").key.clone();
            self.erase_idx(idx, &owned_key);
            self.metrics.record_expiration();
            self.metrics.record_miss();
            return None;
        }

        if !peek.is_peeking() {
            self.order.move_to_front(idx);
        }
        self.metrics.record_hit();
        Some(self.arena[idx as usize].as_ref().expect("live slot").value.clone())
    }

    fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key).copied() {
            Some(idx) => {
                let owned_key = self.arena[idx as usize].as_ref().expect("live slot").key.clone();
                self.erase_idx(idx, &owned_key);
                true
            }
            None => false,
        }
    }

    /// Evicts every entry whose TTL has already elapsed, oldest-expiring
    /// first. Returns the number removed.
    fn clean_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0usize;
        loop {
            let Some((&expires_at, bucket)) = self.buckets.iter().next() else {
                break;
            };
            if expires_at > now {
                break;
            }
            let victim = bucket[0];
            let key = self.arena[victim as usize].as_ref().expect("live slot").key.clone();
            self.erase_idx(victim, &key);
            self.metrics.record_expiration();
            removed += 1;
        }
        removed
    }

    fn clear(&mut self) {
        for slot in &mut self.arena {
            *slot = None;
        }
        self.free = (0..self.arena.len() as u32).rev().collect();
        self.buckets.clear();
        self.order = IndexList::with_capacity(self.arena.len());
        self.map.clear();
    }
}

/// A fixed-capacity cache where each entry carries its own TTL, supplied
/// at `insert` time, combined with LRU recency as the tiebreaker once
/// nothing has expired.
///
/// Requires the `std` feature, since expiry is driven by wall-clock time.
pub struct TlruCache<K, V, TS = crate::lock::ThreadSafe, S = DefaultHashBuilder>
where
    TS: ThreadSafety,
{
    inner: TS::Cell<TlruSegment<K, V, S>>,
}

impl<K, V, TS, S> TlruCache<K, V, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    /// Builds a cache from `config`, using a default-constructed hasher.
    pub fn from_config(config: TlruCacheConfig) -> Self {
        Self::from_config_and_hasher(config, S::default())
    }

    /// Builds a cache from `config` with an explicit hasher.
    pub fn from_config_and_hasher(config: TlruCacheConfig, hasher: S) -> Self {
        TlruCache {
            inner: TS::Cell::new(TlruSegment::new(config, hasher)),
        }
    }

    /// Inserts or updates `key` with a per-entry `ttl`, timestamped `now`.
    pub fn insert_at(&self, key: K, value: V, ttl: Duration, allow: Allow, now: Instant) -> bool {
        self.inner.with_mut(|segment| segment.insert(key, value, ttl, allow, now))
    }

    /// Inserts or updates `key` with a per-entry `ttl`, timestamped with
    /// the current instant.
    pub fn insert(&self, key: K, value: V, ttl: Duration, allow: Allow) -> bool {
        self.insert_at(key, value, ttl, allow, Instant::now())
    }

    /// Looks up `key` as of `now`. An already-expired entry is treated as
    /// absent (and evicted inline). Unless `peek` is [`Peek::Yes`], a live
    /// hit marks the entry most-recently-used.
    pub fn find_at<Q>(&self, key: &Q, peek: Peek, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.with_mut(|segment| segment.find(key, peek, now))
    }

    /// Looks up `key` as of the current instant.
    pub fn find<Q>(&self, key: &Q, peek: Peek) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_at(key, peek, Instant::now())
    }

    /// Removes `key` if present, returning whether it was.
    pub fn erase<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.with_mut(|segment| segment.erase(key))
    }

    /// Evicts every entry whose TTL has elapsed as of `now`. Returns the
    /// number removed.
    pub fn clean_expired_at(&self, now: Instant) -> usize {
        self.inner.with_mut(|segment| segment.clean_expired(now))
    }

    /// Evicts every entry whose TTL has elapsed as of the current instant.
    pub fn clean_expired(&self) -> usize {
        self.clean_expired_at(Instant::now())
    }

    /// Current number of live entries (including any not yet pruned for
    /// having expired).
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

impl<K, V, TS, S> CacheMetrics for TlruCache<K, V, TS, S>
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
        "tlru"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::NotThreadSafe;
    use core::num::NonZeroUsize;

    fn cache(capacity: usize) -> TlruCache<i32, &'static str, NotThreadSafe> {
        TlruCache::from_config(TlruCacheConfig::new(NonZeroUsize::new(capacity).unwrap()))
    }

    #[test]
    fn expired_entry_is_preferred_over_lru_tail_on_eviction() {
        let cache = cache(2);
        let t0 = Instant::now();
        // key 1 expires almost immediately; key 2 lives a long time.
        cache.insert_at(1, "a", Duration::from_millis(1), Allow::InsertOrUpdate, t0);
        cache.insert_at(2, "b", Duration::from_secs(60), Allow::InsertOrUpdate, t0);
        // Touch 1 so it's MRU; absent expiry-preference it would survive.
        let t1 = t0 + Duration::from_millis(2);
        cache.insert_at(3, "c", Duration::from_secs(60), Allow::InsertOrUpdate, t1);
        assert_eq!(cache.find_at(&1, Peek::No, t1), None);
        assert_eq!(cache.find_at(&2, Peek::No, t1), Some("b"));
        assert_eq!(cache.find_at(&3, Peek::No, t1), Some("c"));
    }

    #[test]
    fn lru_tail_is_evicted_when_nothing_has_expired() {
        let cache = cache(2);
        let t0 = Instant::now();
        cache.insert_at(1, "a", Duration::from_secs(60), Allow::InsertOrUpdate, t0);
        cache.insert_at(2, "b", Duration::from_secs(60), Allow::InsertOrUpdate, t0);
        cache.find_at(&1, Peek::No, t0);
        cache.insert_at(3, "c", Duration::from_secs(60), Allow::InsertOrUpdate, t0);
        assert_eq!(cache.find_at(&2, Peek::No, t0), None);
    }

    #[test]
    fn insert_only_mode_succeeds_against_an_expired_key() {
        let cache = cache(2);
        let t0 = Instant::now();
        cache.insert_at(1, "a", Duration::from_millis(1), Allow::InsertOrUpdate, t0);
        let t1 = t0 + Duration::from_millis(2);
        assert!(cache.insert_at(1, "a2", Duration::from_secs(60), Allow::Insert, t1));
        assert_eq!(cache.find_at(&1, Peek::No, t1), Some("a2"));
    }

    #[test]
    fn insert_only_mode_refuses_a_live_existing_key() {
        let cache = cache(2);
        let t0 = Instant::now();
        cache.insert_at(1, "a", Duration::from_secs(60), Allow::InsertOrUpdate, t0);
        assert!(!cache.insert_at(1, "a2", Duration::from_secs(60), Allow::Insert, t0));
        assert_eq!(cache.find_at(&1, Peek::No, t0), Some("a"));
    }

    #[test]
    fn find_on_expired_entry_returns_none_and_evicts_it() {
        let cache = cache(2);
        let t0 = Instant::now();
        cache.insert_at(1, "a", Duration::from_millis(1), Allow::InsertOrUpdate, t0);
        let t1 = t0 + Duration::from_millis(2);
        assert_eq!(cache.find_at(&1, Peek::No, t1), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn clean_expired_removes_only_elapsed_entries() {
        let cache = cache(4);
        let t0 = Instant::now();
        cache.insert_at(1, "a", Duration::from_millis(1), Allow::InsertOrUpdate, t0);
        cache.insert_at(2, "b", Duration::from_secs(60), Allow::InsertOrUpdate, t0);
        let t1 = t0 + Duration::from_millis(2);
        assert_eq!(cache.clean_expired_at(t1), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.find_at(&2, Peek::No, t1), Some("b"));
    }

    #[test]
    fn erase_removes_entry() {
        let cache = cache(2);
        let t0 = Instant::now();
        cache.insert_at(1, "a", Duration::from_secs(60), Allow::InsertOrUpdate, t0);
        assert!(cache.erase(&1));
        assert_eq!(cache.find_at(&1, Peek::No, t0), None);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = cache(2);
        cache.insert(1, "a", Duration::from_secs(60), Allow::InsertOrUpdate);
        cache.clear();
        assert!(cache.is_empty());
    }
}
