//! Uniform-TTL least recently used cache (§4.8).
//!
//! Like [`crate::tlru`], but every entry shares one TTL fixed at
//! construction (and changeable for future entries via [`UlruCache::update_ttl`]).
//! Since every live entry's TTL is identical, "earliest to expire" is the
//! same order as "longest since last touched" — so instead of tracking an
//! expiry bucket per distinct instant, a second plain [`IndexList`] ordered
//! by touch time (oldest head, freshest tail) doubles as the expiry
//! ordering, exactly as the original C++ source's `utlru_cache` does with
//! its `m_ttl_list` (see
//! `examples/original_source/inc/cappuccino/utlru_cache.hpp`): every touch
//! insert or update splices the entry to the tail of both the LRU list
//! and the TTL list and refreshes its expiry; a live `find` only moves
//! the LRU list (matching `do_find`/`do_access` there), since a read must
//! not postpone expiry. The head of the TTL list is always the next
//! entry to expire.

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
use crate::config::UlruCacheConfig;
use crate::entry::CacheEntry;
use crate::list::IndexList;
use crate::lock::ThreadSafety;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use crate::peek::Peek;

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// Per-entry bookkeeping: the instant this entry expires at, computed as
/// `last touched + ttl` at the time of that touch.
#[derive(Debug, Clone, Copy)]
struct ExpiryMeta {
    expires_at: Instant,
}

struct UlruSegment<K, V, S = DefaultHashBuilder> {
    arena: Vec<Option<CacheEntry<K, V, ExpiryMeta>>>,
    free: Vec<u32>,
    lru_order: IndexList,
    ttl_order: IndexList,
    map: HashMap<K, u32, S>,
    metrics: CoreCacheMetrics,
    ttl: Duration,
}

impl<K, V, S> UlruSegment<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default,
{
    fn new(config: UlruCacheConfig, hasher: S) -> Self {
        let capacity = config.capacity.get();
        let mut arena = Vec::with_capacity(capacity);
        arena.resize_with(capacity, || None);
        let free = (0..capacity as u32).rev().collect();
        let map = HashMap::with_capacity_and_hasher(capacity, hasher);
        UlruSegment {
            arena,
            free,
            lru_order: IndexList::with_capacity(capacity),
            ttl_order: IndexList::with_capacity(capacity),
            map,
            metrics: CoreCacheMetrics::default(),
            ttl: config.ttl,
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

    fn is_expired(&self, idx: u32, now: Instant) -> bool {
        self.arena[idx as usize].as_ref().expect("live slot").metadata.expires_at <= now
    }

    fn erase_idx(&mut self, idx: u32, key: &K) {
        self.lru_order.unlink(idx);
        self.ttl_order.unlink(idx);
        self.arena[idx as usize] = None;
        self.free.push(idx);
        self.map.remove(key);
    }

    /// Evicts the head of the TTL list if it has already expired, else
    /// falls back to the true LRU tail.
    fn evict_one(&mut self, now: Instant) {
        let victim = self
            .ttl_order
            .head()
            .filter(|&idx| self.is_expired(idx, now))
            .or_else(|| self.lru_order.tail());
        if let Some(victim) = victim {
            let key = self.arena[victim as usize].as_ref().expect("live slot").key.clone();
            self.erase_idx(victim, &key);
            self.metrics.record_eviction();
        }
    }

    fn touch(&mut self, idx: u32, now: Instant) {
        self.lru_order.move_to_front(idx);
        self.ttl_order.move_to_back(idx);
        self.arena[idx as usize].as_mut().expect("live slot").metadata.expires_at = now + self.ttl;
    }

    fn insert(&mut self, key: K, value: V, allow: Allow, now: Instant) -> bool {
        if let Some(&idx) = self.map.get(&key) {
            if allow.permits_update() {
                self.arena[idx as usize].as_mut().expect("live slot").value = value;
                self.touch(idx, now);
                return true;
            }
            if allow.permits_insert() && self.is_expired(idx, now) {
                self.arena[idx as usize].as_mut().expect("live slot").value = value;
                self.touch(idx, now);
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
        let expires_at = now + self.ttl;
        self.arena[idx as usize] = Some(CacheEntry::new(key.clone(), value, ExpiryMeta { expires_at }));
        self.lru_order.push_front(idx);
        self.ttl_order.push_back(idx);
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
            self.lru_order.move_to_front(idx);
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

    fn clean_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0usize;
        while let Some(head) = self.ttl_order.head() {
            if !self.is_expired(head, now) {
                break;
            }
            let key = self.arena[head as usize].as_ref().expect("live slot").key.clone();
            self.erase_idx(head, &key);
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
        self.lru_order = IndexList::with_capacity(self.arena.len());
        self.ttl_order = IndexList::with_capacity(self.arena.len());
        self.map.clear();
    }
}

/// A fixed-capacity cache where every entry shares one TTL, with LRU as
/// the tiebreaker once nothing has expired.
///
/// Requires the `std` feature, since expiry is driven by wall-clock time.
pub struct UlruCache<K, V, TS = crate::lock::ThreadSafe, S = DefaultHashBuilder>
where
    TS: ThreadSafety,
{
    inner: TS::Cell<UlruSegment<K, V, S>>,
}

impl<K, V, TS, S> UlruCache<K, V, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    /// Builds a cache from `config`, using a default-constructed hasher.
    pub fn from_config(config: UlruCacheConfig) -> Self {
        Self::from_config_and_hasher(config, S::default())
    }

    /// Builds a cache from `config` with an explicit hasher.
    pub fn from_config_and_hasher(config: UlruCacheConfig, hasher: S) -> Self {
        UlruCache {
            inner: TS::Cell::new(UlruSegment::new(config, hasher)),
        }
    }

    /// Inserts or updates `key`, timestamped `now`.
    pub fn insert_at(&self, key: K, value: V, allow: Allow, now: Instant) -> bool {
        self.inner.with_mut(|segment| segment.insert(key, value, allow, now))
    }

    /// Inserts or updates `key`, timestamped with the current instant.
    pub fn insert(&self, key: K, value: V, allow: Allow) -> bool {
        self.insert_at(key, value, allow, Instant::now())
    }

    /// Looks up `key` as of `now`.
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

    /// Changes the uniform TTL applied to future inserts and updates.
    /// Entries already in the cache keep the TTL they were given; this
    /// only takes effect the next time they're touched or a new key is
    /// inserted.
    pub fn update_ttl(&self, ttl: Duration) {
        self.inner.with_mut(|segment| segment.ttl = ttl);
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

impl<K, V, TS, S> CacheMetrics for UlruCache<K, V, TS, S>
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
        "ulru"
    }
}
