//! Random replacement cache (§4.4).
//!
//! No ordering is tracked at all: every live slot is an equally valid
//! eviction candidate. A dense `Vec<u32>` of currently-occupied slot
//! indices (`live`) supports O(1) uniform-random eviction via
//! swap-remove, mirroring the original C++ source's `m_open_list`
//! partition (`examples/original_source/inc/cappuccino/rr_cache.hpp`):
//! that source only ever prunes when the cache is completely full, at
//! which point every slot index is live, so picking uniformly among
//! `0..capacity` and picking uniformly among `live` coincide. This
//! crate's `live` vector keeps that property even if eviction is ever
//! triggered before the cache is full.
//!
//! `find` never touches any ordering — there is none to touch.

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
use crate::config::RrCacheConfig;
use crate::entry::CacheEntry;
use crate::lock::ThreadSafety;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use crate::peek::Peek;
use crate::rng::RandomSource;

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// Per-entry bookkeeping: its position within the `live` vector, for O(1)
/// swap-remove on erase or eviction.
#[derive(Debug, Clone, Copy, Default)]
struct RrMeta {
    live_pos: u32,
}

struct RrSegment<K, V, S = DefaultHashBuilder> {
    arena: Vec<Option<CacheEntry<K, V, RrMeta>>>,
    free: Vec<u32>,
    live: Vec<u32>,
    map: HashMap<K, u32, S>,
    metrics: CoreCacheMetrics,
    rng: RandomSource,
}

impl<K, V, S> RrSegment<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default,
{
    fn new(config: RrCacheConfig, hasher: S, rng: RandomSource) -> Self {
        let capacity = config.capacity.get();
        let mut arena = Vec::with_capacity(capacity);
        arena.resize_with(capacity, || None);
        let free = (0..capacity as u32).rev().collect();
        let map = HashMap::with_capacity_and_hasher(capacity, hasher);
        RrSegment {
            arena,
            free,
            live: Vec::with_capacity(capacity),
            map,
            metrics: CoreCacheMetrics::default(),
            rng,
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

    fn unlink_live(&mut self, idx: u32, pos: u32) {
        self.live.swap_remove(pos as usize);
        if let Some(&moved) = self.live.get(pos as usize) {
            self.arena[moved as usize].as_mut().expect("live slot").metadata.live_pos = pos;
        }
        let _ = idx;
    }

    fn evict_one(&mut self) {
        if self.live.is_empty() {
            return;
        }
        let pos = self.rng.gen_below(self.live.len()) as u32;
        let victim = self.live[pos as usize];
        self.unlink_live(victim, pos);
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
            return true;
        }

        if !allow.permits_insert() {
            return false;
        }

        if self.is_full() {
            self.evict_one();
        }

        let idx = self.free.pop().expect("freed a slot above");
        let live_pos = self.live.len() as u32;
        self.arena[idx as usize] = Some(CacheEntry::new(
            key.clone(),
            value,
            RrMeta { live_pos },
        ));
        self.live.push(idx);
        self.map.insert(key, idx);
        true
    }

    fn find<Q>(&mut self, key: &Q, peek: Peek) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let _ = peek;
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
                let pos = self.arena[idx as usize].as_ref().expect("live slot").metadata.live_pos;
                self.unlink_live(idx, pos);
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
        self.live.clear();
        self.map.clear();
    }
}

/// A fixed-capacity cache evicting a uniformly random live entry under
/// capacity pressure. `find` never changes eviction priority: there is no
/// ordering to preserve.
///
/// `TS` selects the [`ThreadSafety`] policy; `S` selects the hash builder.
pub struct RrCache<K, V, TS = crate::lock::ThreadSafe, S = DefaultHashBuilder>
where
    TS: ThreadSafety,
{
    inner: TS::Cell<RrSegment<K, V, S>>,
}

impl<K, V, TS, S> RrCache<K, V, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    /// Builds a cache from `config`, seeding eviction randomness from OS
    /// entropy. Requires the `std` feature.
    #[cfg(feature = "std")]
    pub fn from_config(config: RrCacheConfig) -> Self {
        Self::from_config_and_hasher(config, S::default())
    }

    /// Builds a cache from `config` with an explicit hasher, seeding
    /// eviction randomness from OS entropy. Requires the `std` feature.
    #[cfg(feature = "std")]
    pub fn from_config_and_hasher(config: RrCacheConfig, hasher: S) -> Self {
        let rng = RandomSource::from_entropy();
        RrCache {
            inner: TS::Cell::new(RrSegment::new(config, hasher, rng)),
        }
    }

    /// Builds a cache from `config` with an explicit hasher and a
    /// caller-seeded random source. Available without `std`, and the only
    /// way to get reproducible eviction order in tests.
    pub fn from_config_seeded(config: RrCacheConfig, hasher: S, seed: u64) -> Self {
        RrCache {
            inner: TS::Cell::new(RrSegment::new(config, hasher, RandomSource::from_seed(seed))),
        }
    }

    /// Inserts or updates `key` according to `allow`.
    pub fn insert(&self, key: K, value: V, allow: Allow) -> bool {
        self.inner.with_mut(|segment| segment.insert(key, value, allow))
    }

    /// Looks up `key`. `peek` has no observable effect for this policy,
    /// since there is no recency/frequency ordering to preserve.
    pub fn find<Q>(&self, key: &Q, peek: Peek) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.with_mut(|segment| segment.find(key, peek))
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

impl<K, V, TS, S> CacheMetrics for RrCache<K, V, TS, S>
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
        "rr"
    }
}
