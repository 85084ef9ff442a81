//! Shared recency-list engine backing [`LruCache`](crate::lru::LruCache)
//! and [`MruCache`](crate::mru::MruCache).
//!
//! §4.2/§4.3 of SPEC_FULL.md describe MRU as "symmetric to LRU": the same
//! recency list (head = most-recently-touched, tail = least), the same
//! head-splice on every touch, differing only in which end capacity
//! pressure evicts from. Rather than hand-copying the LRU engine into a
//! second file with one line changed — the trap the grounding codebase's
//! own `lru.rs`/`slru.rs` split avoids by *not* sharing code even where the
//! algorithms overlap — this module parameterizes the eviction end with a
//! sealed marker trait and lets `lru.rs`/`mru.rs` each be a thin, honestly
//! distinct public type over it.

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
use core::marker::PhantomData;

use crate::allow::Allow;
use crate::entry::CacheEntry;
use crate::list::IndexList;
use crate::lock::ThreadSafety;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use crate::peek::Peek;

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

mod sealed {
    pub trait Sealed {}
}

/// Selects which end of the recency list capacity pressure evicts from.
pub(crate) trait EvictionEnd: sealed::Sealed {
    fn evict(order: &mut IndexList) -> Option<u32>;
    const NAME: &'static str;
}

/// Evicts the tail (least-recently-touched): LRU.
pub(crate) struct EvictTail;
/// Evicts the head (most-recently-touched): MRU.
pub(crate) struct EvictHead;

impl sealed::Sealed for EvictTail {}
impl sealed::Sealed for EvictHead {}

impl EvictionEnd for EvictTail {
    fn evict(order: &mut IndexList) -> Option<u32> {
        order.pop_back()
    }
    const NAME: &'static str = "lru";
}

impl EvictionEnd for EvictHead {
    fn evict(order: &mut IndexList) -> Option<u32> {
        order.pop_front()
    }
    const NAME: &'static str = "mru";
}

pub(crate) struct RecencySegment<K, V, E, S = DefaultHashBuilder> {
    arena: Vec<Option<CacheEntry<K, V>>>,
    free: Vec<u32>,
    order: IndexList,
    map: HashMap<K, u32, S>,
    metrics: CoreCacheMetrics,
    _end: PhantomData<E>,
}

impl<K, V, E, S> RecencySegment<K, V, E, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    E: EvictionEnd,
    S: BuildHasher + Default,
{
    pub(crate) fn new(capacity: usize, hasher: S) -> Self {
        let mut arena = Vec::with_capacity(capacity);
        arena.resize_with(capacity, || None);
        let free = (0..capacity as u32).rev().collect();
        let mut map = HashMap::with_capacity_and_hasher(capacity, hasher);
        map.reserve(capacity);
        RecencySegment {
            arena,
            free,
            order: IndexList::with_capacity(capacity),
            map,
            metrics: CoreCacheMetrics::default(),
            _end: PhantomData,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    fn evict_one(&mut self) {
        if let Some(victim) = E::evict(&mut self.order) {
            let entry = self.arena[victim as usize].take().expect("live slot");
            self.map.remove(&entry.key);
            self.free.push(victim);
            self.metrics.record_eviction();
        }
    }

    pub(crate) fn insert(&mut self, key: K, value: V, allow: Allow) -> bool {
        if let Some(&idx) = self.map.get(&key) {
            if !allow.permits_update() {
                return false;
            }
            self.arena[idx as usize].as_mut().expect("live slot").value = value;
            self.order.move_to_front(idx);
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
        self.order.push_front(idx);
        true
    }

    pub(crate) fn find<Q>(&mut self, key: &Q, peek: Peek) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key) {
            Some(&idx) => {
                if !peek.is_peeking() {
                    self.order.move_to_front(idx);
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

    pub(crate) fn erase<Q>(&mut self, key: &Q) -> bool
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

    pub(crate) fn clear(&mut self) {
        for slot in &mut self.arena {
            *slot = None;
        }
        self.free = (0..self.arena.len() as u32).rev().collect();
        self.order = IndexList::with_capacity(self.arena.len());
        self.map.clear();
    }

    pub(crate) fn metrics(&self) -> BTreeMap<String, f64> {
        self.metrics.as_map()
    }
}

/// A fixed-capacity recency-ordered cache; see [`lru`](crate::lru) and
/// [`mru`](crate::mru) for the two eviction-end specializations.
pub struct RecencyCache<K, V, E, TS, S = DefaultHashBuilder>
where
    TS: ThreadSafety,
{
    inner: TS::Cell<RecencySegment<K, V, E, S>>,
}

impl<K, V, E, TS, S> RecencyCache<K, V, E, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    E: EvictionEnd,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    pub(crate) fn from_parts(capacity: usize, hasher: S) -> Self {
        RecencyCache {
            inner: TS::Cell::new(RecencySegment::new(capacity, hasher)),
        }
    }

    /// Inserts or updates `key` according to `allow`.
    pub fn insert(&self, key: K, value: V, allow: Allow) -> bool {
        self.inner.with_mut(|segment| segment.insert(key, value, allow))
    }

    /// Looks up `key`. Unless `peek` is [`Peek::Yes`], splices the touched
    /// slot to the "recently used" end of the list.
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

impl<K, V, E, TS, S> CacheMetrics for RecencyCache<K, V, E, TS, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    E: EvictionEnd,
    TS: ThreadSafety,
    S: BuildHasher + Default,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.inner.with_mut(|segment| segment.metrics())
    }

    fn algorithm_name(&self) -> &'static str {
        E::NAME
    }
}
