//! Shared engine behind the unbounded uniform-TTL containers, §4.9.
//!
//! [`UtMap`](crate::ut_map::UtMap) and [`UtSet`](crate::ut_set::UtSet) are
//! unlike every other container in this crate: they have no fixed
//! capacity, so there's no eviction policy to speak of — the only thing
//! that ever removes a live entry besides an explicit `erase` is its TTL
//! elapsing. Grounded on the original C++ source's `ut_map`
//! (`examples/original_source/inc/cappuccino/ut_map.hpp`): an ordered
//! primary index (`std::map` there, [`BTreeMap`] here — §3 calls for
//! `K: Ord` on these two containers specifically, unlike the hash-indexed
//! bounded ones) plus a uniform-TTL list that doubles as the expiry
//! ordering, pruned opportunistically at the start of every operation
//! rather than the `clean_expired` push-TLRU-and-ULRU style. A bulk prune
//! this way is worst-case O(N) if many entries expire in one call, same
//! as the original.
//!
//! `UtSet` reuses this engine as `UtSegment<K, ()>`; see `ut_set.rs`.

extern crate std;
use std::time::{Duration, Instant};

use core::borrow::Borrow;

use crate::allow::Allow;
use crate::arena::Arena;
use crate::entry::CacheEntry;
use crate::list::IndexList;
use crate::metrics::CoreCacheMetrics;

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

#[derive(Debug, Clone, Copy)]
struct UtMeta {
    expires_at: Instant,
}

pub(crate) struct UtSegment<K, V> {
    arena: Arena<CacheEntry<K, V, UtMeta>>,
    ttl_order: IndexList,
    map: BTreeMap<K, u32>,
    metrics: CoreCacheMetrics,
    uniform_ttl: Duration,
}

impl<K, V> UtSegment<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    pub(crate) fn new(uniform_ttl: Duration) -> Self {
        UtSegment {
            arena: Arena::with_capacity(0),
            ttl_order: IndexList::with_capacity(0),
            map: BTreeMap::new(),
            metrics: CoreCacheMetrics::default(),
            uniform_ttl,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    fn erase_idx(&mut self, idx: u32, key: &K) {
        self.ttl_order.unlink(idx);
        self.arena.remove(idx);
        self.map.remove(key);
    }

    /// Evicts every entry at the front of the TTL ordering whose expiry
    /// has already elapsed. Returns the number removed.
    pub(crate) fn prune(&mut self, now: Instant) -> usize {
        let mut removed = 0usize;
        while let Some(head) = self.ttl_order.head() {
            if self.arena.get(head).metadata.expires_at > now {
                break;
            }
            let key = self.arena.get(head).key.clone();
            self.erase_idx(head, &key);
            self.metrics.record_expiration();
            removed += 1;
        }
        removed
    }

    pub(crate) fn insert(&mut self, key: K, value: V, allow: Allow, now: Instant) -> bool {
        self.prune(now);
        let expires_at = now + self.uniform_ttl;

        if let Some(&idx) = self.map.get(&key) {
            if !allow.permits_update() {
                return false;
            }
            self.arena.get_mut(idx).value = value;
            self.arena.get_mut(idx).metadata.expires_at = expires_at;
            self.ttl_order.move_to_back(idx);
            return true;
        }

        if !allow.permits_insert() {
            return false;
        }

        let idx = self.arena.insert_growing(CacheEntry::new(key.clone(), value, UtMeta { expires_at }));
        self.ttl_order.ensure_capacity(idx as usize + 1);
        self.ttl_order.push_back(idx);
        self.map.insert(key, idx);
        true
    }

    pub(crate) fn find<Q>(&mut self, key: &Q, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.prune(now);
        match self.map.get(key) {
            Some(&idx) => {
                self.metrics.record_hit();
                Some(self.arena.get(idx).value.clone())
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    pub(crate) fn erase<Q>(&mut self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.prune(now);
        match self.map.remove(key) {
            Some(idx) => {
                self.ttl_order.unlink(idx);
                self.arena.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.arena = Arena::with_capacity(0);
        self.ttl_order = IndexList::with_capacity(0);
        self.map.clear();
    }

    pub(crate) fn metrics(&self) -> &CoreCacheMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_removes_only_elapsed_prefix() {
        let mut segment: UtSegment<i32, &'static str> = UtSegment::new(Duration::from_millis(1));
        let t0 = Instant::now();
        segment.insert(1, "a", Allow::InsertOrUpdate, t0);
        let t1 = t0 + Duration::from_millis(2);
        segment.insert(2, "b", Allow::InsertOrUpdate, t1);
        assert_eq!(segment.prune(t1), 1);
        assert_eq!(segment.len(), 1);
    }

    #[test]
    fn grows_without_bound() {
        let mut segment: UtSegment<i32, i32> = UtSegment::new(Duration::from_secs(60));
        let t0 = Instant::now();
        for i in 0..500 {
            segment.insert(i, i, Allow::InsertOrUpdate, t0);
        }
        assert_eq!(segment.len(), 500);
    }

    #[test]
    fn update_resets_ttl_and_moves_to_back_of_ordering() {
        let mut segment: UtSegment<i32, &'static str> = UtSegment::new(Duration::from_millis(10));
        let t0 = Instant::now();
        segment.insert(1, "a", Allow::InsertOrUpdate, t0);
        let t1 = t0 + Duration::from_millis(5);
        segment.insert(1, "a2", Allow::InsertOrUpdate, t1);
        let t2 = t0 + Duration::from_millis(11);
        // had TTL not been reset at t1, key 1 would already be gone by t2.
        assert_eq!(segment.find(&1, t2), Some("a2"));
    }
}
