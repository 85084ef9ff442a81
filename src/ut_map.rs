//! Unbounded uniform-TTL associative map (§4.9).
//!
//! No fixed capacity: the only thing that ever removes a live entry
//! besides an explicit [`erase`](UtMap::erase) is its TTL elapsing. See
//! [`crate::unbounded`] for the shared engine and its grounding.

extern crate std;
use std::time::Instant;

use core::borrow::Borrow;
use core::time::Duration;

use crate::allow::Allow;
use crate::config::UtConfig;
use crate::lock::ThreadSafety;
use crate::metrics::CacheMetrics;
use crate::unbounded::UtSegment;

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;

/// An unbounded map where every entry shares one TTL.
///
/// Requires the `std` feature, since expiry is driven by wall-clock time.
/// `K` must be [`Ord`] (the primary index is an ordered map, not a hash
/// table, unlike every bounded container in this crate — see §3).
pub struct UtMap<K, V, TS = crate::lock::ThreadSafe>
where
    TS: ThreadSafety,
{
    inner: TS::Cell<UtSegment<K, V>>,
}

impl<K, V, TS> UtMap<K, V, TS>
where
    K: Ord + Clone,
    V: Clone,
    TS: ThreadSafety,
{
    /// Builds a map from `config`.
    pub fn from_config(config: UtConfig) -> Self {
        UtMap {
            inner: TS::Cell::new(UtSegment::new(config.uniform_ttl)),
        }
    }

    /// Inserts or updates `key` according to `allow`, timestamped `now`.
    /// Opportunistically prunes every entry whose TTL has already
    /// elapsed first.
    pub fn insert_at(&self, key: K, value: V, allow: Allow, now: Instant) -> bool {
        self.inner.with_mut(|segment| segment.insert(key, value, allow, now))
    }

    /// Inserts or updates `key`, timestamped with the current instant.
    pub fn insert(&self, key: K, value: V, allow: Allow) -> bool {
        self.insert_at(key, value, allow, Instant::now())
    }

    /// Looks up `key` as of `now`, pruning expired entries first.
    pub fn find_at<Q>(&self, key: &Q, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.with_mut(|segment| segment.find(key, now))
    }

    /// Looks up `key` as of the current instant.
    pub fn find<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_at(key, Instant::now())
    }

    /// Removes `key` if present (after pruning expired entries),
    /// returning whether it was.
    pub fn erase<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.with_mut(|segment| segment.erase(key, Instant::now()))
    }

    /// Inserts or updates every `(key, value)` pair under one lock
    /// acquisition, timestamped with the current instant. Returns the
    /// number that succeeded.
    pub fn insert_range<I>(&self, pairs: I, allow: Allow) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let now = Instant::now();
        self.inner.with_mut(|segment| {
            pairs.into_iter().fold(0usize, |count, (key, value)| {
                count + usize::from(segment.insert(key, value, allow, now))
            })
        })
    }

    /// Evicts every entry whose TTL has elapsed as of the current
    /// instant. Returns the number removed.
    pub fn clean_expired_values(&self) -> usize {
        self.inner.with_mut(|segment| segment.prune(Instant::now()))
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

    /// Removes every live entry.
    pub fn clear(&self) {
        self.inner.with_mut(|segment| segment.clear());
    }
}

impl<K, V, TS> Default for UtMap<K, V, TS>
where
    K: Ord + Clone,
    V: Clone,
    TS: ThreadSafety,
{
    fn default() -> Self {
        Self::from_config(UtConfig::default())
    }
}

impl<K, V, TS> CacheMetrics for UtMap<K, V, TS>
where
    K: Ord + Clone,
    V: Clone,
    TS: ThreadSafety,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.inner.with_mut(|segment| segment.metrics().as_map())
    }

    fn algorithm_name(&self) -> &'static str {
        "ut_map"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::NotThreadSafe;

    fn map(ttl: Duration) -> UtMap<i32, &'static str, NotThreadSafe> {
        UtMap::from_config(UtConfig::with_ttl(ttl))
    }

    #[test]
    fn grows_past_any_fixed_size() {
        let map = map(Duration::from_secs(60));
        let t0 = Instant::now();
        for i in 0..1000 {
            map.insert_at(i, "x", Allow::InsertOrUpdate, t0);
        }
        assert_eq!(map.len(), 1000);
    }

    #[test]
    fn entries_expire_after_uniform_ttl() {
        let map = map(Duration::from_millis(1));
        let t0 = Instant::now();
        map.insert_at(1, "a", Allow::InsertOrUpdate, t0);
        let t1 = t0 + Duration::from_millis(2);
        assert_eq!(map.find_at(&1, t1), None);
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn update_refreshes_ttl() {
        let map = map(Duration::from_millis(10));
        let t0 = Instant::now();
        map.insert_at(1, "a", Allow::InsertOrUpdate, t0);
        let t1 = t0 + Duration::from_millis(5);
        map.insert_at(1, "a2", Allow::InsertOrUpdate, t1);
        let t2 = t0 + Duration::from_millis(11);
        assert_eq!(map.find_at(&1, t2), Some("a2"));
    }

    #[test]
    fn erase_removes_entry() {
        let map = map(Duration::from_secs(60));
        map.insert(1, "a", Allow::InsertOrUpdate);
        assert!(map.erase(&1));
        assert_eq!(map.find(&1), None);
    }

    #[test]
    fn clean_expired_values_reports_count() {
        let map = map(Duration::from_millis(1));
        let t0 = Instant::now();
        map.insert_at(1, "a", Allow::InsertOrUpdate, t0);
        map.insert_at(2, "b", Allow::InsertOrUpdate, t0);
        let t1 = t0 + Duration::from_millis(2);
        assert_eq!(map.clean_expired_values(), 0); // prunes as of "now", not t1
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn clear_empties_the_map() {
        let map = map(Duration::from_secs(60));
        map.insert(1, "a", Allow::InsertOrUpdate);
        map.clear();
        assert!(map.is_empty());
    }
}
