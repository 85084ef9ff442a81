//! Unbounded uniform-TTL set (§4.9).
//!
//! Reuses the [`crate::unbounded`] engine with `V = ()`, the same way the
//! original C++ source layers `ut_set` over the same node type as
//! `ut_map`. There's no separate segment type here — `UtSet` is just
//! `UtSegment<K, ()>` with a membership-shaped API instead of a
//! key/value one.

extern crate std;
use std::time::Instant;

use core::borrow::Borrow;

use crate::allow::Allow;
use crate::config::UtConfig;
use crate::lock::ThreadSafety;
use crate::metrics::CacheMetrics;
use crate::unbounded::UtSegment;

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;

/// An unbounded set where every member shares one TTL.
///
/// Requires the `std` feature. `K` must be [`Ord`], same as [`UtMap`](crate::ut_map::UtMap).
pub struct UtSet<K, TS = crate::lock::ThreadSafe>
where
    TS: ThreadSafety,
{
    inner: TS::Cell<UtSegment<K, ()>>,
}

impl<K, TS> UtSet<K, TS>
where
    K: Ord + Clone,
    TS: ThreadSafety,
{
    /// Builds a set from `config`.
    pub fn from_config(config: UtConfig) -> Self {
        UtSet {
            inner: TS::Cell::new(UtSegment::new(config.uniform_ttl)),
        }
    }

    /// Inserts `key` timestamped `now`, refreshing its TTL if already a
    /// member. Returns whether `key` was a new member.
    pub fn insert_at(&self, key: K, now: Instant) -> bool {
        self.inner.with_mut(|segment| segment.insert(key, (), Allow::InsertOrUpdate, now))
    }

    /// Inserts `key`, timestamped with the current instant.
    pub fn insert(&self, key: K) -> bool {
        self.insert_at(key, Instant::now())
    }

    /// Reports membership of `key` as of `now`, pruning expired entries
    /// first. Does not refresh `key`'s TTL.
    pub fn contains_at<Q>(&self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.with_mut(|segment| segment.find(key, now).is_some())
    }

    /// Reports membership of `key` as of the current instant.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.contains_at(key, Instant::now())
    }

    /// Removes `key` if present (after pruning expired entries),
    /// returning whether it was a member.
    pub fn erase<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.with_mut(|segment| segment.erase(key, Instant::now()))
    }

    /// Inserts every key in `keys` under one lock acquisition. Returns
    /// the number that were new members.
    pub fn insert_range<I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        let now = Instant::now();
        self.inner.with_mut(|segment| {
            keys.into_iter().fold(0usize, |count, key| {
                count + usize::from(segment.insert(key, (), Allow::InsertOrUpdate, now))
            })
        })
    }

    /// Evicts every member whose TTL has elapsed as of the current
    /// instant. Returns the number removed.
    pub fn clean_expired_values(&self) -> usize {
        self.inner.with_mut(|segment| segment.prune(Instant::now()))
    }

    /// Current number of live members.
    pub fn len(&self) -> usize {
        self.inner.with_mut(|segment| segment.len())
    }

    /// `true` if there are no live members.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every live member.
    pub fn clear(&self) {
        self.inner.with_mut(|segment| segment.clear());
    }
}

impl<K, TS> Default for UtSet<K, TS>
where
    K: Ord + Clone,
    TS: ThreadSafety,
{
    fn default() -> Self {
        Self::from_config(UtConfig::default())
    }
}

impl<K, TS> CacheMetrics for UtSet<K, TS>
where
    K: Ord + Clone,
    TS: ThreadSafety,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.inner.with_mut(|segment| segment.metrics().as_map())
    }

    fn algorithm_name(&self) -> &'static str {
        "ut_set"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::NotThreadSafe;
    use core::time::Duration;

    fn set(ttl: Duration) -> UtSet<i32, NotThreadSafe> {
        UtSet::from_config(UtConfig::with_ttl(ttl))
    }

    #[test]
    fn insert_reports_whether_key_is_new() {
        let set = set(Duration::from_secs(60));
        assert!(set.insert(1));
        assert!(!set.insert(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn members_expire_after_uniform_ttl() {
        let set = set(Duration::from_millis(1));
        let t0 = Instant::now();
        set.insert_at(1, t0);
        let t1 = t0 + Duration::from_millis(2);
        assert!(!set.contains_at(&1, t1));
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn reinsert_refreshes_ttl() {
        let set = set(Duration::from_millis(10));
        let t0 = Instant::now();
        set.insert_at(1, t0);
        let t1 = t0 + Duration::from_millis(5);
        set.insert_at(1, t1);
        let t2 = t0 + Duration::from_millis(11);
        assert!(set.contains_at(&1, t2));
    }

    #[test]
    fn erase_removes_member() {
        let set = set(Duration::from_secs(60));
        set.insert(1);
        assert!(set.erase(&1));
        assert!(!set.contains(&1));
    }

    #[test]
    fn insert_range_reports_count_of_new_members() {
        let set = set(Duration::from_secs(60));
        let inserted = set.insert_range([1, 2, 1]);
        assert_eq!(inserted, 2);
    }

    #[test]
    fn clear_empties_the_set() {
        let set = set(Duration::from_secs(60));
        set.insert(1);
        set.clear();
        assert!(set.is_empty());
    }
}
