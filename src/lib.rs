#![no_std]
//! Nine fixed- and unbounded-capacity cache container variants, each
//! implementing one eviction/expiry policy behind a common shape:
//! `insert`/`find`/`erase` plus a [`metrics::CacheMetrics`] view.
//!
//! | Container | Policy | Module |
//! |---|---|---|
//! | [`fifo::FifoCache`] | First-in-first-out | [`fifo`] |
//! | [`lru::LruCache`] | Least recently used | [`lru`] |
//! | [`mru::MruCache`] | Most recently used | [`mru`] |
//! | [`rr::RrCache`] | Uniform random replacement | [`rr`] |
//! | [`lfu::LfuCache`] | Least frequently used | [`lfu`] |
//! | [`lfuda::LfudaCache`] | LFU with dynamic aging | [`lfuda`] |
//! | [`tlru::TlruCache`] | Per-entry TTL, LRU tiebreak | [`tlru`] |
//! | [`ulru::UlruCache`] | Uniform TTL, LRU tiebreak | [`ulru`] |
//! | [`ut_map::UtMap`] | Unbounded, uniform TTL, map | [`ut_map`] |
//! | [`ut_set::UtSet`] | Unbounded, uniform TTL, set | [`ut_set`] |
//!
//! Every container is generic over a [`lock::ThreadSafety`] policy
//! (defaulting to [`lock::ThreadSafe`]) selecting whether its internal
//! state sits behind a real lock or a plain `RefCell`, and — except for
//! the two unbounded containers, whose primary index is ordered rather
//! than hashed — over a hash builder `S` for the underlying table.
//!
//! `insert` calls take an [`allow::Allow`] mode narrowing whether they may
//! create a new entry, update an existing one, or both. `find` calls on
//! the recency/frequency-tracking variants take a [`peek::Peek`] mode to
//! suppress the ordering update a normal access would otherwise perform.
//!
//! See `DESIGN.md` in the repository root for the grounding behind each
//! module's construction.

#[cfg(test)]
extern crate scoped_threadpool;

/// Unified cache entry type shared by every engine.
pub(crate) mod entry;

/// Algorithm-specific per-entry metadata types.
pub(crate) mod meta;

/// Slot-reusing, index-addressed storage shared by every engine.
pub(crate) mod arena;

/// Doubly linked list over arena indices, used for recency/expiry
/// orderings.
pub(crate) mod list;

/// A compact, non-cryptographic random source for [`rr`].
pub(crate) mod rng;

/// Compile-time thread-safety policy selecting each container's internal
/// cell type.
pub mod lock;

/// Insertion policy for `insert`-family operations.
pub mod allow;

/// Peek behavior for `find`-family operations.
pub mod peek;

/// Cache configuration structures, one type per container variant.
pub mod config;

/// Cache observability counters.
pub mod metrics;

/// First-in-first-out cache.
pub mod fifo;

/// Shared recency-list engine backing [`lru`] and [`mru`].
pub(crate) mod recency;

/// Least recently used cache.
pub mod lru;

/// Most recently used cache.
pub mod mru;

/// Uniform random replacement cache.
pub mod rr;

/// Least frequently used cache.
pub mod lfu;

/// Least frequently used cache with dynamic aging.
pub mod lfuda;

/// Per-entry TTL cache with an LRU tiebreak.
pub mod tlru;

/// Uniform-TTL cache with an LRU tiebreak.
pub mod ulru;

/// Shared engine behind the unbounded uniform-TTL containers.
pub(crate) mod unbounded;

/// Unbounded uniform-TTL associative map.
pub mod ut_map;

/// Unbounded uniform-TTL set.
pub mod ut_set;

pub use allow::Allow;
pub use fifo::FifoCache;
pub use lfu::LfuCache;
pub use lfuda::LfudaCache;
pub use lru::LruCache;
pub use mru::MruCache;
pub use peek::Peek;
pub use rr::RrCache;
pub use tlru::TlruCache;
pub use ulru::UlruCache;
pub use ut_map::UtMap;
pub use ut_set::UtSet;

pub use metrics::CacheMetrics;
