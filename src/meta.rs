//! Algorithm-specific metadata types.
//!
//! Each policy that needs per-entry bookkeeping beyond the key and value
//! defines its own small metadata struct here, stored as the `M` parameter
//! of [`CacheEntry`](crate::entry::CacheEntry). Grounded on the grounding
//! codebase's own `meta.rs`, whose `LfuMeta`/`LfudaMeta` this module keeps
//! the shape of for LFU; LFUDA's metadata is new, since this crate's
//! dynamic-aging model answers a different question than the grounding
//! codebase's global-age-counter one (see SPEC_FULL.md §10.7 and
//! DESIGN.md). `bucket_pos` on `LfuMeta`/`LfudaMeta`/`TtlMeta` is this
//! crate's own addition: it is the entry's position within its current
//! ordered-multimap bucket (§3's "frequency multi-index"/"TTL ordering"),
//! letting `lfu.rs`/`lfuda.rs`/`tlru.rs` remove an arbitrary entry from its
//! bucket in O(1) via swap-remove instead of a linear scan.

/// Use-count bookkeeping for LFU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct LfuMeta {
    pub(crate) use_count: u64,
    pub(crate) bucket_pos: u32,
}

impl LfuMeta {
    pub(crate) fn new() -> Self {
        LfuMeta {
            use_count: 1,
            bucket_pos: 0,
        }
    }
}

pub(crate) mod timed {
    //! Metadata for the TTL- and dynamic-age-aware policies. Split into its
    //! own submodule since it pulls in `std::time::Instant` directly
    //! (wall-clock access requires an allocator-and-OS-having environment,
    //! same precedent as the grounding codebase's own
    //! `CacheEntry::now_nanos`) regardless of the `std` Cargo feature, which
    //! only selects the hash-map backend and the RNG entropy source.

    extern crate std;
    use std::time::Instant;

    /// Use-count plus a "last touched" instant, for LFUDA's dynamic-age
    /// ordering, plus the entry's position within its frequency bucket.
    #[derive(Debug, Clone, Copy)]
    pub(crate) struct LfudaMeta {
        pub(crate) use_count: u64,
        pub(crate) bucket_pos: u32,
        pub(crate) last_touch: Instant,
    }

    impl LfudaMeta {
        pub(crate) fn new(now: Instant) -> Self {
            LfudaMeta {
                use_count: 1,
                bucket_pos: 0,
                last_touch: now,
            }
        }
    }

    /// An absolute expiry instant, for the per-entry TTL of TLRU, plus the
    /// entry's position within its expiry bucket.
    #[derive(Debug, Clone, Copy)]
    pub(crate) struct TtlMeta {
        pub(crate) expires_at: Instant,
        pub(crate) bucket_pos: u32,
    }

    impl TtlMeta {
        pub(crate) fn new(expires_at: Instant) -> Self {
            TtlMeta {
                expires_at,
                bucket_pos: 0,
            }
        }

        pub(crate) fn is_expired(&self, now: Instant) -> bool {
            self.expires_at <= now
        }
    }
}
