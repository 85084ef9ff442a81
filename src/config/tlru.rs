use core::num::NonZeroUsize;

/// Construction parameters for [`TlruCache`](crate::tlru::TlruCache).
///
/// TLRU's TTL is supplied per-entry at `insert` time (§4.7), not at
/// construction, so this config only carries the capacity-layer
/// parameters.
#[derive(Debug, Clone, Copy)]
pub struct TlruCacheConfig {
    /// Maximum number of live entries.
    pub capacity: NonZeroUsize,
    /// Forwarded to the hash index at construction.
    pub max_load_factor: f32,
}

impl TlruCacheConfig {
    /// Creates a config with the default load factor of `1.0`.
    pub fn new(capacity: NonZeroUsize) -> Self {
        TlruCacheConfig {
            capacity,
            max_load_factor: 1.0,
        }
    }

    /// Creates a config with an explicit load factor.
    pub fn with_load_factor(capacity: NonZeroUsize, max_load_factor: f32) -> Self {
        TlruCacheConfig {
            capacity,
            max_load_factor,
        }
    }
}
