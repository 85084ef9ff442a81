use core::num::NonZeroUsize;
use core::time::Duration;

/// Construction parameters for [`UlruCache`](crate::ulru::UlruCache).
#[derive(Debug, Clone, Copy)]
pub struct UlruCacheConfig {
    /// The uniform TTL applied to every insert/update.
    pub ttl: Duration,
    /// Maximum number of live entries.
    pub capacity: NonZeroUsize,
    /// Forwarded to the hash index at construction.
    pub max_load_factor: f32,
}

impl UlruCacheConfig {
    /// Creates a config with the default load factor of `1.0`.
    pub fn new(ttl: Duration, capacity: NonZeroUsize) -> Self {
        UlruCacheConfig {
            ttl,
            capacity,
            max_load_factor: 1.0,
        }
    }

    /// Creates a config with an explicit load factor.
    pub fn with_load_factor(ttl: Duration, capacity: NonZeroUsize, max_load_factor: f32) -> Self {
        UlruCacheConfig {
            ttl,
            capacity,
            max_load_factor,
        }
    }
}
