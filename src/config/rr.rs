use core::num::NonZeroUsize;

/// Construction parameters for [`RrCache`](crate::rr::RrCache).
#[derive(Debug, Clone, Copy)]
pub struct RrCacheConfig {
    /// Maximum number of live entries.
    pub capacity: NonZeroUsize,
    /// Forwarded to the hash index at construction.
    pub max_load_factor: f32,
}

impl RrCacheConfig {
    /// Creates a config with the default load factor of `1.0`.
    pub fn new(capacity: NonZeroUsize) -> Self {
        RrCacheConfig {
            capacity,
            max_load_factor: 1.0,
        }
    }

    /// Creates a config with an explicit load factor.
    pub fn with_load_factor(capacity: NonZeroUsize, max_load_factor: f32) -> Self {
        RrCacheConfig {
            capacity,
            max_load_factor,
        }
    }
}
