use core::num::NonZeroUsize;

/// Construction parameters for [`LfuCache`](crate::lfu::LfuCache).
#[derive(Debug, Clone, Copy)]
pub struct LfuCacheConfig {
    /// Maximum number of live entries.
    pub capacity: NonZeroUsize,
    /// Forwarded to the hash index at construction.
    pub max_load_factor: f32,
}

impl LfuCacheConfig {
    /// Creates a config with the default load factor of `1.0`.
    pub fn new(capacity: NonZeroUsize) -> Self {
        LfuCacheConfig {
            capacity,
            max_load_factor: 1.0,
        }
    }

    /// Creates a config with an explicit load factor.
    pub fn with_load_factor(capacity: NonZeroUsize, max_load_factor: f32) -> Self {
        LfuCacheConfig {
            capacity,
            max_load_factor,
        }
    }
}
