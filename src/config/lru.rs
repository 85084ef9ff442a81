use core::num::NonZeroUsize;

/// Construction parameters shared by [`LruCache`](crate::lru::LruCache) and
/// [`MruCache`](crate::mru::MruCache) — both are a recency list with
/// differing eviction ends, so they share one construction contract.
#[derive(Debug, Clone, Copy)]
pub struct LruCacheConfig {
    /// Maximum number of live entries.
    pub capacity: NonZeroUsize,
    /// Forwarded to the hash index at construction.
    pub max_load_factor: f32,
}

impl LruCacheConfig {
    /// Creates a config with the default load factor of `1.0`.
    pub fn new(capacity: NonZeroUsize) -> Self {
        LruCacheConfig {
            capacity,
            max_load_factor: 1.0,
        }
    }

    /// Creates a config with an explicit load factor.
    pub fn with_load_factor(capacity: NonZeroUsize, max_load_factor: f32) -> Self {
        LruCacheConfig {
            capacity,
            max_load_factor,
        }
    }
}

/// Construction parameters for [`MruCache`](crate::mru::MruCache).
pub type MruCacheConfig = LruCacheConfig;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_load_factor_to_one() {
        let config = LruCacheConfig::new(NonZeroUsize::new(2).unwrap());
        assert_eq!(config.capacity.get(), 2);
        assert_eq!(config.max_load_factor, 1.0);
    }
}
