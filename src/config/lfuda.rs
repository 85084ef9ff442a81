use core::num::NonZeroUsize;
use core::time::Duration;

/// Construction parameters for [`LfudaCache`](crate::lfuda::LfudaCache).
#[derive(Debug, Clone, Copy)]
pub struct LfudaCacheConfig {
    /// Maximum number of live entries.
    pub capacity: NonZeroUsize,
    /// Forwarded to the hash index at construction.
    pub max_load_factor: f32,
    /// How long an entry may go untouched before the next aging pass
    /// decays its use-count.
    pub age_tick: Duration,
    /// Fraction in `(0, 1)` a use-count is multiplied by (then floored)
    /// when an entry ages.
    pub age_ratio: f32,
}

impl LfudaCacheConfig {
    /// Creates a config with the spec's defaults: a one-minute age tick and
    /// a `0.5` age ratio.
    pub fn new(capacity: NonZeroUsize) -> Self {
        LfudaCacheConfig {
            capacity,
            max_load_factor: 1.0,
            age_tick: Duration::from_secs(60),
            age_ratio: 0.5,
        }
    }

    /// Creates a config with an explicit age tick and ratio.
    ///
    /// Panics if `age_ratio` is not in `(0, 1)`.
    pub fn with_aging(capacity: NonZeroUsize, age_tick: Duration, age_ratio: f32) -> Self {
        assert!(
            age_ratio > 0.0 && age_ratio < 1.0,
            "age_ratio must be in (0, 1), got {age_ratio}"
        );
        LfudaCacheConfig {
            capacity,
            max_load_factor: 1.0,
            age_tick,
            age_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_spec_defaults() {
        let config = LfudaCacheConfig::new(NonZeroUsize::new(2).unwrap());
        assert_eq!(config.age_tick, Duration::from_secs(60));
        assert_eq!(config.age_ratio, 0.5);
    }

    #[test]
    #[should_panic(expected = "age_ratio must be in")]
    fn with_aging_rejects_bad_ratio() {
        LfudaCacheConfig::with_aging(NonZeroUsize::new(2).unwrap(), Duration::from_secs(1), 1.5);
    }
}
