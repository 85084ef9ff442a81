use core::time::Duration;

/// Construction parameters shared by [`UtMap`](crate::ut_map::UtMap) and
/// [`UtSet`](crate::ut_set::UtSet), per §6: unbounded containers take only
/// a uniform TTL.
#[derive(Debug, Clone, Copy)]
pub struct UtConfig {
    /// The uniform TTL applied to every insert/update.
    pub uniform_ttl: Duration,
}

impl UtConfig {
    /// The spec's default uniform TTL of 100 ms.
    pub fn new() -> Self {
        UtConfig {
            uniform_ttl: Duration::from_millis(100),
        }
    }

    /// Creates a config with an explicit uniform TTL.
    pub fn with_ttl(uniform_ttl: Duration) -> Self {
        UtConfig { uniform_ttl }
    }
}

impl Default for UtConfig {
    fn default() -> Self {
        UtConfig::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttl_is_100ms() {
        assert_eq!(UtConfig::default().uniform_ttl, Duration::from_millis(100));
    }
}
