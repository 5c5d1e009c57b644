//! Content cache configuration.

use std::time::Duration;

const DEFAULT_TTL_MS: u64 = 1000;

/// Settings for the short-lived read cache in front of the site content slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Enable the read cache. When off every load hits the store.
    pub enabled: bool,
    /// How long a loaded record stays fresh.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_millis(DEFAULT_TTL_MS),
        }
    }
}

impl From<&crate::config::StorageSettings> for CacheConfig {
    fn from(settings: &crate::config::StorageSettings) -> Self {
        Self {
            enabled: !settings.cache_ttl.is_zero(),
            ttl: settings.cache_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl, Duration::from_secs(1));
    }
}
