//! Short-lived read cache for the site content record.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use metrics::counter;
use tracing::debug;

use crate::domain::site::SiteContent;
use crate::util::clock::Clock;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

struct CachedRecord {
    record: SiteContent,
    stored_at: Instant,
}

/// Owned cache in front of the persisted site content.
///
/// Readers that ask for content within the TTL share one deserialized record.
/// Anything that writes or learns of an external write must call
/// [`ContentCache::invalidate`].
pub struct ContentCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    entry: RwLock<Option<CachedRecord>>,
}

impl ContentCache {
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            entry: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The cached record, if one was stored less than a TTL ago.
    pub fn get(&self) -> Option<SiteContent> {
        if !self.config.enabled {
            return None;
        }

        let now = self.clock.now();
        let guard = rw_read(&self.entry, SOURCE, "get");
        match guard.as_ref() {
            Some(cached) if now.duration_since(cached.stored_at) < self.config.ttl => {
                counter!("vitrine_content_cache_hit_total").increment(1);
                Some(cached.record.clone())
            }
            _ => {
                counter!("vitrine_content_cache_miss_total").increment(1);
                None
            }
        }
    }

    pub fn put(&self, record: SiteContent) {
        if !self.config.enabled {
            return;
        }
        let stored_at = self.clock.now();
        *rw_write(&self.entry, SOURCE, "put") = Some(CachedRecord { record, stored_at });
    }

    pub fn invalidate(&self) {
        if rw_write(&self.entry, SOURCE, "invalidate").take().is_some() {
            debug!("Content cache invalidated");
        }
    }

    pub fn is_empty(&self) -> bool {
        rw_read(&self.entry, SOURCE, "is_empty").is_none()
    }
}
