use std::time::Duration;

use crate::store::CacheStore;

/// Always-empty cache. Used when caching is disabled by configuration and as
/// the fallback when a real backend cannot be constructed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl CacheStore for NoopCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: String, _ttl: Duration) {}

    fn delete(&self, _key: &str) {}
}
