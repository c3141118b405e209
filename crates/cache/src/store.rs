use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Key/value cache with per-entry expiry.
///
/// The contract is deliberately infallible: a backend that cannot reach its
/// storage logs the problem and behaves as an always-empty cache. Callers
/// therefore treat a `None` from [`CacheStore::get`] as "go to the store" and
/// never distinguish a miss from an outage.
pub trait CacheStore: Send + Sync {
    /// Fetch the raw value for `key`, if present and not expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key` for at most `ttl`.
    fn set(&self, key: &str, value: String, ttl: Duration);

    /// Drop `key` if present.
    fn delete(&self, key: &str);

    /// Drop several keys at once (template and registry invalidation).
    fn delete_many(&self, keys: &[String]) {
        for key in keys {
            self.delete(key);
        }
    }
}

impl<C> CacheStore for Arc<C>
where
    C: CacheStore + ?Sized,
{
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) {
        (**self).delete(key)
    }

    fn delete_many(&self, keys: &[String]) {
        (**self).delete_many(keys)
    }
}

/// Fetch and deserialize a cached JSON value.
///
/// An undecodable entry is treated as a miss and evicted so the next write
/// repopulates it cleanly.
pub fn get_json<T, C>(cache: &C, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    C: CacheStore + ?Sized,
{
    let raw = cache.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(key, %error, "evicting undecodable cache entry");
            cache.delete(key);
            None
        }
    }
}

/// Serialize and store a JSON value. Serialization failures are logged and
/// skipped; the entry simply stays cold.
pub fn set_json<T, C>(cache: &C, key: &str, value: &T, ttl: Duration)
where
    T: Serialize,
    C: CacheStore + ?Sized,
{
    match serde_json::to_string(value) {
        Ok(raw) => cache.set(key, raw, ttl),
        Err(error) => {
            tracing::warn!(key, %error, "skipping cache write, value not serializable");
        }
    }
}
