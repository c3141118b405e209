//! Redis-backed cache store.
//!
//! Failures never surface to callers: a cache miss is the worst outcome of a
//! Redis outage, and the store read behind the cache still answers. Every
//! failed command is logged at `warn`.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use vergeerp_cache::CacheStore;

#[derive(Debug, Clone)]
pub struct RedisCache {
    client: Arc<redis::Client>,
}

impl RedisCache {
    /// Connect lazily to the given Redis URL (e.g. "redis://localhost:6379").
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url.as_ref())?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    fn connection(&self, operation: &str) -> Option<redis::Connection> {
        match self.client.get_connection() {
            Ok(conn) => Some(conn),
            Err(e) => {
                warn!(operation, error = %e, "redis cache unavailable");
                None
            }
        }
    }
}

impl CacheStore for RedisCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.connection("get")?;
        match redis::cmd("GET").arg(key).query::<Option<String>>(&mut conn) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "redis GET failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        let Some(mut conn) = self.connection("set") else {
            return;
        };
        // SETEX takes whole seconds; sub-second TTLs round up to 1s.
        let seconds = ttl.as_secs().max(1);
        if let Err(e) = redis::cmd("SETEX")
            .arg(key)
            .arg(seconds)
            .arg(&value)
            .query::<()>(&mut conn)
        {
            warn!(key, error = %e, "redis SETEX failed");
        }
    }

    fn delete(&self, key: &str) {
        let Some(mut conn) = self.connection("delete") else {
            return;
        };
        if let Err(e) = redis::cmd("DEL").arg(key).query::<u64>(&mut conn) {
            warn!(key, error = %e, "redis DEL failed");
        }
    }

    fn delete_many(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let Some(mut conn) = self.connection("delete_many") else {
            return;
        };
        if let Err(e) = redis::cmd("DEL").arg(keys).query::<u64>(&mut conn) {
            warn!(error = %e, "redis DEL failed");
        }
    }
}
