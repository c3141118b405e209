//! Redis-backed cache and event bus (enabled by the `redis` cargo feature).

pub mod cache;
pub mod streams;

pub use cache::RedisCache;
pub use streams::RedisStreamsEventBus;
