//! `vergeerp-infra` — store, cache and bus backends.
//!
//! In-memory implementations back dev and test runs; Postgres implementations
//! (via `sqlx`) back production. The `redis` cargo feature adds the Redis
//! cache and the Redis Streams event bus for multi-instance deployments.

pub mod stores;
pub mod workers;

#[cfg(feature = "redis")]
pub mod redis_backend;


pub use stores::in_memory::{
    InMemoryAssignmentStore, InMemoryModuleRegistry, InMemoryOrganizationDirectory,
    InMemoryTemplateStore,
};
pub use stores::postgres::{
    PostgresAssignmentStore, PostgresModuleRegistry, PostgresOrganizationDirectory,
    PostgresTemplateStore,
};
pub use workers::{InvalidationWorker, WorkerHandle};

#[cfg(feature = "redis")]
pub use redis_backend::{RedisCache, RedisStreamsEventBus};
