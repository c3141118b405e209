//! `vergeerp-cache` — read-through cache in front of the entitlement stores.
//!
//! The cache is an optimization, never a source of truth. Backends swallow
//! their own failures: a broken cache degrades reads to store lookups and is
//! logged, but never surfaces an error to callers.

pub mod in_memory;
pub mod keys;
pub mod noop;
pub mod store;

pub use in_memory::InMemoryCache;
pub use noop::NoopCache;
pub use store::{CacheStore, get_json, set_json};
