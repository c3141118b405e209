use std::sync::Arc;

use vergeerp_cache::InMemoryCache;
#[cfg(feature = "redis")]
use vergeerp_cache::NoopCache;
use vergeerp_entitlements::{CacheInvalidator, EntitlementService};
use vergeerp_events::{InMemoryEventBus, ModuleEvent};
use vergeerp_infra::{
    InMemoryAssignmentStore, InMemoryModuleRegistry, InMemoryOrganizationDirectory,
    InMemoryTemplateStore, InvalidationWorker, WorkerHandle,
};

#[cfg(feature = "redis")]
use vergeerp_infra::{
    PostgresAssignmentStore, PostgresModuleRegistry, PostgresOrganizationDirectory,
    PostgresTemplateStore, RedisCache, RedisStreamsEventBus,
};
#[cfg(feature = "redis")]
use sqlx::PgPool;

/// Everything the handlers need, fully wired.
///
/// The entitlement service is already type-erased over its backends, so one
/// struct covers both the in-memory and the persistent wiring. The worker
/// handle is held so the invalidation thread lives as long as the process.
pub struct AppServices {
    pub entitlements: EntitlementService,
    _invalidation: WorkerHandle,
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        #[cfg(feature = "redis")]
        {
            return build_persistent_services().await;
        }
        #[cfg(not(feature = "redis"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but redis feature not enabled, falling back to in-memory"
            );
            return build_in_memory_services();
        }
    }

    build_in_memory_services()
}

fn build_in_memory_services() -> AppServices {
    // In-memory wiring (dev/test): stores + cache + bus in-process.
    let registry = Arc::new(InMemoryModuleRegistry::new());
    let templates = Arc::new(InMemoryTemplateStore::new());
    let assignments = Arc::new(InMemoryAssignmentStore::new());
    let organizations = Arc::new(InMemoryOrganizationDirectory::new());
    let cache = Arc::new(InMemoryCache::new());
    let bus: Arc<InMemoryEventBus<ModuleEvent>> = Arc::new(InMemoryEventBus::new());

    let invalidation = InvalidationWorker::spawn(
        "cache-invalidation",
        bus.as_ref(),
        CacheInvalidator::new(cache.clone()),
    );

    let entitlements = EntitlementService::new(
        registry,
        templates,
        assignments,
        organizations,
        cache,
        bus,
    );

    AppServices {
        entitlements,
        _invalidation: invalidation,
    }
}

#[cfg(feature = "redis")]
async fn build_persistent_services() -> AppServices {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to Postgres");

    let registry = Arc::new(PostgresModuleRegistry::new(pool.clone()));
    let templates = Arc::new(PostgresTemplateStore::new(pool.clone()));
    let assignments = Arc::new(PostgresAssignmentStore::new(pool.clone()));
    let organizations = Arc::new(PostgresOrganizationDirectory::new(pool));

    // A broken cache degrades to direct store reads, never to a dead API.
    let cache: Arc<dyn vergeerp_cache::CacheStore> = match RedisCache::new(&redis_url) {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            tracing::warn!(error = %e, "redis cache unavailable, running uncached");
            Arc::new(NoopCache)
        }
    };

    let bus = Arc::new(
        RedisStreamsEventBus::new(&redis_url, None)
            .expect("Failed to create Redis Streams event bus"),
    );
    bus.ensure_consumer_group("cache.invalidation")
        .expect("Failed to create consumer group");

    // All API instances share one consumer group, so each event is handled
    // once cluster-wide.
    let sub = bus.subscribe_with_group(
        "cache.invalidation",
        &format!("consumer-{}", uuid::Uuid::now_v7()),
    );
    let invalidation =
        InvalidationWorker::spawn_on("cache-invalidation", sub, CacheInvalidator::new(cache.clone()));

    let entitlements = EntitlementService::new(
        registry,
        templates,
        assignments,
        organizations,
        cache,
        bus,
    );

    AppServices {
        entitlements,
        _invalidation: invalidation,
    }
}
