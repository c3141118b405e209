//! Event-driven cache invalidation.
//!
//! The producer already invalidated these keys synchronously; the consumer
//! does it again. The redundancy is deliberate: it repairs the cache when
//! the producer-side invalidation was skipped by a transient cache error,
//! and it keeps working for events published by other service instances.

use std::sync::Arc;

use tracing::debug;

use vergeerp_cache::{CacheStore, keys};
use vergeerp_events::{EventKind, ModuleEvent};

/// Consumes entitlement events and re-invalidates the affected cache keys.
#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Arc<dyn CacheStore>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Idempotent: handling the same event twice deletes the same keys twice.
    pub fn handle(&self, event: &ModuleEvent) {
        match event.kind {
            EventKind::ModuleRegistered
            | EventKind::ModuleUpdated
            | EventKind::ModuleActivated
            | EventKind::ModuleDeactivated => {
                self.cache.delete_many(&keys::registry_keys());
            }
            EventKind::ModuleAssigned
            | EventKind::ModuleUnassigned
            | EventKind::ModulesBulkAssigned
            | EventKind::ModuleConfigUpdated
            | EventKind::TemplateApplied => {
                self.cache.delete(&keys::org_modules(&event.organization_id));
            }
        }
        debug!(
            topic = event.topic(),
            organization_id = %event.organization_id,
            "cache re-invalidated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use vergeerp_cache::InMemoryCache;
    use vergeerp_core::OrganizationId;

    fn warm(cache: &InMemoryCache, key: &str) {
        cache.set(key, "[]".to_string(), Duration::from_secs(60));
    }

    #[test]
    fn tenant_events_drop_only_that_organizations_key() {
        let cache = Arc::new(InMemoryCache::new());
        let org = OrganizationId::new();
        let other = OrganizationId::new();
        warm(&cache, &keys::org_modules(&org));
        warm(&cache, &keys::org_modules(&other));

        let invalidator = CacheInvalidator::new(cache.clone());
        invalidator.handle(&ModuleEvent::new(
            EventKind::ModuleAssigned,
            org,
            None,
            json!({"module_id": "crm"}),
            chrono::Utc::now(),
        ));

        assert_eq!(cache.get(&keys::org_modules(&org)), None);
        assert!(cache.get(&keys::org_modules(&other)).is_some());
    }

    #[test]
    fn registry_events_drop_both_registry_listings() {
        let cache = Arc::new(InMemoryCache::new());
        warm(&cache, &keys::registry_all(false));
        warm(&cache, &keys::registry_all(true));

        let invalidator = CacheInvalidator::new(cache.clone());
        invalidator.handle(&ModuleEvent::system(
            EventKind::ModuleDeactivated,
            None,
            json!({"module_id": "legacy"}),
            chrono::Utc::now(),
        ));

        assert_eq!(cache.get(&keys::registry_all(false)), None);
        assert_eq!(cache.get(&keys::registry_all(true)), None);
    }
}
