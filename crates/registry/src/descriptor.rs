use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vergeerp_core::{ConfigMap, ModuleId};

/// Registry entry describing one installable module.
///
/// `module_id` is immutable once created. `is_active = false` is a soft
/// delete: the descriptor stays visible to historical reads but is rejected
/// by every new assignment or template link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub module_id: ModuleId,
    pub name: String,
    pub description: String,
    pub category: String,

    /// Routing metadata for the module's backing service.
    pub service_name: String,
    pub api_endpoint: String,
    pub version: String,

    /// Open key/value metadata (icon, color, ...). Opaque to the engine.
    pub metadata: ConfigMap,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModuleDescriptor {
    /// Create a fresh, active descriptor with both timestamps set to `now`.
    pub fn new(
        module_id: ModuleId,
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        service_name: impl Into<String>,
        api_endpoint: impl Into<String>,
        version: impl Into<String>,
        metadata: ConfigMap,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            module_id,
            name: name.into(),
            description: description.into(),
            category: category.into(),
            service_name: service_name.into(),
            api_endpoint: api_endpoint.into(),
            version: version.into(),
            metadata,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge only the fields present in `update`; bumps `updated_at`.
    pub fn apply_update(&mut self, update: &ModuleUpdate, now: DateTime<Utc>) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(category) = &update.category {
            self.category = category.clone();
        }
        if let Some(service_name) = &update.service_name {
            self.service_name = service_name.clone();
        }
        if let Some(api_endpoint) = &update.api_endpoint {
            self.api_endpoint = api_endpoint.clone();
        }
        if let Some(version) = &update.version {
            self.version = version.clone();
        }
        if let Some(metadata) = &update.metadata {
            self.metadata = metadata.clone();
        }
        self.updated_at = now;
    }
}

/// Partial update of a module descriptor; absent fields are left untouched.
///
/// `module_id` and `is_active` are deliberately not here: the id is immutable
/// and activation is a dedicated operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub service_name: Option<String>,
    pub api_endpoint: Option<String>,
    pub version: Option<String>,
    pub metadata: Option<ConfigMap>,
}

impl ModuleUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.service_name.is_none()
            && self.api_endpoint.is_none()
            && self.version.is_none()
            && self.metadata.is_none()
    }
}
