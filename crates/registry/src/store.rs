use vergeerp_core::{ModuleId, StoreError};

use crate::descriptor::ModuleDescriptor;

/// Partition of a set of module ids into valid and invalid members.
///
/// "Valid" means present in the registry **and** active. This is the single
/// choke point every downstream write (assignment, template link, bulk
/// assign, template apply) must pass before trusting a module id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedModules {
    pub valid: Vec<ModuleId>,
    pub invalid: Vec<ModuleId>,
}

impl ValidatedModules {
    pub fn all_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Persistence contract for the module registry.
///
/// Implementations serialize concurrent writes per `module_id` (row-level
/// isolation in the relational backend; a lock in the in-memory backend).
/// No delete operation exists by design: deactivation is terminal.
pub trait ModuleRegistryStore: Send + Sync {
    /// Insert a new descriptor. Returns `false` without writing when the id
    /// is already present (active or inactive).
    fn insert(&self, descriptor: ModuleDescriptor) -> Result<bool, StoreError>;

    /// Fetch a descriptor irrespective of its active flag.
    fn get(&self, module_id: &ModuleId) -> Result<Option<ModuleDescriptor>, StoreError>;

    /// List descriptors ordered by display name, optionally only active ones.
    fn list(&self, active_only: bool) -> Result<Vec<ModuleDescriptor>, StoreError>;

    /// Replace the stored descriptor for `descriptor.module_id`.
    /// Returns `false` when the id does not exist.
    fn update(&self, descriptor: &ModuleDescriptor) -> Result<bool, StoreError>;

    /// Partition `module_ids` into present-and-active vs everything else,
    /// preserving input order within each partition.
    fn validate_exist(&self, module_ids: &[ModuleId]) -> Result<ValidatedModules, StoreError>;
}

impl<S> ModuleRegistryStore for std::sync::Arc<S>
where
    S: ModuleRegistryStore + ?Sized,
{
    fn insert(&self, descriptor: ModuleDescriptor) -> Result<bool, StoreError> {
        (**self).insert(descriptor)
    }

    fn get(&self, module_id: &ModuleId) -> Result<Option<ModuleDescriptor>, StoreError> {
        (**self).get(module_id)
    }

    fn list(&self, active_only: bool) -> Result<Vec<ModuleDescriptor>, StoreError> {
        (**self).list(active_only)
    }

    fn update(&self, descriptor: &ModuleDescriptor) -> Result<bool, StoreError> {
        (**self).update(descriptor)
    }

    fn validate_exist(&self, module_ids: &[ModuleId]) -> Result<ValidatedModules, StoreError> {
        (**self).validate_exist(module_ids)
    }
}
