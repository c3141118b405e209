use vergeerp_core::{ModuleId, OrganizationId, StoreError};

use crate::assignment::ModuleAssignment;

/// Persistence contract for organization module assignments.
///
/// All queries are scoped by `organization_id`; tenant isolation happens at
/// the query level. The store holds rows only, never business rules: the
/// first-enable timestamp and the registry validation are the service's job.
pub trait AssignmentStore: Send + Sync {
    /// Fetch one assignment.
    fn get(
        &self,
        org_id: &OrganizationId,
        module_id: &ModuleId,
    ) -> Result<Option<ModuleAssignment>, StoreError>;

    /// All assignments for the tenant, ordered by module id.
    fn list(&self, org_id: &OrganizationId) -> Result<Vec<ModuleAssignment>, StoreError>;

    /// Insert or replace the row for `(organization_id, module_id)`.
    fn upsert(&self, assignment: ModuleAssignment) -> Result<(), StoreError>;

    /// Hard-delete one assignment. Returns `false` when no row existed.
    fn delete(&self, org_id: &OrganizationId, module_id: &ModuleId) -> Result<bool, StoreError>;
}

impl<S> AssignmentStore for std::sync::Arc<S>
where
    S: AssignmentStore + ?Sized,
{
    fn get(
        &self,
        org_id: &OrganizationId,
        module_id: &ModuleId,
    ) -> Result<Option<ModuleAssignment>, StoreError> {
        (**self).get(org_id, module_id)
    }

    fn list(&self, org_id: &OrganizationId) -> Result<Vec<ModuleAssignment>, StoreError> {
        (**self).list(org_id)
    }

    fn upsert(&self, assignment: ModuleAssignment) -> Result<(), StoreError> {
        (**self).upsert(assignment)
    }

    fn delete(&self, org_id: &OrganizationId, module_id: &ModuleId) -> Result<bool, StoreError> {
        (**self).delete(org_id, module_id)
    }
}
