use serde::{Deserialize, Serialize};

use vergeerp_core::{IndustryCode, OrganizationId, StoreError};

/// The slice of an organization record the engine reads and writes.
///
/// Organizations are owned by an external service; the engine only records
/// which industry template was applied to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub organization_id: OrganizationId,
    pub name: String,
    pub industry_code: Option<IndustryCode>,
    pub industry_name: Option<String>,
}

/// Lookup/update interface to the external organization service.
pub trait OrganizationDirectory: Send + Sync {
    fn get(&self, org_id: &OrganizationId) -> Result<Option<OrganizationRecord>, StoreError>;

    /// Record the applied industry on the organization. Returns `false` when
    /// the organization does not exist.
    fn set_industry(
        &self,
        org_id: &OrganizationId,
        code: &IndustryCode,
        name: &str,
    ) -> Result<bool, StoreError>;
}

impl<D> OrganizationDirectory for std::sync::Arc<D>
where
    D: OrganizationDirectory + ?Sized,
{
    fn get(&self, org_id: &OrganizationId) -> Result<Option<OrganizationRecord>, StoreError> {
        (**self).get(org_id)
    }

    fn set_industry(
        &self,
        org_id: &OrganizationId,
        code: &IndustryCode,
        name: &str,
    ) -> Result<bool, StoreError> {
        (**self).set_industry(org_id, code, name)
    }
}
