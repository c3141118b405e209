//! In-memory store implementations for dev and test runs.
//!
//! Backed by `RwLock<HashMap>`; a poisoned lock surfaces as
//! `StoreError::Query` so callers see the same retryable contract the
//! Postgres stores give them.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use vergeerp_core::{IndustryCode, ModuleId, OrganizationId, StoreError};
use vergeerp_entitlements::{
    AssignmentStore, ModuleAssignment, OrganizationDirectory, OrganizationRecord,
};
use vergeerp_industries::{IndustryModuleLink, IndustryTemplate, IndustryTemplateStore};
use vergeerp_registry::{ModuleDescriptor, ModuleRegistryStore, ValidatedModules};

fn poisoned() -> StoreError {
    StoreError::Query("store lock poisoned".to_string())
}

/// HashMap-backed module registry.
#[derive(Debug, Default)]
pub struct InMemoryModuleRegistry {
    rows: RwLock<HashMap<ModuleId, ModuleDescriptor>>,
}

impl InMemoryModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleRegistryStore for InMemoryModuleRegistry {
    fn insert(&self, descriptor: ModuleDescriptor) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        if rows.contains_key(&descriptor.module_id) {
            return Ok(false);
        }
        rows.insert(descriptor.module_id.clone(), descriptor);
        Ok(true)
    }

    fn get(&self, module_id: &ModuleId) -> Result<Option<ModuleDescriptor>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(module_id).cloned())
    }

    fn list(&self, active_only: bool) -> Result<Vec<ModuleDescriptor>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let mut all: Vec<ModuleDescriptor> = rows
            .values()
            .filter(|d| !active_only || d.is_active)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn update(&self, descriptor: &ModuleDescriptor) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        if !rows.contains_key(&descriptor.module_id) {
            return Ok(false);
        }
        rows.insert(descriptor.module_id.clone(), descriptor.clone());
        Ok(true)
    }

    fn validate_exist(&self, module_ids: &[ModuleId]) -> Result<ValidatedModules, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let mut checked = ValidatedModules::default();
        for id in module_ids {
            if rows.get(id).is_some_and(|d| d.is_active) {
                checked.valid.push(id.clone());
            } else {
                checked.invalid.push(id.clone());
            }
        }
        Ok(checked)
    }
}

/// HashMap-backed template store. Links are keyed by `(template_id,
/// module_id)` to mirror the relational uniqueness constraint.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<IndustryCode, IndustryTemplate>>,
    links: RwLock<HashMap<(Uuid, ModuleId), IndustryModuleLink>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn template_id(&self, code: &IndustryCode) -> Result<Option<Uuid>, StoreError> {
        let templates = self.templates.read().map_err(|_| poisoned())?;
        Ok(templates.get(code).map(|t| t.template_id))
    }
}

impl IndustryTemplateStore for InMemoryTemplateStore {
    fn insert(&self, template: IndustryTemplate) -> Result<bool, StoreError> {
        let mut templates = self.templates.write().map_err(|_| poisoned())?;
        if templates.contains_key(&template.industry_code) {
            return Ok(false);
        }
        templates.insert(template.industry_code.clone(), template);
        Ok(true)
    }

    fn get(&self, code: &IndustryCode) -> Result<Option<IndustryTemplate>, StoreError> {
        let templates = self.templates.read().map_err(|_| poisoned())?;
        Ok(templates.get(code).cloned())
    }

    fn list(&self, active_only: bool) -> Result<Vec<IndustryTemplate>, StoreError> {
        let templates = self.templates.read().map_err(|_| poisoned())?;
        let mut all: Vec<IndustryTemplate> = templates
            .values()
            .filter(|t| !active_only || t.is_active)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.industry_name.cmp(&b.industry_name));
        Ok(all)
    }

    fn update(&self, template: &IndustryTemplate) -> Result<bool, StoreError> {
        let mut templates = self.templates.write().map_err(|_| poisoned())?;
        if !templates.contains_key(&template.industry_code) {
            return Ok(false);
        }
        templates.insert(template.industry_code.clone(), template.clone());
        Ok(true)
    }

    fn insert_link(
        &self,
        code: &IndustryCode,
        link: IndustryModuleLink,
    ) -> Result<bool, StoreError> {
        let Some(template_id) = self.template_id(code)? else {
            return Ok(false);
        };
        let mut links = self.links.write().map_err(|_| poisoned())?;
        let key = (template_id, link.module_id.clone());
        if links.contains_key(&key) {
            return Ok(false);
        }
        links.insert(key, link);
        Ok(true)
    }

    fn get_link(
        &self,
        code: &IndustryCode,
        module_id: &ModuleId,
    ) -> Result<Option<IndustryModuleLink>, StoreError> {
        let Some(template_id) = self.template_id(code)? else {
            return Ok(None);
        };
        let links = self.links.read().map_err(|_| poisoned())?;
        Ok(links.get(&(template_id, module_id.clone())).cloned())
    }

    fn update_link(
        &self,
        code: &IndustryCode,
        link: &IndustryModuleLink,
    ) -> Result<bool, StoreError> {
        let Some(template_id) = self.template_id(code)? else {
            return Ok(false);
        };
        let mut links = self.links.write().map_err(|_| poisoned())?;
        let key = (template_id, link.module_id.clone());
        if !links.contains_key(&key) {
            return Ok(false);
        }
        links.insert(key, link.clone());
        Ok(true)
    }

    fn delete_link(&self, code: &IndustryCode, module_id: &ModuleId) -> Result<bool, StoreError> {
        let Some(template_id) = self.template_id(code)? else {
            return Ok(false);
        };
        let mut links = self.links.write().map_err(|_| poisoned())?;
        Ok(links.remove(&(template_id, module_id.clone())).is_some())
    }

    fn list_links(&self, code: &IndustryCode) -> Result<Vec<IndustryModuleLink>, StoreError> {
        let Some(template_id) = self.template_id(code)? else {
            return Ok(Vec::new());
        };
        let links = self.links.read().map_err(|_| poisoned())?;
        let mut all: Vec<IndustryModuleLink> = links
            .values()
            .filter(|l| l.template_id == template_id)
            .cloned()
            .collect();
        all.sort_by_key(|l| l.display_order);
        Ok(all)
    }
}

/// HashMap-backed assignment store, keyed by `(organization_id, module_id)`.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    rows: RwLock<HashMap<(OrganizationId, ModuleId), ModuleAssignment>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssignmentStore for InMemoryAssignmentStore {
    fn get(
        &self,
        org_id: &OrganizationId,
        module_id: &ModuleId,
    ) -> Result<Option<ModuleAssignment>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&(*org_id, module_id.clone())).cloned())
    }

    fn list(&self, org_id: &OrganizationId) -> Result<Vec<ModuleAssignment>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let mut all: Vec<ModuleAssignment> = rows
            .values()
            .filter(|a| &a.organization_id == org_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.module_id.cmp(&b.module_id));
        Ok(all)
    }

    fn upsert(&self, assignment: ModuleAssignment) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.insert(
            (assignment.organization_id, assignment.module_id.clone()),
            assignment,
        );
        Ok(())
    }

    fn delete(&self, org_id: &OrganizationId, module_id: &ModuleId) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        Ok(rows.remove(&(*org_id, module_id.clone())).is_some())
    }
}

/// HashMap-backed organization directory for dev and test runs.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationDirectory {
    rows: RwLock<HashMap<OrganizationId, OrganizationRecord>>,
}

impl InMemoryOrganizationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an organization (signup is owned by an external service).
    pub fn insert(&self, record: OrganizationRecord) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(record.organization_id, record);
        }
    }
}

impl OrganizationDirectory for InMemoryOrganizationDirectory {
    fn get(&self, org_id: &OrganizationId) -> Result<Option<OrganizationRecord>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(org_id).cloned())
    }

    fn set_industry(
        &self,
        org_id: &OrganizationId,
        code: &IndustryCode,
        name: &str,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        match rows.get_mut(org_id) {
            Some(record) => {
                record.industry_code = Some(code.clone());
                record.industry_name = Some(name.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vergeerp_core::ConfigMap;

    fn descriptor(id: &str, active: bool) -> ModuleDescriptor {
        let mut d = ModuleDescriptor::new(
            ModuleId::new(id).unwrap(),
            id,
            "",
            "operations",
            format!("{id}-service"),
            format!("/api/{id}"),
            "1.0.0",
            ConfigMap::new(),
            Utc::now(),
        );
        d.is_active = active;
        d
    }

    #[test]
    fn registry_insert_rejects_duplicates_even_when_inactive() {
        let store = InMemoryModuleRegistry::new();
        assert!(store.insert(descriptor("crm", false)).unwrap());
        assert!(!store.insert(descriptor("crm", true)).unwrap());
        // The original (inactive) row is untouched.
        assert!(!store.get(&ModuleId::new("crm").unwrap()).unwrap().unwrap().is_active);
    }

    #[test]
    fn registry_validate_partitions_on_presence_and_activity() {
        let store = InMemoryModuleRegistry::new();
        store.insert(descriptor("crm", true)).unwrap();
        store.insert(descriptor("legacy", false)).unwrap();

        let ids = [
            ModuleId::new("crm").unwrap(),
            ModuleId::new("legacy").unwrap(),
            ModuleId::new("ghost").unwrap(),
        ];
        let checked = store.validate_exist(&ids).unwrap();
        assert_eq!(checked.valid, vec![ModuleId::new("crm").unwrap()]);
        assert_eq!(
            checked.invalid,
            vec![ModuleId::new("legacy").unwrap(), ModuleId::new("ghost").unwrap()]
        );
    }

    #[test]
    fn registry_list_orders_by_name_and_filters_active() {
        let store = InMemoryModuleRegistry::new();
        store.insert(descriptor("zeta", true)).unwrap();
        store.insert(descriptor("alpha", true)).unwrap();
        store.insert(descriptor("mid", false)).unwrap();

        let all = store.list(false).unwrap();
        let names: Vec<&str> = all.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
        assert_eq!(store.list(true).unwrap().len(), 2);
    }

    #[test]
    fn template_links_are_ordered_and_scoped_to_their_template() {
        let store = InMemoryTemplateStore::new();
        let now = Utc::now();
        let tech = IndustryTemplate::new("tech".parse().unwrap(), "Technology", "", now);
        let retail = IndustryTemplate::new("retail".parse().unwrap(), "Retail", "", now);
        let tech_id = tech.template_id;
        let retail_id = retail.template_id;
        store.insert(tech).unwrap();
        store.insert(retail).unwrap();

        let code: IndustryCode = "tech".parse().unwrap();
        for (module, order) in [("crm", 2u32), ("projects", 0), ("hr", 1)] {
            store
                .insert_link(
                    &code,
                    IndustryModuleLink::new(
                        tech_id,
                        ModuleId::new(module).unwrap(),
                        false,
                        ConfigMap::new(),
                        order,
                        now,
                    ),
                )
                .unwrap();
        }
        store
            .insert_link(
                &"retail".parse().unwrap(),
                IndustryModuleLink::new(
                    retail_id,
                    ModuleId::new("pos").unwrap(),
                    true,
                    ConfigMap::new(),
                    0,
                    now,
                ),
            )
            .unwrap();

        let links = store.list_links(&code).unwrap();
        let ordered: Vec<&str> = links.iter().map(|l| l.module_id.as_str()).collect();
        assert_eq!(ordered, ["projects", "hr", "crm"]);
    }

    #[test]
    fn assignments_are_isolated_per_organization() {
        let store = InMemoryAssignmentStore::new();
        let acme = OrganizationId::new();
        let other = OrganizationId::new();
        let now = Utc::now();
        store
            .upsert(ModuleAssignment::new_enabled(
                acme,
                ModuleId::new("crm").unwrap(),
                ConfigMap::new(),
                now,
            ))
            .unwrap();
        store
            .upsert(ModuleAssignment::new_enabled(
                other,
                ModuleId::new("crm").unwrap(),
                ConfigMap::new(),
                now,
            ))
            .unwrap();

        assert_eq!(store.list(&acme).unwrap().len(), 1);
        assert!(store.delete(&acme, &ModuleId::new("crm").unwrap()).unwrap());
        assert!(store.list(&acme).unwrap().is_empty());
        assert_eq!(store.list(&other).unwrap().len(), 1);
    }
}
