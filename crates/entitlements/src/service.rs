//! The entitlement orchestrator.
//!
//! Every public mutation runs the same sequence:
//!
//! 1. **validate** — referenced modules must exist and be active in the
//!    registry; duplicate creates and missing targets fail here, before any
//!    write;
//! 2. **persist** — a single-row upsert/delete against the owning store;
//! 3. **invalidate cache** — drop the keys the write made stale;
//! 4. **publish event** — announce the change on the bus.
//!
//! Steps 3 and 4 are best-effort: their failures are logged with enough
//! context to bust the cache or replay the event by hand, and the operation
//! is still reported as successful. The store write is the source of truth.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use vergeerp_cache::{CacheStore, get_json, keys, set_json};
use vergeerp_core::{ConfigMap, DomainError, DomainResult, IndustryCode, ModuleId, OrganizationId, UserId};
use vergeerp_events::{EventBus, EventKind, ModuleEvent};
use vergeerp_industries::{IndustryModuleLink, IndustryTemplate, IndustryTemplateStore, LinkUpdate, TemplateUpdate};
use vergeerp_registry::{ModuleDescriptor, ModuleRegistryStore, ModuleUpdate};

use crate::assignment::{AssignmentUpdate, ModuleAssignment};
use crate::organization::OrganizationDirectory;
use crate::store::AssignmentStore;

/// Input for registering a new module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModule {
    pub module_id: ModuleId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub service_name: String,
    pub api_endpoint: String,
    pub version: String,
    pub metadata: ConfigMap,
}

/// Input for creating an industry template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    pub industry_code: IndustryCode,
    pub industry_name: String,
    pub description: String,
}

/// Input for linking a module into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub module_id: ModuleId,
    pub is_required: bool,
    pub default_config: ConfigMap,
    pub display_order: u32,
}

/// Façade over the registry, template and assignment stores.
///
/// Holds injected store handles only; no ambient global state. Cheap to
/// clone, safe to share across request handlers.
#[derive(Clone)]
pub struct EntitlementService {
    registry: Arc<dyn ModuleRegistryStore>,
    templates: Arc<dyn IndustryTemplateStore>,
    assignments: Arc<dyn AssignmentStore>,
    organizations: Arc<dyn OrganizationDirectory>,
    cache: Arc<dyn CacheStore>,
    bus: Arc<dyn EventBus<ModuleEvent>>,
}

impl EntitlementService {
    pub fn new(
        registry: Arc<dyn ModuleRegistryStore>,
        templates: Arc<dyn IndustryTemplateStore>,
        assignments: Arc<dyn AssignmentStore>,
        organizations: Arc<dyn OrganizationDirectory>,
        cache: Arc<dyn CacheStore>,
        bus: Arc<dyn EventBus<ModuleEvent>>,
    ) -> Self {
        Self {
            registry,
            templates,
            assignments,
            organizations,
            cache,
            bus,
        }
    }

    // ---- module registry -------------------------------------------------

    pub fn register_module(
        &self,
        input: NewModule,
        actor: Option<UserId>,
    ) -> DomainResult<ModuleDescriptor> {
        let descriptor = ModuleDescriptor::new(
            input.module_id,
            input.name,
            input.description,
            input.category,
            input.service_name,
            input.api_endpoint,
            input.version,
            input.metadata,
            Utc::now(),
        );
        if !self.registry.insert(descriptor.clone())? {
            return Err(DomainError::already_exists(format!(
                "module '{}' is already registered",
                descriptor.module_id
            )));
        }

        self.cache.delete_many(&keys::registry_keys());
        self.emit(ModuleEvent::system(
            EventKind::ModuleRegistered,
            actor,
            json!({
                "module_id": descriptor.module_id,
                "name": descriptor.name,
            }),
            descriptor.created_at,
        ));
        Ok(descriptor)
    }

    pub fn get_module(&self, module_id: &ModuleId) -> DomainResult<ModuleDescriptor> {
        self.registry
            .get(module_id)?
            .ok_or_else(|| DomainError::not_found(format!("module '{module_id}' not found")))
    }

    /// Registry listing, cache-first.
    pub fn list_modules(&self, active_only: bool) -> DomainResult<Vec<ModuleDescriptor>> {
        let key = keys::registry_all(active_only);
        if let Some(cached) = get_json::<Vec<ModuleDescriptor>, _>(self.cache.as_ref(), &key) {
            return Ok(cached);
        }
        let modules = self.registry.list(active_only)?;
        set_json(self.cache.as_ref(), &key, &modules, keys::REGISTRY_TTL);
        Ok(modules)
    }

    pub fn update_module(
        &self,
        module_id: &ModuleId,
        update: &ModuleUpdate,
        actor: Option<UserId>,
    ) -> DomainResult<ModuleDescriptor> {
        let mut descriptor = self.get_module(module_id)?;
        let now = Utc::now();
        descriptor.apply_update(update, now);
        self.registry.update(&descriptor)?;

        self.cache.delete_many(&keys::registry_keys());
        self.emit(ModuleEvent::system(
            EventKind::ModuleUpdated,
            actor,
            json!({ "module_id": descriptor.module_id }),
            now,
        ));
        Ok(descriptor)
    }

    /// Toggle `is_active`. Idempotent: setting the flag to its current value
    /// changes nothing and publishes nothing.
    pub fn set_module_active(
        &self,
        module_id: &ModuleId,
        active: bool,
        actor: Option<UserId>,
    ) -> DomainResult<ModuleDescriptor> {
        let mut descriptor = self.get_module(module_id)?;
        if descriptor.is_active == active {
            return Ok(descriptor);
        }
        let now = Utc::now();
        descriptor.is_active = active;
        descriptor.updated_at = now;
        self.registry.update(&descriptor)?;

        self.cache.delete_many(&keys::registry_keys());
        let kind = if active {
            EventKind::ModuleActivated
        } else {
            EventKind::ModuleDeactivated
        };
        self.emit(ModuleEvent::system(
            kind,
            actor,
            json!({ "module_id": descriptor.module_id }),
            now,
        ));
        Ok(descriptor)
    }

    // ---- industry templates ----------------------------------------------

    pub fn create_template(&self, input: NewTemplate) -> DomainResult<IndustryTemplate> {
        let template = IndustryTemplate::new(
            input.industry_code,
            input.industry_name,
            input.description,
            Utc::now(),
        );
        if !self.templates.insert(template.clone())? {
            return Err(DomainError::already_exists(format!(
                "industry template '{}' already exists",
                template.industry_code
            )));
        }
        self.cache.delete_many(&keys::industry_keys(&template.industry_code));
        Ok(template)
    }

    pub fn get_template(&self, code: &IndustryCode) -> DomainResult<IndustryTemplate> {
        let key = keys::industry_template(code);
        if let Some(cached) = get_json::<IndustryTemplate, _>(self.cache.as_ref(), &key) {
            return Ok(cached);
        }
        let template = self
            .templates
            .get(code)?
            .ok_or_else(|| DomainError::not_found(format!("industry template '{code}' not found")))?;
        set_json(self.cache.as_ref(), &key, &template, keys::INDUSTRY_TTL);
        Ok(template)
    }

    pub fn list_templates(&self, active_only: bool) -> DomainResult<Vec<IndustryTemplate>> {
        let key = keys::industries_all(active_only);
        if let Some(cached) = get_json::<Vec<IndustryTemplate>, _>(self.cache.as_ref(), &key) {
            return Ok(cached);
        }
        let templates = self.templates.list(active_only)?;
        set_json(self.cache.as_ref(), &key, &templates, keys::INDUSTRY_TTL);
        Ok(templates)
    }

    pub fn update_template(
        &self,
        code: &IndustryCode,
        update: &TemplateUpdate,
    ) -> DomainResult<IndustryTemplate> {
        let mut template = self.stored_template(code)?;
        template.apply_update(update, Utc::now());
        self.templates.update(&template)?;
        self.cache.delete_many(&keys::industry_keys(code));
        Ok(template)
    }

    /// Soft delete. The template stays resolvable for organizations that
    /// already carry its code.
    pub fn deactivate_template(&self, code: &IndustryCode) -> DomainResult<IndustryTemplate> {
        let mut template = self.stored_template(code)?;
        if template.is_active {
            template.is_active = false;
            template.updated_at = Utc::now();
            self.templates.update(&template)?;
        }
        self.cache.delete_many(&keys::industry_keys(code));
        Ok(template)
    }

    pub fn add_module_to_template(
        &self,
        code: &IndustryCode,
        input: NewLink,
    ) -> DomainResult<IndustryModuleLink> {
        let template = self.stored_template(code)?;
        let checked = self.registry.validate_exist(std::slice::from_ref(&input.module_id))?;
        if !checked.all_valid() {
            return Err(DomainError::not_found(format!(
                "module '{}' not found or inactive",
                input.module_id
            )));
        }

        let link = IndustryModuleLink::new(
            template.template_id,
            input.module_id,
            input.is_required,
            input.default_config,
            input.display_order,
            Utc::now(),
        );
        if !self.templates.insert_link(code, link.clone())? {
            return Err(DomainError::AlreadyLinked {
                industry_code: code.as_str().to_string(),
                module_id: link.module_id,
            });
        }
        self.cache.delete_many(&keys::industry_keys(code));
        Ok(link)
    }

    pub fn update_module_link(
        &self,
        code: &IndustryCode,
        module_id: &ModuleId,
        update: &LinkUpdate,
    ) -> DomainResult<IndustryModuleLink> {
        let mut link = self.templates.get_link(code, module_id)?.ok_or_else(|| {
            DomainError::not_found(format!(
                "module '{module_id}' is not linked to industry '{code}'"
            ))
        })?;
        link.apply_update(update);
        self.templates.update_link(code, &link)?;
        self.cache.delete_many(&keys::industry_keys(code));
        Ok(link)
    }

    pub fn remove_module_from_template(
        &self,
        code: &IndustryCode,
        module_id: &ModuleId,
    ) -> DomainResult<()> {
        if !self.templates.delete_link(code, module_id)? {
            return Err(DomainError::not_found(format!(
                "module '{module_id}' is not linked to industry '{code}'"
            )));
        }
        self.cache.delete_many(&keys::industry_keys(code));
        Ok(())
    }

    /// Template links, cache-first, ordered by display order.
    ///
    /// The read path is tolerant: links whose module has since gone missing
    /// or inactive are filtered out with a warning instead of failing the
    /// whole read. The apply path ([`Self::apply_industry_template`]) rejects
    /// them instead.
    pub fn list_template_modules(
        &self,
        code: &IndustryCode,
    ) -> DomainResult<Vec<IndustryModuleLink>> {
        let key = keys::industry_modules(code);
        if let Some(cached) = get_json::<Vec<IndustryModuleLink>, _>(self.cache.as_ref(), &key) {
            return Ok(cached);
        }

        self.stored_template(code)?;
        let links = self.templates.list_links(code)?;
        let ids: Vec<ModuleId> = links.iter().map(|l| l.module_id.clone()).collect();
        let checked = self.registry.validate_exist(&ids)?;
        let filtered: Vec<IndustryModuleLink> = links
            .into_iter()
            .filter(|link| {
                let valid = checked.valid.contains(&link.module_id);
                if !valid {
                    warn!(
                        industry_code = %code,
                        module_id = %link.module_id,
                        "dropping template link to missing or inactive module"
                    );
                }
                valid
            })
            .collect();

        set_json(self.cache.as_ref(), &key, &filtered, keys::INDUSTRY_TTL);
        Ok(filtered)
    }

    // ---- organization assignments ----------------------------------------

    /// Enable one module for a tenant.
    ///
    /// Upsert semantics: an existing row gets its config replaced and is
    /// forced back to enabled; a new row is inserted with `enabled_at` set.
    /// Idempotent — re-assigning the same module with the same config leaves
    /// the row unchanged apart from `updated_at`.
    pub fn assign_module(
        &self,
        org_id: &OrganizationId,
        module_id: &ModuleId,
        config: ConfigMap,
        actor: Option<UserId>,
    ) -> DomainResult<ModuleAssignment> {
        let checked = self.registry.validate_exist(std::slice::from_ref(module_id))?;
        if !checked.all_valid() {
            return Err(DomainError::invalid_modules(
                format!("module '{module_id}' does not exist or is inactive"),
                checked.invalid,
            ));
        }

        let now = Utc::now();
        let assignment = self.upsert_enabled(org_id, module_id, config, now)?;

        self.cache.delete(&keys::org_modules(org_id));
        self.emit(ModuleEvent::new(
            EventKind::ModuleAssigned,
            *org_id,
            actor,
            json!({ "module_id": module_id }),
            now,
        ));
        Ok(assignment)
    }

    /// Permanently remove one assignment (hard delete, unlike module and
    /// template deactivation).
    pub fn unassign_module(
        &self,
        org_id: &OrganizationId,
        module_id: &ModuleId,
        actor: Option<UserId>,
    ) -> DomainResult<()> {
        if !self.assignments.delete(org_id, module_id)? {
            return Err(DomainError::not_found(format!(
                "module '{module_id}' is not assigned to this organization"
            )));
        }

        self.cache.delete(&keys::org_modules(org_id));
        self.emit(ModuleEvent::new(
            EventKind::ModuleUnassigned,
            *org_id,
            actor,
            json!({ "module_id": module_id }),
            Utc::now(),
        ));
        Ok(())
    }

    pub fn update_module_config(
        &self,
        org_id: &OrganizationId,
        module_id: &ModuleId,
        update: &AssignmentUpdate,
        actor: Option<UserId>,
    ) -> DomainResult<ModuleAssignment> {
        let mut assignment = self.assignments.get(org_id, module_id)?.ok_or_else(|| {
            DomainError::not_found(format!(
                "module '{module_id}' is not assigned to this organization"
            ))
        })?;
        let now = Utc::now();
        assignment.apply_update(update, now);
        self.assignments.upsert(assignment.clone())?;

        self.cache.delete(&keys::org_modules(org_id));
        self.emit(ModuleEvent::new(
            EventKind::ModuleConfigUpdated,
            *org_id,
            actor,
            json!({
                "module_id": module_id,
                "is_enabled": assignment.is_enabled,
            }),
            now,
        ));
        Ok(assignment)
    }

    /// A tenant's assignments, cache-first.
    pub fn list_organization_modules(
        &self,
        org_id: &OrganizationId,
    ) -> DomainResult<Vec<ModuleAssignment>> {
        let key = keys::org_modules(org_id);
        if let Some(cached) = get_json::<Vec<ModuleAssignment>, _>(self.cache.as_ref(), &key) {
            return Ok(cached);
        }
        let assignments = self.assignments.list(org_id)?;
        set_json(self.cache.as_ref(), &key, &assignments, keys::ORG_MODULES_TTL);
        Ok(assignments)
    }

    /// Enable several modules at once.
    ///
    /// Validation is all-or-nothing: a single unknown or inactive id fails
    /// the whole call with every offending id enumerated, and nothing is
    /// written. Persistence is per-row: once validation passed, a mid-batch
    /// store failure propagates without rolling back siblings already
    /// written.
    ///
    /// With an `industry_code`, each module's starting config comes from the
    /// matching template link's `default_config` (empty when no link exists).
    pub fn bulk_assign_modules(
        &self,
        org_id: &OrganizationId,
        module_ids: &[ModuleId],
        industry_code: Option<&IndustryCode>,
        actor: Option<UserId>,
    ) -> DomainResult<Vec<ModuleAssignment>> {
        if module_ids.is_empty() {
            return Err(DomainError::validation("no module ids supplied"));
        }
        let checked = self.registry.validate_exist(module_ids)?;
        if !checked.all_valid() {
            return Err(DomainError::invalid_modules(
                "one or more modules do not exist or are inactive",
                checked.invalid,
            ));
        }

        let defaults = match industry_code {
            Some(code) => self.templates.list_links(code)?,
            None => Vec::new(),
        };
        let now = Utc::now();
        let mut assigned = Vec::with_capacity(module_ids.len());
        for module_id in module_ids {
            let config = defaults
                .iter()
                .find(|link| &link.module_id == module_id)
                .map(|link| link.default_config.clone())
                .unwrap_or_default();
            assigned.push(self.upsert_enabled(org_id, module_id, config, now)?);
        }

        self.cache.delete(&keys::org_modules(org_id));
        self.emit(ModuleEvent::new(
            EventKind::ModulesBulkAssigned,
            *org_id,
            actor,
            json!({
                "module_ids": module_ids,
                "industry_code": industry_code.map(|c| c.as_str()),
            }),
            now,
        ));
        Ok(assigned)
    }

    /// Bootstrap a tenant from an industry template.
    ///
    /// Records the template's code and name on the organization, then enables
    /// every linked module with its template default config. One logical
    /// operation, one `template_applied` event.
    pub fn apply_industry_template(
        &self,
        org_id: &OrganizationId,
        code: &IndustryCode,
        actor: Option<UserId>,
    ) -> DomainResult<Vec<ModuleAssignment>> {
        let template = self.stored_template(code)?;
        if !template.is_active {
            return Err(DomainError::not_found(format!(
                "industry template '{code}' not found"
            )));
        }

        let links = self.templates.list_links(code)?;
        if links.is_empty() {
            return Err(DomainError::validation(format!(
                "industry template '{code}' has no assignable modules"
            )));
        }
        let ids: Vec<ModuleId> = links.iter().map(|l| l.module_id.clone()).collect();
        let checked = self.registry.validate_exist(&ids)?;
        if !checked.all_valid() {
            return Err(DomainError::invalid_modules(
                format!("industry template '{code}' references missing or inactive modules"),
                checked.invalid,
            ));
        }

        if !self
            .organizations
            .set_industry(org_id, code, &template.industry_name)?
        {
            return Err(DomainError::not_found(format!(
                "organization '{org_id}' not found"
            )));
        }

        let now = Utc::now();
        let mut assigned = Vec::with_capacity(links.len());
        for link in &links {
            assigned.push(self.upsert_enabled(
                org_id,
                &link.module_id,
                link.default_config.clone(),
                now,
            )?);
        }

        self.cache.delete(&keys::org_modules(org_id));
        self.emit(ModuleEvent::new(
            EventKind::TemplateApplied,
            *org_id,
            actor,
            json!({
                "industry_code": code,
                "module_ids": ids,
            }),
            now,
        ));
        Ok(assigned)
    }

    // ---- internals -------------------------------------------------------

    fn stored_template(&self, code: &IndustryCode) -> DomainResult<IndustryTemplate> {
        self.templates
            .get(code)?
            .ok_or_else(|| DomainError::not_found(format!("industry template '{code}' not found")))
    }

    fn upsert_enabled(
        &self,
        org_id: &OrganizationId,
        module_id: &ModuleId,
        config: ConfigMap,
        now: chrono::DateTime<Utc>,
    ) -> DomainResult<ModuleAssignment> {
        let assignment = match self.assignments.get(org_id, module_id)? {
            Some(mut existing) => {
                existing.reassign(config, now);
                existing
            }
            None => ModuleAssignment::new_enabled(*org_id, module_id.clone(), config, now),
        };
        self.assignments.upsert(assignment.clone())?;
        Ok(assignment)
    }

    fn emit(&self, event: ModuleEvent) {
        if let Err(error) = self.bus.publish(event.clone()) {
            warn!(
                topic = event.topic(),
                organization_id = %event.organization_id,
                %error,
                "event publish failed, store write stands"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    use vergeerp_cache::InMemoryCache;
    use vergeerp_core::StoreError;
    use vergeerp_events::InMemoryEventBus;
    use vergeerp_registry::ValidatedModules;

    #[derive(Default)]
    struct FakeRegistry {
        rows: RwLock<HashMap<ModuleId, ModuleDescriptor>>,
    }

    impl ModuleRegistryStore for FakeRegistry {
        fn insert(&self, descriptor: ModuleDescriptor) -> Result<bool, StoreError> {
            let mut rows = self.rows.write().unwrap();
            if rows.contains_key(&descriptor.module_id) {
                return Ok(false);
            }
            rows.insert(descriptor.module_id.clone(), descriptor);
            Ok(true)
        }

        fn get(&self, module_id: &ModuleId) -> Result<Option<ModuleDescriptor>, StoreError> {
            Ok(self.rows.read().unwrap().get(module_id).cloned())
        }

        fn list(&self, active_only: bool) -> Result<Vec<ModuleDescriptor>, StoreError> {
            let mut all: Vec<_> = self
                .rows
                .read()
                .unwrap()
                .values()
                .filter(|d| !active_only || d.is_active)
                .cloned()
                .collect();
            all.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(all)
        }

        fn update(&self, descriptor: &ModuleDescriptor) -> Result<bool, StoreError> {
            let mut rows = self.rows.write().unwrap();
            if !rows.contains_key(&descriptor.module_id) {
                return Ok(false);
            }
            rows.insert(descriptor.module_id.clone(), descriptor.clone());
            Ok(true)
        }

        fn validate_exist(&self, module_ids: &[ModuleId]) -> Result<ValidatedModules, StoreError> {
            let rows = self.rows.read().unwrap();
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

    #[derive(Default)]
    struct FakeTemplates {
        templates: RwLock<HashMap<IndustryCode, IndustryTemplate>>,
        links: RwLock<HashMap<(IndustryCode, ModuleId), IndustryModuleLink>>,
    }

    impl IndustryTemplateStore for FakeTemplates {
        fn insert(&self, template: IndustryTemplate) -> Result<bool, StoreError> {
            let mut rows = self.templates.write().unwrap();
            if rows.contains_key(&template.industry_code) {
                return Ok(false);
            }
            rows.insert(template.industry_code.clone(), template);
            Ok(true)
        }

        fn get(&self, code: &IndustryCode) -> Result<Option<IndustryTemplate>, StoreError> {
            Ok(self.templates.read().unwrap().get(code).cloned())
        }

        fn list(&self, active_only: bool) -> Result<Vec<IndustryTemplate>, StoreError> {
            let mut all: Vec<_> = self
                .templates
                .read()
                .unwrap()
                .values()
                .filter(|t| !active_only || t.is_active)
                .cloned()
                .collect();
            all.sort_by(|a, b| a.industry_name.cmp(&b.industry_name));
            Ok(all)
        }

        fn update(&self, template: &IndustryTemplate) -> Result<bool, StoreError> {
            let mut rows = self.templates.write().unwrap();
            if !rows.contains_key(&template.industry_code) {
                return Ok(false);
            }
            rows.insert(template.industry_code.clone(), template.clone());
            Ok(true)
        }

        fn insert_link(
            &self,
            code: &IndustryCode,
            link: IndustryModuleLink,
        ) -> Result<bool, StoreError> {
            let mut links = self.links.write().unwrap();
            let key = (code.clone(), link.module_id.clone());
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
            Ok(self
                .links
                .read()
                .unwrap()
                .get(&(code.clone(), module_id.clone()))
                .cloned())
        }

        fn update_link(
            &self,
            code: &IndustryCode,
            link: &IndustryModuleLink,
        ) -> Result<bool, StoreError> {
            let mut links = self.links.write().unwrap();
            let key = (code.clone(), link.module_id.clone());
            if !links.contains_key(&key) {
                return Ok(false);
            }
            links.insert(key, link.clone());
            Ok(true)
        }

        fn delete_link(
            &self,
            code: &IndustryCode,
            module_id: &ModuleId,
        ) -> Result<bool, StoreError> {
            Ok(self
                .links
                .write()
                .unwrap()
                .remove(&(code.clone(), module_id.clone()))
                .is_some())
        }

        fn list_links(&self, code: &IndustryCode) -> Result<Vec<IndustryModuleLink>, StoreError> {
            let mut links: Vec<_> = self
                .links
                .read()
                .unwrap()
                .iter()
                .filter(|((c, _), _)| c == code)
                .map(|(_, link)| link.clone())
                .collect();
            links.sort_by_key(|l| l.display_order);
            Ok(links)
        }
    }

    #[derive(Default)]
    struct FakeAssignments {
        rows: RwLock<HashMap<(OrganizationId, ModuleId), ModuleAssignment>>,
    }

    impl AssignmentStore for FakeAssignments {
        fn get(
            &self,
            org_id: &OrganizationId,
            module_id: &ModuleId,
        ) -> Result<Option<ModuleAssignment>, StoreError> {
            Ok(self
                .rows
                .read()
                .unwrap()
                .get(&(*org_id, module_id.clone()))
                .cloned())
        }

        fn list(&self, org_id: &OrganizationId) -> Result<Vec<ModuleAssignment>, StoreError> {
            let mut all: Vec<_> = self
                .rows
                .read()
                .unwrap()
                .values()
                .filter(|a| &a.organization_id == org_id)
                .cloned()
                .collect();
            all.sort_by(|a, b| a.module_id.cmp(&b.module_id));
            Ok(all)
        }

        fn upsert(&self, assignment: ModuleAssignment) -> Result<(), StoreError> {
            self.rows.write().unwrap().insert(
                (assignment.organization_id, assignment.module_id.clone()),
                assignment,
            );
            Ok(())
        }

        fn delete(
            &self,
            org_id: &OrganizationId,
            module_id: &ModuleId,
        ) -> Result<bool, StoreError> {
            Ok(self
                .rows
                .write()
                .unwrap()
                .remove(&(*org_id, module_id.clone()))
                .is_some())
        }
    }

    #[derive(Default)]
    struct FakeOrganizations {
        rows: RwLock<HashMap<OrganizationId, crate::OrganizationRecord>>,
    }

    impl FakeOrganizations {
        fn with(org_id: OrganizationId, name: &str) -> Self {
            let dir = Self::default();
            dir.rows.write().unwrap().insert(
                org_id,
                crate::OrganizationRecord {
                    organization_id: org_id,
                    name: name.to_string(),
                    industry_code: None,
                    industry_name: None,
                },
            );
            dir
        }
    }

    impl OrganizationDirectory for FakeOrganizations {
        fn get(
            &self,
            org_id: &OrganizationId,
        ) -> Result<Option<crate::OrganizationRecord>, StoreError> {
            Ok(self.rows.read().unwrap().get(org_id).cloned())
        }

        fn set_industry(
            &self,
            org_id: &OrganizationId,
            code: &IndustryCode,
            name: &str,
        ) -> Result<bool, StoreError> {
            let mut rows = self.rows.write().unwrap();
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

    struct Harness {
        service: EntitlementService,
        organizations: Arc<FakeOrganizations>,
        bus: Arc<InMemoryEventBus<ModuleEvent>>,
        org_id: OrganizationId,
    }

    fn harness() -> Harness {
        let org_id = OrganizationId::new();
        let organizations = Arc::new(FakeOrganizations::with(org_id, "Acme"));
        let bus = Arc::new(InMemoryEventBus::new());
        let service = EntitlementService::new(
            Arc::new(FakeRegistry::default()),
            Arc::new(FakeTemplates::default()),
            Arc::new(FakeAssignments::default()),
            organizations.clone(),
            Arc::new(InMemoryCache::new()),
            bus.clone(),
        );
        Harness {
            service,
            organizations,
            bus,
            org_id,
        }
    }

    fn module(id: &str) -> NewModule {
        NewModule {
            module_id: ModuleId::new(id).unwrap(),
            name: id.to_string(),
            description: String::new(),
            category: "operations".to_string(),
            service_name: format!("{id}-service"),
            api_endpoint: format!("/api/{id}"),
            version: "1.0.0".to_string(),
            metadata: ConfigMap::new(),
        }
    }

    fn mid(id: &str) -> ModuleId {
        ModuleId::new(id).unwrap()
    }

    #[test]
    fn register_then_duplicate_register_conflicts() {
        let h = harness();
        h.service.register_module(module("crm"), None).unwrap();
        let err = h.service.register_module(module("crm"), None).unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[test]
    fn assigning_an_unknown_or_inactive_module_fails_without_a_row() {
        let h = harness();
        h.service.register_module(module("legacy"), None).unwrap();
        h.service
            .set_module_active(&mid("legacy"), false, None)
            .unwrap();

        for id in ["ghost", "legacy"] {
            let err = h
                .service
                .assign_module(&h.org_id, &mid(id), ConfigMap::new(), None)
                .unwrap_err();
            match err {
                DomainError::Validation { invalid_modules, .. } => {
                    assert_eq!(invalid_modules, vec![mid(id)]);
                }
                other => panic!("expected Validation, got {other:?}"),
            }
        }
        assert!(h.service.list_organization_modules(&h.org_id).unwrap().is_empty());
    }

    #[test]
    fn assign_is_idempotent_and_keeps_enabled_at() {
        let h = harness();
        h.service.register_module(module("crm"), None).unwrap();

        let first = h
            .service
            .assign_module(&h.org_id, &mid("crm"), ConfigMap::new(), None)
            .unwrap();
        let second = h
            .service
            .assign_module(&h.org_id, &mid("crm"), ConfigMap::new(), None)
            .unwrap();

        assert_eq!(second.enabled_at, first.enabled_at);
        assert_eq!(h.service.list_organization_modules(&h.org_id).unwrap().len(), 1);
    }

    #[test]
    fn writes_evict_a_previously_populated_list_cache() {
        let h = harness();
        h.service.register_module(module("crm"), None).unwrap();
        h.service.register_module(module("projects"), None).unwrap();

        h.service
            .assign_module(&h.org_id, &mid("crm"), ConfigMap::new(), None)
            .unwrap();
        // Populate the cache, then write behind it.
        assert_eq!(h.service.list_organization_modules(&h.org_id).unwrap().len(), 1);
        h.service
            .assign_module(&h.org_id, &mid("projects"), ConfigMap::new(), None)
            .unwrap();

        let listed = h.service.list_organization_modules(&h.org_id).unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn bulk_assign_validation_is_all_or_nothing() {
        let h = harness();
        h.service.register_module(module("projects"), None).unwrap();

        let err = h
            .service
            .bulk_assign_modules(&h.org_id, &[mid("projects"), mid("legacy")], None, None)
            .unwrap_err();
        match err {
            DomainError::Validation { invalid_modules, .. } => {
                assert_eq!(invalid_modules, vec![mid("legacy")]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(h.service.list_organization_modules(&h.org_id).unwrap().is_empty());
    }

    #[test]
    fn apply_template_assigns_defaults_and_records_the_industry() {
        let h = harness();
        h.service.register_module(module("projects"), None).unwrap();
        h.service.register_module(module("crm"), None).unwrap();
        h.service
            .create_template(NewTemplate {
                industry_code: "tech".parse().unwrap(),
                industry_name: "Technology".to_string(),
                description: String::new(),
            })
            .unwrap();
        let defaults: ConfigMap =
            [("board".to_string(), serde_json::json!("kanban"))].into_iter().collect();
        h.service
            .add_module_to_template(
                &"tech".parse().unwrap(),
                NewLink {
                    module_id: mid("projects"),
                    is_required: true,
                    default_config: defaults.clone(),
                    display_order: 0,
                },
            )
            .unwrap();
        h.service
            .add_module_to_template(
                &"tech".parse().unwrap(),
                NewLink {
                    module_id: mid("crm"),
                    is_required: false,
                    default_config: ConfigMap::new(),
                    display_order: 1,
                },
            )
            .unwrap();

        let sub = h.bus.subscribe();
        let assigned = h
            .service
            .apply_industry_template(&h.org_id, &"tech".parse().unwrap(), None)
            .unwrap();

        assert_eq!(assigned.len(), 2);
        let projects = assigned.iter().find(|a| a.module_id == mid("projects")).unwrap();
        assert_eq!(projects.config, defaults);
        assert!(assigned.iter().all(|a| a.is_enabled && a.enabled_at.is_some()));

        let record = h.organizations.get(&h.org_id).unwrap().unwrap();
        assert_eq!(record.industry_code, Some("tech".parse().unwrap()));
        assert_eq!(record.industry_name.as_deref(), Some("Technology"));

        // One logical operation, one event.
        let event = sub.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::TemplateApplied);
        assert!(sub.try_recv().is_err());
    }

    #[test]
    fn deactivated_module_blocks_template_application_but_keeps_the_link() {
        let h = harness();
        h.service.register_module(module("projects"), None).unwrap();
        h.service
            .create_template(NewTemplate {
                industry_code: "tech".parse().unwrap(),
                industry_name: "Technology".to_string(),
                description: String::new(),
            })
            .unwrap();
        let code: IndustryCode = "tech".parse().unwrap();
        h.service
            .add_module_to_template(
                &code,
                NewLink {
                    module_id: mid("projects"),
                    is_required: true,
                    default_config: ConfigMap::new(),
                    display_order: 0,
                },
            )
            .unwrap();

        h.service
            .set_module_active(&mid("projects"), false, None)
            .unwrap();

        let err = h
            .service
            .apply_industry_template(&h.org_id, &code, None)
            .unwrap_err();
        match err {
            DomainError::Validation { invalid_modules, .. } => {
                assert_eq!(invalid_modules, vec![mid("projects")]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }

        // Tolerant read path drops the link instead of failing.
        assert!(h.service.list_template_modules(&code).unwrap().is_empty());
        // The link itself survives the deactivation.
        h.service
            .set_module_active(&mid("projects"), true, None)
            .unwrap();
        assert_eq!(h.service.list_template_modules(&code).unwrap().len(), 1);
    }

    #[test]
    fn unassign_removes_the_row_and_a_second_unassign_is_not_found() {
        let h = harness();
        h.service.register_module(module("crm"), None).unwrap();
        h.service
            .assign_module(&h.org_id, &mid("crm"), ConfigMap::new(), None)
            .unwrap();

        h.service.unassign_module(&h.org_id, &mid("crm"), None).unwrap();
        assert!(h.service.list_organization_modules(&h.org_id).unwrap().is_empty());

        let err = h
            .service
            .unassign_module(&h.org_id, &mid("crm"), None)
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn disable_then_reenable_preserves_the_first_enabled_at() {
        let h = harness();
        h.service.register_module(module("crm"), None).unwrap();
        let original = h
            .service
            .assign_module(&h.org_id, &mid("crm"), ConfigMap::new(), None)
            .unwrap();

        h.service
            .update_module_config(
                &h.org_id,
                &mid("crm"),
                &AssignmentUpdate {
                    is_enabled: Some(false),
                    config: None,
                },
                None,
            )
            .unwrap();
        let reenabled = h
            .service
            .update_module_config(
                &h.org_id,
                &mid("crm"),
                &AssignmentUpdate {
                    is_enabled: Some(true),
                    config: None,
                },
                None,
            )
            .unwrap();

        assert_eq!(reenabled.enabled_at, original.enabled_at);
    }

    #[test]
    fn duplicate_template_link_conflicts() {
        let h = harness();
        h.service.register_module(module("crm"), None).unwrap();
        h.service
            .create_template(NewTemplate {
                industry_code: "retail".parse().unwrap(),
                industry_name: "Retail".to_string(),
                description: String::new(),
            })
            .unwrap();
        let code: IndustryCode = "retail".parse().unwrap();
        let link = NewLink {
            module_id: mid("crm"),
            is_required: false,
            default_config: ConfigMap::new(),
            display_order: 0,
        };
        h.service.add_module_to_template(&code, link.clone()).unwrap();
        let err = h.service.add_module_to_template(&code, link).unwrap_err();
        assert!(matches!(err, DomainError::AlreadyLinked { .. }));
    }

    #[test]
    fn bulk_assign_sources_defaults_from_the_named_industry() {
        let h = harness();
        h.service.register_module(module("crm"), None).unwrap();
        h.service.register_module(module("hr"), None).unwrap();
        h.service
            .create_template(NewTemplate {
                industry_code: "retail".parse().unwrap(),
                industry_name: "Retail".to_string(),
                description: String::new(),
            })
            .unwrap();
        let code: IndustryCode = "retail".parse().unwrap();
        let defaults: ConfigMap =
            [("pipeline".to_string(), serde_json::json!("simple"))].into_iter().collect();
        h.service
            .add_module_to_template(
                &code,
                NewLink {
                    module_id: mid("crm"),
                    is_required: true,
                    default_config: defaults.clone(),
                    display_order: 0,
                },
            )
            .unwrap();

        let assigned = h
            .service
            .bulk_assign_modules(&h.org_id, &[mid("crm"), mid("hr")], Some(&code), None)
            .unwrap();

        let crm = assigned.iter().find(|a| a.module_id == mid("crm")).unwrap();
        assert_eq!(crm.config, defaults);
        // No link for hr: falls back to an empty config.
        let hr = assigned.iter().find(|a| a.module_id == mid("hr")).unwrap();
        assert!(hr.config.is_empty());
    }
}
