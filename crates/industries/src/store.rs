use vergeerp_core::{IndustryCode, ModuleId, StoreError};

use crate::template::{IndustryModuleLink, IndustryTemplate};

/// Persistence contract for industry templates and their module links.
///
/// Links are unique per `(template_id, module_id)`; `list_links` returns them
/// ordered by `display_order` ascending. Referential checks against the module
/// registry are the service layer's job, not the store's.
pub trait IndustryTemplateStore: Send + Sync {
    /// Insert a new template. Returns `false` without writing when the code
    /// is already taken (active or inactive).
    fn insert(&self, template: IndustryTemplate) -> Result<bool, StoreError>;

    /// Fetch a template by code irrespective of its active flag.
    fn get(&self, code: &IndustryCode) -> Result<Option<IndustryTemplate>, StoreError>;

    /// List templates ordered by industry name, optionally only active ones.
    fn list(&self, active_only: bool) -> Result<Vec<IndustryTemplate>, StoreError>;

    /// Replace the stored template for `template.industry_code`.
    /// Returns `false` when the code does not exist.
    fn update(&self, template: &IndustryTemplate) -> Result<bool, StoreError>;

    /// Insert a link. Returns `false` without writing when the
    /// `(template, module)` pair already exists.
    fn insert_link(&self, code: &IndustryCode, link: IndustryModuleLink)
        -> Result<bool, StoreError>;

    /// Fetch one link.
    fn get_link(
        &self,
        code: &IndustryCode,
        module_id: &ModuleId,
    ) -> Result<Option<IndustryModuleLink>, StoreError>;

    /// Replace a stored link. Returns `false` when the pair does not exist.
    fn update_link(&self, code: &IndustryCode, link: &IndustryModuleLink)
        -> Result<bool, StoreError>;

    /// Delete a link. Returns `false` when the pair does not exist.
    fn delete_link(&self, code: &IndustryCode, module_id: &ModuleId) -> Result<bool, StoreError>;

    /// All links for a template, ordered by `display_order` ascending.
    /// Returns an empty list for an unknown code.
    fn list_links(&self, code: &IndustryCode) -> Result<Vec<IndustryModuleLink>, StoreError>;
}

impl<S> IndustryTemplateStore for std::sync::Arc<S>
where
    S: IndustryTemplateStore + ?Sized,
{
    fn insert(&self, template: IndustryTemplate) -> Result<bool, StoreError> {
        (**self).insert(template)
    }

    fn get(&self, code: &IndustryCode) -> Result<Option<IndustryTemplate>, StoreError> {
        (**self).get(code)
    }

    fn list(&self, active_only: bool) -> Result<Vec<IndustryTemplate>, StoreError> {
        (**self).list(active_only)
    }

    fn update(&self, template: &IndustryTemplate) -> Result<bool, StoreError> {
        (**self).update(template)
    }

    fn insert_link(
        &self,
        code: &IndustryCode,
        link: IndustryModuleLink,
    ) -> Result<bool, StoreError> {
        (**self).insert_link(code, link)
    }

    fn get_link(
        &self,
        code: &IndustryCode,
        module_id: &ModuleId,
    ) -> Result<Option<IndustryModuleLink>, StoreError> {
        (**self).get_link(code, module_id)
    }

    fn update_link(
        &self,
        code: &IndustryCode,
        link: &IndustryModuleLink,
    ) -> Result<bool, StoreError> {
        (**self).update_link(code, link)
    }

    fn delete_link(&self, code: &IndustryCode, module_id: &ModuleId) -> Result<bool, StoreError> {
        (**self).delete_link(code, module_id)
    }

    fn list_links(&self, code: &IndustryCode) -> Result<Vec<IndustryModuleLink>, StoreError> {
        (**self).list_links(code)
    }
}
