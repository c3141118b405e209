use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vergeerp_core::{ConfigMap, IndustryCode, ModuleId};

/// A named, reusable bundle of module defaults for one industry.
///
/// Deactivation is a soft delete: the template stays resolvable (historical
/// organizations may reference its code) but is hidden from active listings
/// and rejected for new applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryTemplate {
    pub template_id: Uuid,
    pub industry_code: IndustryCode,
    pub industry_name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IndustryTemplate {
    pub fn new(
        industry_code: IndustryCode,
        industry_name: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            template_id: Uuid::now_v7(),
            industry_code,
            industry_name: industry_name.into(),
            description: description.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge only the fields present in `update`; bumps `updated_at`.
    pub fn apply_update(&mut self, update: &TemplateUpdate, now: DateTime<Utc>) {
        if let Some(name) = &update.industry_name {
            self.industry_name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        self.updated_at = now;
    }
}

/// Partial update of a template; the code is immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateUpdate {
    pub industry_name: Option<String>,
    pub description: Option<String>,
}

/// One module's membership in an industry template.
///
/// Unique per `(template_id, module_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryModuleLink {
    pub template_id: Uuid,
    pub module_id: ModuleId,
    pub is_required: bool,
    pub default_config: ConfigMap,
    pub display_order: u32,
    pub created_at: DateTime<Utc>,
}

impl IndustryModuleLink {
    pub fn new(
        template_id: Uuid,
        module_id: ModuleId,
        is_required: bool,
        default_config: ConfigMap,
        display_order: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            template_id,
            module_id,
            is_required,
            default_config,
            display_order,
            created_at: now,
        }
    }

    /// Merge only the fields present in `update`.
    pub fn apply_update(&mut self, update: &LinkUpdate) {
        if let Some(is_required) = update.is_required {
            self.is_required = is_required;
        }
        if let Some(default_config) = &update.default_config {
            self.default_config = default_config.clone();
        }
        if let Some(display_order) = update.display_order {
            self.display_order = display_order;
        }
    }
}

/// Partial update of a template link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkUpdate {
    pub is_required: Option<bool>,
    pub default_config: Option<ConfigMap>,
    pub display_order: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_update_merges_partial_fields() {
        let now = Utc::now();
        let mut t = IndustryTemplate::new(
            IndustryCode::new("tech").unwrap(),
            "Technology",
            "Software companies",
            now,
        );

        let later = now + chrono::Duration::minutes(1);
        t.apply_update(
            &TemplateUpdate {
                description: Some("SaaS and software companies".to_string()),
                ..TemplateUpdate::default()
            },
            later,
        );

        assert_eq!(t.industry_name, "Technology");
        assert_eq!(t.description, "SaaS and software companies");
        assert_eq!(t.updated_at, later);
        assert!(t.is_active);
    }

    #[test]
    fn link_update_merges_partial_fields() {
        let now = Utc::now();
        let mut link = IndustryModuleLink::new(
            Uuid::now_v7(),
            ModuleId::new("crm").unwrap(),
            false,
            ConfigMap::new(),
            5,
            now,
        );

        link.apply_update(&LinkUpdate {
            is_required: Some(true),
            default_config: Some(
                [("pipeline".to_string(), json!("default"))].into_iter().collect(),
            ),
            display_order: None,
        });

        assert!(link.is_required);
        assert_eq!(link.display_order, 5);
        assert_eq!(link.default_config.get("pipeline"), Some(&json!("default")));
    }
}
