use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vergeerp_core::{ConfigMap, ModuleId, OrganizationId};

/// One tenant's enablement of one module.
///
/// Identity is the `(organization_id, module_id)` pair. Disabling is not
/// deleting: the row stays with `is_enabled = false` until an explicit
/// unassignment removes it. `enabled_at` records the first enable transition
/// and is never cleared or moved afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAssignment {
    pub organization_id: OrganizationId,
    pub module_id: ModuleId,
    pub is_enabled: bool,
    /// Tenant-specific override of the module's default configuration.
    pub config: ConfigMap,
    pub enabled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModuleAssignment {
    /// Fresh enabled assignment; `enabled_at` is stamped immediately.
    pub fn new_enabled(
        organization_id: OrganizationId,
        module_id: ModuleId,
        config: ConfigMap,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            organization_id,
            module_id,
            is_enabled: true,
            config,
            enabled_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Re-assignment of an existing row: replace the config and force the
    /// module back on. `enabled_at` keeps its original value.
    pub fn reassign(&mut self, config: ConfigMap, now: DateTime<Utc>) {
        self.config = config;
        self.is_enabled = true;
        if self.enabled_at.is_none() {
            self.enabled_at = Some(now);
        }
        self.updated_at = now;
    }

    /// Merge only the fields present in `update`. `enabled_at` is stamped
    /// only on the first disabled-to-enabled transition.
    pub fn apply_update(&mut self, update: &AssignmentUpdate, now: DateTime<Utc>) {
        if let Some(config) = &update.config {
            self.config = config.clone();
        }
        if let Some(is_enabled) = update.is_enabled {
            if is_enabled && self.enabled_at.is_none() {
                self.enabled_at = Some(now);
            }
            self.is_enabled = is_enabled;
        }
        self.updated_at = now;
    }
}

/// Partial update of an assignment; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentUpdate {
    pub is_enabled: Option<bool>,
    pub config: Option<ConfigMap>,
}

impl AssignmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_enabled.is_none() && self.config.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assignment(now: DateTime<Utc>) -> ModuleAssignment {
        ModuleAssignment::new_enabled(
            OrganizationId::new(),
            ModuleId::new("crm").unwrap(),
            ConfigMap::new(),
            now,
        )
    }

    #[test]
    fn enabled_at_is_set_once_and_never_moves() {
        let t0 = Utc::now();
        let mut a = assignment(t0);
        assert_eq!(a.enabled_at, Some(t0));

        let t1 = t0 + chrono::Duration::minutes(5);
        a.apply_update(
            &AssignmentUpdate {
                is_enabled: Some(false),
                config: None,
            },
            t1,
        );
        assert!(!a.is_enabled);
        assert_eq!(a.enabled_at, Some(t0));

        let t2 = t1 + chrono::Duration::minutes(5);
        a.apply_update(
            &AssignmentUpdate {
                is_enabled: Some(true),
                config: None,
            },
            t2,
        );
        assert!(a.is_enabled);
        assert_eq!(a.enabled_at, Some(t0));
    }

    #[test]
    fn reassign_replaces_config_and_forces_enabled() {
        let t0 = Utc::now();
        let mut a = assignment(t0);
        a.apply_update(
            &AssignmentUpdate {
                is_enabled: Some(false),
                config: None,
            },
            t0,
        );

        let t1 = t0 + chrono::Duration::minutes(1);
        let cfg: ConfigMap = [("limit".to_string(), json!(50))].into_iter().collect();
        a.reassign(cfg.clone(), t1);

        assert!(a.is_enabled);
        assert_eq!(a.config, cfg);
        assert_eq!(a.enabled_at, Some(t0));
        assert_eq!(a.updated_at, t1);
    }

    #[test]
    fn config_only_update_does_not_touch_enablement() {
        let t0 = Utc::now();
        let mut a = assignment(t0);
        let t1 = t0 + chrono::Duration::minutes(1);
        a.apply_update(
            &AssignmentUpdate {
                is_enabled: None,
                config: Some([("k".to_string(), json!("v"))].into_iter().collect()),
            },
            t1,
        );
        assert!(a.is_enabled);
        assert_eq!(a.enabled_at, Some(t0));
        assert_eq!(a.config.get("k"), Some(&json!("v")));
    }
}
