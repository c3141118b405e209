//! Cache key builders and TTLs.
//!
//! Keys are namespaced by what they cache so that invalidation can be
//! targeted: a tenant assignment change touches only that tenant's key, a
//! template change touches only that industry's keys, a registry change
//! touches only the registry listings.

use std::time::Duration;

use vergeerp_core::{IndustryCode, OrganizationId};

/// Per-tenant assignments change often; keep them fresh.
pub const ORG_MODULES_TTL: Duration = Duration::from_secs(300);

/// Industry templates are near-static.
pub const INDUSTRY_TTL: Duration = Duration::from_secs(3600);

/// The module registry sits in between.
pub const REGISTRY_TTL: Duration = Duration::from_secs(600);

/// Enabled modules of one organization.
pub fn org_modules(org_id: &OrganizationId) -> String {
    format!("org:{org_id}:modules")
}

/// Resolved module list of one industry template.
pub fn industry_modules(code: &IndustryCode) -> String {
    format!("industry:{code}:modules")
}

/// One industry template record.
pub fn industry_template(code: &IndustryCode) -> String {
    format!("industry:{code}:template")
}

/// All industry templates, or only the active ones.
pub fn industries_all(active_only: bool) -> String {
    if active_only {
        "industries:all:active".to_string()
    } else {
        "industries:all".to_string()
    }
}

/// The full module registry listing, or only the active modules.
pub fn registry_all(active_only: bool) -> String {
    if active_only {
        "modules:registry:all:active".to_string()
    } else {
        "modules:registry:all".to_string()
    }
}

/// Every key a template mutation can invalidate.
pub fn industry_keys(code: &IndustryCode) -> [String; 4] {
    [
        industry_modules(code),
        industry_template(code),
        industries_all(false),
        industries_all(true),
    ]
}

/// Every key a registry mutation can invalidate.
pub fn registry_keys() -> [String; 2] {
    [registry_all(false), registry_all(true)]
}
