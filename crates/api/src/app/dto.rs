//! Request DTOs.
//!
//! Responses serialize the domain types directly; only inbound shapes need
//! their own structs (id fields arrive as plain strings and are validated
//! into their newtypes in the handlers).

use serde::Deserialize;

use vergeerp_core::ConfigMap;

#[derive(Debug, Deserialize)]
pub struct RegisterModuleRequest {
    pub module_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub api_endpoint: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub metadata: ConfigMap,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub industry_code: String,
    pub industry_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AddLinkRequest {
    pub module_id: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub default_config: ConfigMap,
    #[serde(default)]
    pub display_order: u32,
}

#[derive(Debug, Deserialize)]
pub struct AssignModuleRequest {
    pub module_id: String,
    #[serde(default)]
    pub config: ConfigMap,
}

#[derive(Debug, Deserialize)]
pub struct BulkAssignRequest {
    pub module_ids: Vec<String>,
    pub industry_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyTemplateRequest {
    pub industry_code: String,
}
