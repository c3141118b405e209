//! `vergeerp-industries` — named industry profiles.
//!
//! An industry template bundles a set of registry modules (with per-module
//! defaults and ordering) so a new tenant's entitlements can be bootstrapped
//! in one operation. Referential validation against the module registry
//! happens in the service layer: write paths are strict, read paths tolerate
//! links whose module has since been deactivated.

pub mod store;
pub mod template;

pub use store::IndustryTemplateStore;
pub use template::{IndustryModuleLink, IndustryTemplate, LinkUpdate, TemplateUpdate};
