//! `vergeerp-entitlements` — per-tenant module enablement.
//!
//! The [`EntitlementService`] is the façade over the registry, template and
//! assignment stores. Every mutation follows the same sequence: validate
//! against the registry, persist, invalidate the affected cache keys, publish
//! an event. Validation failures short-circuit before any write; cache and
//! event failures are logged and never fail the operation.

pub mod assignment;
pub mod invalidator;
pub mod organization;
pub mod service;
pub mod store;

pub use assignment::{AssignmentUpdate, ModuleAssignment};
pub use invalidator::CacheInvalidator;
pub use organization::{OrganizationDirectory, OrganizationRecord};
pub use service::{EntitlementService, NewLink, NewModule, NewTemplate};
pub use store::AssignmentStore;
