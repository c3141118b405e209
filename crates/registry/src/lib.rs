//! `vergeerp-registry` — the authoritative catalog of installable modules.
//!
//! The registry is the single source of referential integrity for the whole
//! entitlement engine: no assignment and no industry link may reference a
//! module that is not present here. Modules are never hard-deleted;
//! deactivation is the terminal state.

pub mod descriptor;
pub mod store;

pub use descriptor::{ModuleDescriptor, ModuleUpdate};
pub use store::{ModuleRegistryStore, ValidatedModules};
