//! `vergeerp-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod config;
pub mod error;
pub mod id;

pub use config::ConfigMap;
pub use error::{DomainError, DomainResult, StoreError};
pub use id::{IndustryCode, ModuleId, OrganizationId, UserId};
