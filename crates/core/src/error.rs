//! Domain error model.

use thiserror::Error;

use crate::id::ModuleId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Infrastructure failure talking to the relational store.
///
/// Always retryable from the caller's point of view: the operation performed
/// no cache or event side effects before failing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded its bounded timeout.
    #[error("store timeout: {0}")]
    Timeout(String),

    /// The backend rejected or failed the query.
    #[error("store query failed: {0}")]
    Query(String),
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// referential integrity, conflicts). Cache and event-bus failures never show
/// up here: they are absorbed by the service layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced entity (module, template, link, assignment, organization)
    /// does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A duplicate-create was attempted.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The `(template, module)` pair is already linked.
    #[error("module '{module_id}' already linked to industry '{industry_code}'")]
    AlreadyLinked {
        industry_code: String,
        module_id: ModuleId,
    },

    /// One or more referenced module ids are missing or inactive, or a
    /// template has no assignable modules. `invalid_modules` enumerates the
    /// offending ids so the caller can correct its input.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        invalid_modules: Vec<ModuleId>,
    },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The relational store failed; retryable, no partial side effects.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            invalid_modules: Vec::new(),
        }
    }

    pub fn invalid_modules(msg: impl Into<String>, invalid: Vec<ModuleId>) -> Self {
        Self::Validation {
            message: msg.into(),
            invalid_modules: invalid,
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_carries_invalid_ids() {
        let err = DomainError::invalid_modules(
            "unknown modules",
            vec![ModuleId::new("legacy").unwrap()],
        );
        match err {
            DomainError::Validation {
                invalid_modules, ..
            } => {
                assert_eq!(invalid_modules.len(), 1);
                assert_eq!(invalid_modules[0].as_str(), "legacy");
            }
            _ => panic!("expected Validation"),
        }
    }

    #[test]
    fn store_error_converts_into_domain_error() {
        let err: DomainError = StoreError::Timeout("select".into()).into();
        assert!(matches!(err, DomainError::Store(StoreError::Timeout(_))));
    }
}
