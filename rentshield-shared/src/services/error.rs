//! Engine-level error taxonomy
//!
//! Every engine operation fails with a [`ServiceError`]; the HTTP layer maps
//! each variant to exactly one status code.

use thiserror::Error;

use crate::auth::{authorization::AuthzError, password::PasswordError};
use crate::store::StoreError;

/// Failure of a workflow operation
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input; the caller must fix the request
    #[error("{0}")]
    Validation(String),

    /// No valid session, or bad credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Valid session, wrong role or not the owner
    #[error("{0}")]
    Forbidden(String),

    /// The referenced entity doesn't exist
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness or state precondition failed
    #[error("{0}")]
    Conflict(String),

    /// Storage or another collaborator failed or timed out
    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        ServiceError::NotFound(format!("{entity} not found"))
    }

    /// Whether a listing may degrade to empty on this error
    pub fn is_dependency(&self) -> bool {
        matches!(self, ServiceError::Dependency(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                ServiceError::Conflict(format!("Duplicate value violates {constraint}"))
            }
            StoreError::Backend(msg) => ServiceError::Dependency(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Dependency(err.to_string())
    }
}

/// Result type for engine operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        let err: ServiceError = StoreError::Backend("pool timed out".into()).into();
        assert!(err.is_dependency());

        let err: ServiceError = StoreError::Conflict("users_email_key".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn test_authz_error_is_forbidden() {
        let err: ServiceError = AuthzError::NotOwner.into();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ServiceError::not_found("Task").to_string(), "Task not found");
    }
}
