//! Business logic for account and file management, independent of the HTTP
//! layer. Handlers translate `ServiceError` into transport status codes at
//! the boundary; nothing in here knows about axum.

pub mod files;
pub mod users;

use thiserror::Error;

use crate::storage::DatabaseError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Could not validate credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Unsupported file type: {0}")]
    UnsupportedMediaType(String),
    #[error("File exceeds maximum upload size of {0} bytes")]
    PayloadTooLarge(u64),
    #[error("{0}")]
    Internal(String),
}

impl From<DatabaseError> for ServiceError {
    fn from(e: DatabaseError) -> Self {
        match e {
            // The index-level uniqueness backstop; racing registrations can
            // both pass the service-level check and one must lose here.
            DatabaseError::Duplicate(_) => {
                ServiceError::Conflict("Username or email already exists".to_string())
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Shared pagination contract for user and file listings.
pub(crate) fn validate_pagination(limit: u32) -> Result<(), ServiceError> {
    if limit == 0 {
        return Err(ServiceError::Validation(
            "limit must be greater than 0".to_string(),
        ));
    }
    if limit > 100 {
        return Err(ServiceError::Validation(
            "limit must be at most 100".to_string(),
        ));
    }
    Ok(())
}
