//! Account registration, credential checks, profile updates, and the
//! admin-only user management operations.

use chrono::Utc;

use super::{validate_pagination, ServiceError};
use crate::auth;
use crate::file_store::FileStore;
use crate::storage::models::{UserRecord, UserRole};
use crate::storage::Database;

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Register a new user. Uniqueness is checked against username and email in
/// one combined lookup before any mutation.
pub fn register(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
    role: UserRole,
) -> Result<UserRecord, ServiceError> {
    validate_username(username)?;
    validate_email(email)?;
    auth::validate_password(password).map_err(|e| ServiceError::Validation(e.to_string()))?;

    if db.credentials_in_use(Some(username), Some(email), None)? {
        return Err(ServiceError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let password_hash = auth::hash_password(password)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    let user = UserRecord {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        role,
        joined_date: Utc::now(),
    };
    db.put_user(&user)?;

    tracing::debug!(user_id = %user.id, username = %user.username, "Registered user");
    Ok(user)
}

/// Check a username/password pair. Unknown usernames and wrong passwords are
/// indistinguishable to the caller.
pub fn authenticate_credentials(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<UserRecord, ServiceError> {
    let user = db
        .get_user_by_username(username)?
        .ok_or(ServiceError::InvalidCredentials)?;

    if !auth::verify_password(&user.password_hash, password) {
        return Err(ServiceError::InvalidCredentials);
    }

    Ok(user)
}

/// Role gate used by every admin-only operation.
pub fn require_admin(user: &UserRecord) -> Result<&UserRecord, ServiceError> {
    if user.role != UserRole::Admin {
        return Err(ServiceError::Forbidden("Admin access required".to_string()));
    }
    Ok(user)
}

/// Apply a partial profile update. Provided fields are validated the same way
/// as at registration; passwords are always re-hashed.
pub fn update_profile(
    db: &Database,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<UserRecord, ServiceError> {
    if let Some(ref username) = update.username {
        validate_username(username)?;
    }
    if let Some(ref email) = update.email {
        validate_email(email)?;
    }

    // Re-check uniqueness against everyone but the user themselves; the
    // username and email indexes must never alias two accounts.
    if db.credentials_in_use(
        update.username.as_deref(),
        update.email.as_deref(),
        Some(user_id),
    )? {
        return Err(ServiceError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let password_hash = match update.password {
        Some(ref password) => {
            auth::validate_password(password)
                .map_err(|e| ServiceError::Validation(e.to_string()))?;
            Some(
                auth::hash_password(password)
                    .map_err(|e| ServiceError::Internal(e.to_string()))?,
            )
        }
        None => None,
    };

    let updated = db.update_user(
        user_id,
        update.username.as_deref(),
        update.email.as_deref(),
        password_hash.as_deref(),
    )?;
    if !updated {
        return Err(ServiceError::NotFound("User not found".to_string()));
    }

    db.get_user(user_id)?
        .ok_or_else(|| ServiceError::Internal("User not found after update".to_string()))
}

/// List users with pagination and an optional case-insensitive search over
/// username and email.
pub fn list_users(
    db: &Database,
    limit: u32,
    offset: u32,
    search: Option<&str>,
) -> Result<Vec<UserRecord>, ServiceError> {
    validate_pagination(limit)?;

    let users = db.list_users(search)?;
    Ok(users
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect())
}

pub fn get_user(db: &Database, id: &str) -> Result<UserRecord, ServiceError> {
    db.get_user(id)?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
}

/// Delete a user along with their file records and disk objects, so no file
/// is left pointing at a missing owner. Returns the deleted record.
pub async fn delete_user(
    db: &Database,
    store: &dyn FileStore,
    id: &str,
) -> Result<UserRecord, ServiceError> {
    let files = db.get_files_by_owner(id)?;
    for file in files {
        if let Err(e) = store.delete(&file.filename).await {
            tracing::warn!(file_id = %file.id, error = %e, "Failed to remove file content for deleted user");
        }
        db.delete_file(&file.id)?;
    }

    let user = db
        .delete_user(id)?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

    tracing::debug!(user_id = %id, "Deleted user");
    Ok(user)
}

fn validate_username(username: &str) -> Result<(), ServiceError> {
    if username.is_empty() {
        return Err(ServiceError::Validation(
            "Username must not be empty".to_string(),
        ));
    }
    if username.chars().count() > 100 {
        return Err(ServiceError::Validation(
            "Username must be at most 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ServiceError::Validation(
            "Invalid email address".to_string(),
        ));
    }
    Ok(())
}
