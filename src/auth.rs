//! Password hashing and bearer token issuance/validation.
//!
//! Tokens are stateless HS256 JWTs carrying the username and role; there is
//! no server-side session or revocation list. Every validation failure is
//! collapsed into `AuthError::InvalidCredentials` so callers cannot tell a
//! malformed token from an expired one.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::models::UserRole;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Could not validate credentials")]
    InvalidCredentials,
    #[error("Failed to hash password")]
    Hash,
}

/// Claim set embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the authenticated user
    pub sub: String,
    pub role: UserRole,
    /// Expiry as a unix timestamp
    pub exp: usize,
}

pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|_| AuthError::Hash)?
        .to_string())
}

pub fn verify_password(hash: &str, plain: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

// ============================================================================
// Password composition policy
// ============================================================================

/// Characters accepted as the required symbol in a password.
pub const PASSWORD_SPECIAL_CHARS: &str = "@$!%*?&";

#[derive(Debug, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least 8 characters long")]
    TooShort,
    #[error("Password must be at most 100 characters long")]
    TooLong,
    #[error("Password must contain a lowercase letter")]
    MissingLowercase,
    #[error("Password must contain an uppercase letter")]
    MissingUppercase,
    #[error("Password must contain a digit")]
    MissingDigit,
    #[error("Password must contain a special character (@$!%*?&)")]
    MissingSpecial,
}

/// Check a plaintext password against the composition policy.
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    let length = password.chars().count();
    if length < 8 {
        return Err(PasswordPolicyError::TooShort);
    }
    if length > 100 {
        return Err(PasswordPolicyError::TooLong);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordPolicyError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordPolicyError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordPolicyError::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(PasswordPolicyError::MissingSpecial);
    }
    Ok(())
}

// ============================================================================
// Access tokens
// ============================================================================

pub fn create_access_token(
    username: &str,
    role: UserRole,
    secret: &str,
    ttl_minutes: i64,
) -> Result<String, AuthError> {
    let exp = (Utc::now() + Duration::minutes(ttl_minutes)).timestamp() as usize;
    let claims = Claims {
        sub: username.to_string(),
        role,
        exp,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidCredentials)
}

pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidCredentials)
}
