//! Authentication extractors. Every protected handler takes `AuthUser` (or
//! `AdminUser`) as an argument, so token validation and the role gate run
//! before any business logic.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::auth;
use crate::services::users::require_admin;
use crate::storage::models::UserRecord;
use crate::AppState;

/// The authenticated caller, resolved from the bearer token.
///
/// An invalid token and a token whose subject no longer exists are
/// deliberately indistinguishable: both reject with the same message.
pub struct AuthUser(pub UserRecord);

/// The authenticated caller, additionally required to hold the admin role.
pub struct AdminUser(pub UserRecord);

fn credentials_rejection() -> ApiError {
    ApiError::unauthorized("Could not validate credentials")
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(credentials_rejection)?;

        let claims = auth::verify_access_token(token, &state.config.secret_key)
            .map_err(|_| credentials_rejection())?;

        let user = state
            .db
            .get_user_by_username(&claims.sub)
            .map_err(|e| {
                tracing::error!(error = %e, "User lookup failed during authentication");
                ApiError::internal("Internal server error")
            })?
            .ok_or_else(credentials_rejection)?;

        Ok(AuthUser(user))
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        require_admin(&user).map_err(|_| ApiError::forbidden("Admin access required"))?;
        Ok(AdminUser(user))
    }
}

/// Paths reachable without any Authorization header present.
const OPEN_PATHS: &[&str] = &["/", "/_internal/health", "/auth/token", "/auth/register/"];

/// Gateway-level presence check: everything outside the open set must carry
/// an Authorization header. Actual token validation happens per-route.
pub async fn require_bearer(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<axum::response::Response, ApiError> {
    let path = request.uri().path();
    if !OPEN_PATHS.contains(&path) && !request.headers().contains_key(header::AUTHORIZATION) {
        return Err(ApiError::unauthorized("Authorization required"));
    }
    Ok(next.run(request).await)
}
