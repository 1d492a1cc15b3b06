use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service_error;
use super::users::{user_to_response, UserResponse};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth;
use crate::services::users as user_service;
use crate::storage::models::UserRole;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<JSend<UserResponse>>), ApiError> {
    let role = match req.role.as_deref() {
        Some(role) => UserRole::parse(role)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown role: {role}")))?,
        None => UserRole::User,
    };

    let user = user_service::register(&state.db, &req.username, &req.email, &req.password, role)
        .map_err(service_error)?;

    Ok((StatusCode::CREATED, JSend::success(user_to_response(&user))))
}

pub async fn login_for_access_token(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TokenForm>,
) -> Result<Json<JSend<TokenResponse>>, ApiError> {
    let user = user_service::authenticate_credentials(&state.db, &form.username, &form.password)
        .map_err(service_error)?;

    let access_token = auth::create_access_token(
        &user.username,
        user.role,
        &state.config.secret_key,
        state.config.token_ttl_minutes,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Token issuance failed");
        ApiError::internal("Internal server error")
    })?;

    Ok(JSend::success(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
