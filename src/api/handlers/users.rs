use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service_error;
use crate::api::extract::{AdminUser, AuthUser};
use crate::api::response::{ApiError, AppJson, AppQuery, JSend, JSendPaginated, Pagination};
use crate::services::users as user_service;
use crate::services::users::ProfileUpdate;
use crate::storage::models::UserRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub joined_date: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserDeleteResponse {
    pub user: UserResponse,
    pub message: String,
}

fn default_limit() -> u32 {
    10
}

pub(super) fn user_to_response(user: &UserRecord) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        joined_date: user.joined_date.to_rfc3339(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn read_profile(AuthUser(user): AuthUser) -> Json<JSend<UserResponse>> {
    JSend::success(user_to_response(&user))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> Result<Json<JSend<UserResponse>>, ApiError> {
    if req.username.is_none() && req.email.is_none() && req.password.is_none() {
        return Err(ApiError::bad_request(
            "at least one field (username, email, password) must be provided",
        ));
    }

    let update = ProfileUpdate {
        username: req.username,
        email: req.email,
        password: req.password,
    };
    let updated =
        user_service::update_profile(&state.db, &user.id, &update).map_err(service_error)?;

    Ok(JSend::success(user_to_response(&updated)))
}

pub async fn admin_list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    AppQuery(params): AppQuery<ListUsersParams>,
) -> Result<Json<JSendPaginated<UserResponse>>, ApiError> {
    let users = user_service::list_users(
        &state.db,
        params.limit,
        params.offset,
        params.search.as_deref(),
    )
    .map_err(service_error)?;

    let items: Vec<UserResponse> = users.iter().map(user_to_response).collect();
    Ok(JSendPaginated::success(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
        },
    ))
}

pub async fn admin_get_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<JSend<UserResponse>>, ApiError> {
    let user = user_service::get_user(&state.db, &user_id).map_err(service_error)?;
    Ok(JSend::success(user_to_response(&user)))
}

pub async fn admin_delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<JSend<UserDeleteResponse>>, ApiError> {
    let user = user_service::delete_user(&state.db, state.files.as_ref(), &user_id)
        .await
        .map_err(service_error)?;

    Ok(JSend::success(UserDeleteResponse {
        message: format!("User with id {user_id} has been deleted"),
        user: user_to_response(&user),
    }))
}
