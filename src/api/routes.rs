use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::extract::require_bearer;
use super::handlers;
use crate::AppState;

/// Multipart framing (boundary lines, part headers) counts toward the
/// transport body limit, so it must sit above the per-file maximum for an
/// exactly-max-size upload to reach the handler.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(handlers::home))
        // Auth
        .route("/auth/register/", post(handlers::register_user))
        .route("/auth/token", post(handlers::login_for_access_token))
        // Profiles
        .route("/user/profile/", get(handlers::read_profile))
        .route("/user/profile/", put(handlers::update_profile))
        // User administration
        .route("/user/admin/users/", get(handlers::admin_list_users))
        .route("/user/admin/:user_id/", get(handlers::admin_get_user))
        .route("/user/admin/:user_id/", delete(handlers::admin_delete_user))
        // Files
        .route(
            "/file/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/file/files", get(handlers::list_user_files))
        .route("/file/admin", get(handlers::list_all_files))
        .route("/file/analytics", get(handlers::file_analytics))
        .route("/file/shared/:file_id", get(handlers::download_file))
        .route("/file/:file_id", get(handlers::get_file))
        .route("/file/:file_id", put(handlers::update_file))
        .route("/file/:file_id", delete(handlers::delete_file))
        .route("/file/:file_id/share", post(handlers::share_file_link))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(middleware::from_fn(require_bearer))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
