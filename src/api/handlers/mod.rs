mod auth;
mod files;
mod system;
mod users;

use crate::api::response::ApiError;
use crate::services::ServiceError;

pub use auth::{login_for_access_token, register_user};
pub use files::{
    delete_file, download_file, file_analytics, get_file, list_all_files, list_user_files,
    share_file_link, update_file, upload_file,
};
pub use system::{health, home};
pub use users::{
    admin_delete_user, admin_get_user, admin_list_users, read_profile, update_profile,
};

/// Map a ServiceError to an ApiError. Internal detail is logged, never sent.
fn service_error(e: ServiceError) -> ApiError {
    match e {
        ServiceError::Validation(msg) => ApiError::bad_request(msg),
        ServiceError::Conflict(msg) => ApiError::conflict(msg),
        ServiceError::InvalidCredentials => {
            ApiError::unauthorized("Could not validate credentials")
        }
        ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
        ServiceError::NotFound(msg) => ApiError::not_found(msg),
        ServiceError::UnsupportedMediaType(mime) => {
            ApiError::unsupported_media_type(format!("Unsupported file type: {mime}"))
        }
        ServiceError::PayloadTooLarge(max) => ApiError::payload_too_large(format!(
            "File exceeds maximum upload size of {max} bytes"
        )),
        ServiceError::Internal(msg) => {
            tracing::error!(error = %msg, "Request failed");
            ApiError::internal("Internal server error")
        }
    }
}
