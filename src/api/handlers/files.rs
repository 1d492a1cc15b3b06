use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service_error;
use crate::api::extract::{AdminUser, AuthUser};
use crate::api::response::{ApiError, AppJson, AppQuery, JSend, JSendPaginated, Pagination};
use crate::services::files as file_service;
use crate::services::files::{FileAnalytics, FileShare};
use crate::storage::models::FileRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub filename: String,
    pub file_path: String,
    pub upload_date: String,
    pub file_size: u64,
    pub file_type: String,
    pub owner_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFileRequest {
    /// New base name; the current extension is preserved.
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileDeleteResponse {
    pub file: FileResponse,
    pub message: String,
}

fn default_limit() -> u32 {
    10
}

/// Body-limit overruns surface from the multipart reader, not the service
/// layer; they must still come back as 413.
fn multipart_error(e: MultipartError, max_size: u64) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(format!(
            "File exceeds maximum upload size of {max_size} bytes"
        ))
    } else {
        ApiError::bad_request(format!("Invalid multipart data: {e}"))
    }
}

fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        id: file.id.clone(),
        filename: file.filename.clone(),
        file_path: file.file_path.clone(),
        upload_date: file.upload_date.to_rfc3339(),
        file_size: file.file_size,
        file_type: file.file_type.clone(),
        owner_id: file.owner_id.clone(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let mut upload: Option<(String, String, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.config.max_upload_size))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("file field must include a filename"))?;

        // Prefer the declared Content-Type, falling back to a guess from the
        // filename extension.
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .filter(|ct| ct != "application/octet-stream")
            .or_else(|| {
                mime_guess::from_path(&filename)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.config.max_upload_size))?;

        upload = Some((filename, content_type, data));
    }

    let (filename, content_type, data) =
        upload.ok_or_else(|| ApiError::bad_request("file field is required"))?;

    let file = file_service::upload(
        &state.db,
        state.files.as_ref(),
        &user.id,
        &filename,
        &content_type,
        data,
        state.config.max_upload_size,
    )
    .await
    .map_err(service_error)?;

    Ok(JSend::success(file_to_response(&file)))
}

pub async fn list_user_files(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSendPaginated<FileResponse>>, ApiError> {
    let files = file_service::list(
        &state.db,
        Some(&user.id),
        params.limit,
        params.offset,
        params.search.as_deref(),
    )
    .map_err(service_error)?;

    let items: Vec<FileResponse> = files.iter().map(file_to_response).collect();
    Ok(JSendPaginated::success(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
        },
    ))
}

pub async fn list_all_files(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSendPaginated<FileResponse>>, ApiError> {
    let files = file_service::list(
        &state.db,
        None,
        params.limit,
        params.offset,
        params.search.as_deref(),
    )
    .map_err(service_error)?;

    let items: Vec<FileResponse> = files.iter().map(file_to_response).collect();
    Ok(JSendPaginated::success(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
        },
    ))
}

pub async fn file_analytics(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<JSend<FileAnalytics>>, ApiError> {
    let analytics = file_service::analytics(&state.db, &user.id).map_err(service_error)?;
    Ok(JSend::success(analytics))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = file_service::get(&state.db, &file_id, &user.id).map_err(service_error)?;
    Ok(JSend::success(file_to_response(&file)))
}

pub async fn update_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(file_id): Path<String>,
    AppJson(req): AppJson<UpdateFileRequest>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let new_base_name = req
        .filename
        .ok_or_else(|| ApiError::bad_request("filename must be provided"))?;

    let file = file_service::rename(
        &state.db,
        state.files.as_ref(),
        &file_id,
        &user.id,
        &new_base_name,
    )
    .await
    .map_err(service_error)?;

    Ok(JSend::success(file_to_response(&file)))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<JSend<FileDeleteResponse>>, ApiError> {
    let file = file_service::delete(&state.db, state.files.as_ref(), &file_id, &user.id)
        .await
        .map_err(service_error)?;

    Ok(JSend::success(FileDeleteResponse {
        message: format!("File '{}' has been successfully deleted.", file.filename),
        file: file_to_response(&file),
    }))
}

pub async fn share_file_link(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<JSend<FileShare>>, ApiError> {
    let share = file_service::share_link(&state.db, &file_id, &user.id, &state.config.base_url)
        .map_err(service_error)?;
    Ok(JSend::success(share))
}

/// Serve file content for a share link.
/// Route: GET /file/shared/:file_id
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let file = file_service::fetch_for_download(
        &state.db,
        state.files.as_ref(),
        &file_id,
        &user.id,
        state.config.shared_download_owner_only,
    )
    .await
    .map_err(service_error)?;

    let data = state
        .files
        .get(&file.filename)
        .await
        .map_err(|e| match e {
            crate::file_store::FileStoreError::NotFound(_) => {
                ApiError::not_found("File not found")
            }
            _ => {
                tracing::error!(error = %e, file_id = %file.id, "Failed to read file content");
                ApiError::internal("Internal server error")
            }
        })?;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        file.file_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        header::HeaderValue::from(file.file_size),
    );

    if let Ok(value) = format!("attachment; filename=\"{}\"", file.filename).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
