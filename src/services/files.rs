//! File lifecycle: upload validation and storage, listings, rename/delete
//! with filesystem/metadata synchronization, share links, and per-user
//! analytics.
//!
//! Disk and metadata mutations are not transactional with each other. Writes
//! go to disk first and commit metadata second; deletes remove the disk
//! object first and the metadata row second. The windows in between are
//! accepted and repaired only by external maintenance.

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;

use super::{validate_pagination, ServiceError};
use crate::file_store::{FileStore, FileStoreError};
use crate::storage::models::{is_allowed_file_type, FileRecord};
use crate::storage::Database;

#[derive(Debug, Serialize)]
pub struct FileShare {
    pub file_id: String,
    pub share_link: String,
}

#[derive(Debug, Serialize)]
pub struct FileAnalytics {
    pub total_files: u64,
    pub total_size: u64,
    pub formatted_size: String,
}

/// Validate and store an upload: disk write first, metadata commit second.
/// The recorded size is the actual on-disk byte count after the write.
pub async fn upload(
    db: &Database,
    store: &dyn FileStore,
    owner_id: &str,
    filename: &str,
    content_type: &str,
    data: Bytes,
    max_size: u64,
) -> Result<FileRecord, ServiceError> {
    if !is_allowed_file_type(content_type) {
        return Err(ServiceError::UnsupportedMediaType(content_type.to_string()));
    }

    if data.len() as u64 > max_size {
        return Err(ServiceError::PayloadTooLarge(max_size));
    }

    validate_object_name(filename)?;

    if db.get_user(owner_id)?.is_none() {
        return Err(ServiceError::NotFound("User not found".to_string()));
    }

    // Uploads are keyed by declared filename, so a name already on disk
    // belongs to an earlier upload.
    if store
        .exists(filename)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
    {
        return Err(ServiceError::Conflict(format!(
            "A file named '{filename}' already exists"
        )));
    }

    let file_size = store
        .put(filename, data)
        .await
        .map_err(|e| ServiceError::Internal(format!("Failed to store file: {e}")))?;

    let file = FileRecord {
        id: uuid::Uuid::new_v4().to_string(),
        filename: filename.to_string(),
        file_path: store.location(filename),
        upload_date: Utc::now(),
        file_size,
        file_type: content_type.to_string(),
        owner_id: owner_id.to_string(),
    };
    db.put_file(&file)?;

    tracing::debug!(file_id = %file.id, filename = %file.filename, owner_id = %owner_id, "Uploaded file");
    Ok(file)
}

/// List files, restricted to an owner or (for admin callers) across all
/// owners, with pagination and optional filename search.
pub fn list(
    db: &Database,
    owner_id: Option<&str>,
    limit: u32,
    offset: u32,
    search: Option<&str>,
) -> Result<Vec<FileRecord>, ServiceError> {
    validate_pagination(limit)?;

    let files = db.list_files(owner_id, search)?;
    Ok(files
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect())
}

/// Ownership-scoped lookup.
pub fn get(db: &Database, file_id: &str, owner_id: &str) -> Result<FileRecord, ServiceError> {
    db.get_file_owned(file_id, owner_id)?
        .ok_or_else(|| ServiceError::NotFound("File not found".to_string()))
}

/// Rename a file, preserving the original extension. The disk object moves
/// first; filename and file_path are committed together only if it succeeds.
pub async fn rename(
    db: &Database,
    store: &dyn FileStore,
    file_id: &str,
    owner_id: &str,
    new_base_name: &str,
) -> Result<FileRecord, ServiceError> {
    validate_object_name(new_base_name)?;

    let file = get(db, file_id, owner_id)?;

    let extension = match file.filename.rfind('.') {
        Some(idx) => &file.filename[idx..],
        None => "",
    };
    let new_filename = format!("{new_base_name}{extension}");

    if new_filename != file.filename
        && store
            .exists(&new_filename)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?
    {
        return Err(ServiceError::Conflict(format!(
            "A file named '{new_filename}' already exists"
        )));
    }

    match store.rename(&file.filename, &new_filename).await {
        Ok(()) => {}
        Err(FileStoreError::NotFound(_)) => {
            return Err(ServiceError::NotFound(
                "Original file not found on disk".to_string(),
            ));
        }
        Err(e) => {
            return Err(ServiceError::Internal(format!("Error renaming file: {e}")));
        }
    }

    let new_path = store.location(&new_filename);
    if !db.rename_file(file_id, &new_filename, &new_path)? {
        return Err(ServiceError::Internal(
            "File not found after rename".to_string(),
        ));
    }

    tracing::debug!(file_id = %file_id, from = %file.filename, to = %new_filename, "Renamed file");
    get(db, file_id, owner_id)
}

/// Delete a file: disk object first, metadata row only once the disk removal
/// succeeded. Returns the record's last-known values.
pub async fn delete(
    db: &Database,
    store: &dyn FileStore,
    file_id: &str,
    owner_id: &str,
) -> Result<FileRecord, ServiceError> {
    let file = get(db, file_id, owner_id)?;

    match store.delete(&file.filename).await {
        Ok(()) => {}
        Err(FileStoreError::NotFound(_)) => {
            return Err(ServiceError::NotFound(
                "File not found on disk".to_string(),
            ));
        }
        Err(e) => {
            return Err(ServiceError::Internal(format!("Error deleting file: {e}")));
        }
    }

    db.delete_file(file_id)?;

    tracing::debug!(file_id = %file_id, filename = %file.filename, "Deleted file");
    Ok(file)
}

/// Build the deterministic public link for a file. Ownership-scoped like
/// `get`; the link itself embeds no token or expiry.
pub fn share_link(
    db: &Database,
    file_id: &str,
    owner_id: &str,
    base_url: &str,
) -> Result<FileShare, ServiceError> {
    let file = get(db, file_id, owner_id)?;

    Ok(FileShare {
        file_id: file.id.clone(),
        share_link: format!("{base_url}/file/shared/{}", file.id),
    })
}

/// Resolve a file for the shared download route. By default any
/// authenticated user may fetch any file by id; `owner_only` restricts the
/// route to the file's owner.
pub async fn fetch_for_download(
    db: &Database,
    store: &dyn FileStore,
    file_id: &str,
    requester_id: &str,
    owner_only: bool,
) -> Result<FileRecord, ServiceError> {
    let file = if owner_only {
        get(db, file_id, requester_id)?
    } else {
        db.get_file(file_id)?
            .ok_or_else(|| ServiceError::NotFound("File not found".to_string()))?
    };

    if !store
        .exists(&file.filename)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
    {
        return Err(ServiceError::NotFound("File not found".to_string()));
    }

    Ok(file)
}

/// Per-user file count and total size, with a human-readable rendering.
pub fn analytics(db: &Database, owner_id: &str) -> Result<FileAnalytics, ServiceError> {
    let files = db.get_files_by_owner(owner_id)?;

    let total_files = files.len() as u64;
    let total_size: u64 = files.iter().map(|f| f.file_size).sum();

    Ok(FileAnalytics {
        total_files,
        total_size,
        formatted_size: format_size(total_size),
    })
}

/// Scale a byte count by repeated division by 1024, rendering two decimal
/// places with the first unit under which the value drops below 1024.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, UNITS[unit])
}

/// Uploads and renames take bare filenames; anything that could escape the
/// storage root is rejected.
fn validate_object_name(name: &str) -> Result<(), ServiceError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(ServiceError::Validation("Invalid filename".to_string()));
    }
    Ok(())
}
