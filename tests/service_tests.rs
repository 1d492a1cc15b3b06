use bytes::Bytes;
use filehub::file_store::{FileStore, LocalStore};
use filehub::services::files as file_service;
use filehub::services::files::format_size;
use filehub::services::users as user_service;
use filehub::services::users::ProfileUpdate;
use filehub::services::ServiceError;
use filehub::storage::models::{UserRecord, UserRole};
use filehub::storage::Database;

const MAX_UPLOAD: u64 = 1024 * 1024;

fn test_env() -> (tempfile::TempDir, Database, LocalStore) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    let store = LocalStore::new(dir.path().join("uploads")).unwrap();
    (dir, db, store)
}

fn register_user(db: &Database, username: &str) -> UserRecord {
    user_service::register(
        db,
        username,
        &format!("{username}@example.com"),
        "Abcdef1!",
        UserRole::User,
    )
    .unwrap()
}

// ============================================================================
// Registration and credentials
// ============================================================================

#[test]
fn test_register_then_authenticate() {
    let (_dir, db, _store) = test_env();

    let user = user_service::register(&db, "alice", "alice@example.com", "Abcdef1!", UserRole::User)
        .unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, UserRole::User);

    let authed = user_service::authenticate_credentials(&db, "alice", "Abcdef1!").unwrap();
    assert_eq!(authed.id, user.id);
}

#[test]
fn test_authenticate_bad_credentials() {
    let (_dir, db, _store) = test_env();
    register_user(&db, "alice");

    // Wrong password and unknown user produce the same error
    assert!(matches!(
        user_service::authenticate_credentials(&db, "alice", "Wrong1!pass"),
        Err(ServiceError::InvalidCredentials)
    ));
    assert!(matches!(
        user_service::authenticate_credentials(&db, "nobody", "Abcdef1!"),
        Err(ServiceError::InvalidCredentials)
    ));
}

#[test]
fn test_register_duplicate_username_conflicts() {
    let (_dir, db, _store) = test_env();
    register_user(&db, "alice");

    let result =
        user_service::register(&db, "alice", "other@example.com", "Abcdef1!", UserRole::User);
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
}

#[test]
fn test_register_duplicate_email_conflicts() {
    let (_dir, db, _store) = test_env();
    register_user(&db, "alice");

    let result =
        user_service::register(&db, "alice2", "alice@example.com", "Abcdef1!", UserRole::User);
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
}

#[test]
fn test_register_weak_password_rejected() {
    let (_dir, db, _store) = test_env();

    let result =
        user_service::register(&db, "alice", "alice@example.com", "abcdefgh", UserRole::User);
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    // Nothing was persisted
    assert!(db.get_user_by_username("alice").unwrap().is_none());
}

#[test]
fn test_register_invalid_email_rejected() {
    let (_dir, db, _store) = test_env();

    for email in ["not-an-email", "@example.com", "alice@", "alice@nodot"] {
        let result = user_service::register(&db, "alice", email, "Abcdef1!", UserRole::User);
        assert!(
            matches!(result, Err(ServiceError::Validation(_))),
            "expected rejection for {email}"
        );
    }
}

// ============================================================================
// Profile updates
// ============================================================================

#[test]
fn test_update_profile_rehashes_password() {
    let (_dir, db, _store) = test_env();
    let user = register_user(&db, "alice");

    let update = ProfileUpdate {
        password: Some("Newpass1!".to_string()),
        ..Default::default()
    };
    let updated = user_service::update_profile(&db, &user.id, &update).unwrap();

    // Stored value is a hash, not the plaintext
    assert_ne!(updated.password_hash, "Newpass1!");
    assert!(user_service::authenticate_credentials(&db, "alice", "Newpass1!").is_ok());
    assert!(user_service::authenticate_credentials(&db, "alice", "Abcdef1!").is_err());
}

#[test]
fn test_update_profile_partial_fields() {
    let (_dir, db, _store) = test_env();
    let user = register_user(&db, "alice");

    let update = ProfileUpdate {
        email: Some("new@example.com".to_string()),
        ..Default::default()
    };
    let updated = user_service::update_profile(&db, &user.id, &update).unwrap();

    assert_eq!(updated.email, "new@example.com");
    assert_eq!(updated.username, "alice");
}

#[test]
fn test_update_profile_duplicate_username_conflicts() {
    let (_dir, db, _store) = test_env();
    register_user(&db, "alice");
    let bob = register_user(&db, "bob");

    let update = ProfileUpdate {
        username: Some("alice".to_string()),
        ..Default::default()
    };
    let result = user_service::update_profile(&db, &bob.id, &update);
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
}

#[test]
fn test_update_profile_keeping_own_username_is_fine() {
    let (_dir, db, _store) = test_env();
    let user = register_user(&db, "alice");

    let update = ProfileUpdate {
        username: Some("alice".to_string()),
        email: Some("fresh@example.com".to_string()),
        ..Default::default()
    };
    let updated = user_service::update_profile(&db, &user.id, &update).unwrap();
    assert_eq!(updated.email, "fresh@example.com");
}

// ============================================================================
// Admin gate and user administration
// ============================================================================

#[test]
fn test_require_admin() {
    let (_dir, db, _store) = test_env();
    let user = register_user(&db, "alice");
    let admin =
        user_service::register(&db, "root", "root@example.com", "Abcdef1!", UserRole::Admin)
            .unwrap();

    assert!(matches!(
        user_service::require_admin(&user),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(user_service::require_admin(&admin).is_ok());
}

#[test]
fn test_list_users_pagination_limits() {
    let (_dir, db, _store) = test_env();
    for i in 0..5 {
        register_user(&db, &format!("user{i}"));
    }

    assert_eq!(user_service::list_users(&db, 2, 0, None).unwrap().len(), 2);
    assert_eq!(user_service::list_users(&db, 10, 3, None).unwrap().len(), 2);

    assert!(matches!(
        user_service::list_users(&db, 0, 0, None),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        user_service::list_users(&db, 101, 0, None),
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn test_delete_user_removes_their_files() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let file = file_service::upload(
        &db,
        &store,
        &user.id,
        "doc.pdf",
        "application/pdf",
        Bytes::from("content"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    let deleted = user_service::delete_user(&db, &store, &user.id).await.unwrap();
    assert_eq!(deleted.username, "alice");

    assert!(db.get_user(&user.id).unwrap().is_none());
    assert!(db.get_file(&file.id).unwrap().is_none());
    assert!(!store.exists("doc.pdf").await.unwrap());
}

#[tokio::test]
async fn test_delete_user_not_found() {
    let (_dir, db, store) = test_env();
    let result = user_service::delete_user(&db, &store, "nonexistent").await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_rejects_disallowed_type() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let result = file_service::upload(
        &db,
        &store,
        &user.id,
        "archive.zip",
        "application/zip",
        Bytes::from("data"),
        MAX_UPLOAD,
    )
    .await;
    assert!(matches!(result, Err(ServiceError::UnsupportedMediaType(_))));
}

#[tokio::test]
async fn test_upload_rejects_oversize_payload() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let oversized = Bytes::from(vec![0u8; (MAX_UPLOAD + 1) as usize]);
    let result = file_service::upload(
        &db,
        &store,
        &user.id,
        "big.pdf",
        "application/pdf",
        oversized,
        MAX_UPLOAD,
    )
    .await;
    assert!(matches!(result, Err(ServiceError::PayloadTooLarge(_))));
    assert!(!store.exists("big.pdf").await.unwrap());
}

#[tokio::test]
async fn test_upload_records_actual_size() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let payload = Bytes::from(vec![7u8; 10 * 1024]);
    let file = file_service::upload(
        &db,
        &store,
        &user.id,
        "doc.pdf",
        "application/pdf",
        payload.clone(),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    assert_eq!(file.file_size, payload.len() as u64);
    assert_eq!(file.file_type, "application/pdf");
    assert!(store.exists("doc.pdf").await.unwrap());
    assert!(db.get_file(&file.id).unwrap().is_some());
}

#[tokio::test]
async fn test_upload_unknown_owner() {
    let (_dir, db, store) = test_env();

    let result = file_service::upload(
        &db,
        &store,
        "nonexistent",
        "doc.pdf",
        "application/pdf",
        Bytes::from("data"),
        MAX_UPLOAD,
    )
    .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_upload_filename_collision_conflicts() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    file_service::upload(
        &db,
        &store,
        &user.id,
        "doc.pdf",
        "application/pdf",
        Bytes::from("first"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    let result = file_service::upload(
        &db,
        &store,
        &user.id,
        "doc.pdf",
        "application/pdf",
        Bytes::from("second"),
        MAX_UPLOAD,
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));

    // Original content untouched
    assert_eq!(store.get("doc.pdf").await.unwrap(), Bytes::from("first"));
}

#[tokio::test]
async fn test_upload_rejects_path_escapes() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    for name in ["../evil.pdf", "a/b.pdf", ""] {
        let result = file_service::upload(
            &db,
            &store,
            &user.id,
            name,
            "application/pdf",
            Bytes::from("data"),
            MAX_UPLOAD,
        )
        .await;
        assert!(
            matches!(result, Err(ServiceError::Validation(_))),
            "expected rejection for {name:?}"
        );
    }
}

// ============================================================================
// Ownership scoping
// ============================================================================

#[tokio::test]
async fn test_ownership_isolation() {
    let (_dir, db, store) = test_env();
    let alice = register_user(&db, "alice");
    let bob = register_user(&db, "bob");

    let file = file_service::upload(
        &db,
        &store,
        &alice.id,
        "private.pdf",
        "application/pdf",
        Bytes::from("secret"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    assert!(file_service::get(&db, &file.id, &alice.id).is_ok());

    // Bob sees not-found, not forbidden
    assert!(matches!(
        file_service::get(&db, &file.id, &bob.id),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        file_service::share_link(&db, &file.id, &bob.id, "http://example.com"),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        file_service::delete(&db, &store, &file.id, &bob.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

// ============================================================================
// Rename
// ============================================================================

#[tokio::test]
async fn test_rename_preserves_extension() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let file = file_service::upload(
        &db,
        &store,
        &user.id,
        "report.pdf",
        "application/pdf",
        Bytes::from("content"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    let renamed = file_service::rename(&db, &store, &file.id, &user.id, "summary")
        .await
        .unwrap();

    assert_eq!(renamed.filename, "summary.pdf");
    assert!(renamed.file_path.ends_with("summary.pdf"));
    assert!(!store.exists("report.pdf").await.unwrap());
    assert!(store.exists("summary.pdf").await.unwrap());
}

#[tokio::test]
async fn test_rename_missing_disk_object() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let file = file_service::upload(
        &db,
        &store,
        &user.id,
        "report.pdf",
        "application/pdf",
        Bytes::from("content"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    // Disk object vanishes out from under the metadata
    store.delete("report.pdf").await.unwrap();

    let result = file_service::rename(&db, &store, &file.id, &user.id, "summary").await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    // Metadata untouched on failure
    let unchanged = db.get_file(&file.id).unwrap().unwrap();
    assert_eq!(unchanged.filename, "report.pdf");
}

#[tokio::test]
async fn test_rename_collision_conflicts() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let file = file_service::upload(
        &db,
        &store,
        &user.id,
        "a.pdf",
        "application/pdf",
        Bytes::from("a"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();
    file_service::upload(
        &db,
        &store,
        &user.id,
        "b.pdf",
        "application/pdf",
        Bytes::from("b"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    let result = file_service::rename(&db, &store, &file.id, &user.id, "b").await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_removes_disk_and_metadata() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let file = file_service::upload(
        &db,
        &store,
        &user.id,
        "doc.pdf",
        "application/pdf",
        Bytes::from("content"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    let deleted = file_service::delete(&db, &store, &file.id, &user.id)
        .await
        .unwrap();
    assert_eq!(deleted.filename, "doc.pdf");

    assert!(!store.exists("doc.pdf").await.unwrap());
    assert!(matches!(
        file_service::get(&db, &file.id, &user.id),
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_missing_disk_object_is_not_found() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let file = file_service::upload(
        &db,
        &store,
        &user.id,
        "doc.pdf",
        "application/pdf",
        Bytes::from("content"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    store.delete("doc.pdf").await.unwrap();

    let result = file_service::delete(&db, &store, &file.id, &user.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

// ============================================================================
// Share links and downloads
// ============================================================================

#[tokio::test]
async fn test_share_link_shape() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let file = file_service::upload(
        &db,
        &store,
        &user.id,
        "doc.pdf",
        "application/pdf",
        Bytes::from("content"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    let share = file_service::share_link(&db, &file.id, &user.id, "https://files.example.com")
        .unwrap();
    assert_eq!(share.file_id, file.id);
    assert_eq!(
        share.share_link,
        format!("https://files.example.com/file/shared/{}", file.id)
    );
}

#[tokio::test]
async fn test_download_scope_policy() {
    let (_dir, db, store) = test_env();
    let alice = register_user(&db, "alice");
    let bob = register_user(&db, "bob");

    let file = file_service::upload(
        &db,
        &store,
        &alice.id,
        "doc.pdf",
        "application/pdf",
        Bytes::from("content"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    // Default: anyone authenticated can fetch by id
    let fetched = file_service::fetch_for_download(&db, &store, &file.id, &bob.id, false)
        .await
        .unwrap();
    assert_eq!(fetched.id, file.id);

    // Owner-only policy hides it from everyone else
    let restricted = file_service::fetch_for_download(&db, &store, &file.id, &bob.id, true).await;
    assert!(matches!(restricted, Err(ServiceError::NotFound(_))));
    assert!(
        file_service::fetch_for_download(&db, &store, &file.id, &alice.id, true)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_download_missing_disk_object() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    let file = file_service::upload(
        &db,
        &store,
        &user.id,
        "doc.pdf",
        "application/pdf",
        Bytes::from("content"),
        MAX_UPLOAD,
    )
    .await
    .unwrap();

    store.delete("doc.pdf").await.unwrap();

    let result = file_service::fetch_for_download(&db, &store, &file.id, &user.id, false).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

// ============================================================================
// Analytics
// ============================================================================

#[tokio::test]
async fn test_analytics_sums_and_formats() {
    let (_dir, db, store) = test_env();
    let user = register_user(&db, "alice");

    for (name, size) in [("a.txt", 500usize), ("b.txt", 1500), ("c.txt", 1_048_576)] {
        file_service::upload(
            &db,
            &store,
            &user.id,
            name,
            "text/plain",
            Bytes::from(vec![0u8; size]),
            2 * 1024 * 1024,
        )
        .await
        .unwrap();
    }

    let analytics = file_service::analytics(&db, &user.id).unwrap();
    assert_eq!(analytics.total_files, 3);
    assert_eq!(analytics.total_size, 1_050_576);
    assert_eq!(analytics.formatted_size, "1.00 MB");
}

#[test]
fn test_analytics_empty() {
    let (_dir, db, _store) = test_env();
    let user = register_user(&db, "alice");

    let analytics = file_service::analytics(&db, &user.id).unwrap();
    assert_eq!(analytics.total_files, 0);
    assert_eq!(analytics.total_size, 0);
    assert_eq!(analytics.formatted_size, "0.00 B");
}

#[test]
fn test_format_size_unit_boundaries() {
    assert_eq!(format_size(0), "0.00 B");
    assert_eq!(format_size(1023), "1023.00 B");
    assert_eq!(format_size(1024), "1.00 KB");
    assert_eq!(format_size(1536), "1.50 KB");
    assert_eq!(format_size(1024 * 1024), "1.00 MB");
    assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GB");
    assert_eq!(format_size(1024u64.pow(4)), "1.00 TB");
    assert_eq!(format_size(1024u64.pow(5)), "1.00 PB");
    // Past the last unit the value just keeps growing
    assert_eq!(format_size(1024u64.pow(6)), "1024.00 PB");
}
