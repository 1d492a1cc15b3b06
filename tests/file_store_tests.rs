use bytes::Bytes;
use filehub::file_store::{FileStore, FileStoreError, LocalStore};

#[tokio::test]
async fn test_local_store_put_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let data = Bytes::from("hello world");
    let written = store.put("notes.txt", data.clone()).await.unwrap();
    assert_eq!(written, data.len() as u64);

    let retrieved = store.get("notes.txt").await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_local_store_exists() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    assert!(!store.exists("missing.txt").await.unwrap());

    store.put("present.txt", Bytes::from("data")).await.unwrap();
    assert!(store.exists("present.txt").await.unwrap());
}

#[tokio::test]
async fn test_local_store_rename() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.put("draft.pdf", Bytes::from("content")).await.unwrap();
    store.rename("draft.pdf", "final.pdf").await.unwrap();

    assert!(!store.exists("draft.pdf").await.unwrap());
    assert!(store.exists("final.pdf").await.unwrap());
    assert_eq!(store.get("final.pdf").await.unwrap(), Bytes::from("content"));
}

#[tokio::test]
async fn test_local_store_rename_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let result = store.rename("missing.pdf", "anything.pdf").await;
    assert!(matches!(result, Err(FileStoreError::NotFound(_))));
}

#[tokio::test]
async fn test_local_store_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.put("to-delete.txt", Bytes::from("data")).await.unwrap();
    store.delete("to-delete.txt").await.unwrap();
    assert!(!store.exists("to-delete.txt").await.unwrap());
}

#[tokio::test]
async fn test_local_store_delete_missing_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    // A delete with no disk object behind it must not look like success
    let result = store.delete("nonexistent.txt").await;
    assert!(matches!(result, Err(FileStoreError::NotFound(_))));
}

#[tokio::test]
async fn test_local_store_get_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let result = store.get("missing.txt").await;
    assert!(matches!(result, Err(FileStoreError::NotFound(_))));
}

#[tokio::test]
async fn test_local_store_location() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let location = store.location("report.pdf");
    assert!(location.ends_with("report.pdf"));
    assert!(location.starts_with(dir.path().to_string_lossy().as_ref()));
}
