mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Abstraction over the byte store backing file uploads.
/// Objects are keyed by filename; metadata lives in the database.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write an object, returning the number of bytes on disk afterwards.
    async fn put(&self, name: &str, data: Bytes) -> Result<u64, FileStoreError>;
    async fn get(&self, name: &str) -> Result<Bytes, FileStoreError>;
    /// Atomically move an object to a new name.
    async fn rename(&self, from: &str, to: &str) -> Result<(), FileStoreError>;
    /// Remove an object. Removing a missing object is an error.
    async fn delete(&self, name: &str) -> Result<(), FileStoreError>;
    async fn exists(&self, name: &str) -> Result<bool, FileStoreError>;
    /// Display path recorded in file metadata for this object.
    fn location(&self, name: &str) -> String;
}
