use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use super::{FileStore, FileStoreError};

/// Filesystem-backed store. Uploads land directly under the base directory,
/// named after the declared filename.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }
}

#[async_trait]
impl FileStore for LocalStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<u64, FileStoreError> {
        let path = self.object_path(name);
        tokio::fs::write(&path, &data).await?;
        let written = tokio::fs::metadata(&path).await?.len();
        Ok(written)
    }

    async fn get(&self, name: &str) -> Result<Bytes, FileStoreError> {
        let path = self.object_path(name);
        if !path.exists() {
            return Err(FileStoreError::NotFound(name.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FileStoreError> {
        let from_path = self.object_path(from);
        if !from_path.exists() {
            return Err(FileStoreError::NotFound(from.to_string()));
        }
        tokio::fs::rename(&from_path, self.object_path(to)).await?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), FileStoreError> {
        let path = self.object_path(name);
        if !path.exists() {
            return Err(FileStoreError::NotFound(name.to_string()));
        }
        tokio::fs::remove_file(&path).await?;
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, FileStoreError> {
        let path = self.object_path(name);
        Ok(path.exists())
    }

    fn location(&self, name: &str) -> String {
        self.object_path(name).to_string_lossy().to_string()
    }
}
