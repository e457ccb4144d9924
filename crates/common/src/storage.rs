//! Blob storage abstraction for message attachments.
//!
//! The core never touches the filesystem directly; attachments go
//! through a [`StorageBackend`]. A local-filesystem backend is provided,
//! plus a no-op backend for tests and storage-disabled deployments.

use std::path::PathBuf;
use std::sync::Arc;

use crate::{AppError, AppResult};

/// Stored blob metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Stored name (path component under the storage root).
    pub name: String,
    /// Public URL to access the blob.
    pub url: String,
    /// Blob size in bytes.
    pub size: u64,
    /// MD5 hash of the blob.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a blob under the given name.
    async fn store(&self, name: &str, data: &[u8]) -> AppResult<UploadedFile>;

    /// Delete a blob. Returns `false` if it was already absent.
    async fn delete(&self, name: &str) -> AppResult<bool>;

    /// Check if a blob exists.
    async fn exists(&self, name: &str) -> AppResult<bool>;

    /// Get the public URL for a stored name.
    fn public_url(&self, name: &str) -> String;
}

/// Shared handle to a storage backend.
pub type StorageService = Arc<dyn StorageBackend>;

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend rooted at `base_path`.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self { base_path, base_url }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn store(&self, name: &str, data: &[u8]) -> AppResult<UploadedFile> {
        let path = self.base_path.join(name);

        // Root (and any parent) is created on first use
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));

        Ok(UploadedFile {
            name: name.to_string(),
            url: self.public_url(name),
            size: data.len() as u64,
            md5,
        })
    }

    async fn delete(&self, name: &str) -> AppResult<bool> {
        let path = self.base_path.join(name);
        if !path.exists() {
            return Ok(false);
        }
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        Ok(true)
    }

    async fn exists(&self, name: &str) -> AppResult<bool> {
        let path = self.base_path.join(name);
        Ok(path.exists())
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}

/// No-op storage backend for tests or when file storage is disabled.
#[derive(Clone, Default)]
pub struct NoOpStorage {
    base_url: String,
}

impl NoOpStorage {
    /// Create a new no-op storage backend.
    #[must_use]
    pub const fn new(base_url: String) -> Self {
        Self { base_url }
    }
}

#[async_trait::async_trait]
impl StorageBackend for NoOpStorage {
    async fn store(&self, name: &str, data: &[u8]) -> AppResult<UploadedFile> {
        Ok(UploadedFile {
            name: name.to_string(),
            url: self.public_url(name),
            size: data.len() as u64,
            md5: format!("{:x}", md5::compute(data)),
        })
    }

    async fn delete(&self, _name: &str) -> AppResult<bool> {
        Ok(true)
    }

    async fn exists(&self, _name: &str) -> AppResult<bool> {
        Ok(false)
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}

/// Generate a collision-resistant stored name for an upload.
///
/// Random token plus the original extension, so stored names never
/// collide and never leak the uploader's file name.
#[must_use]
pub fn generate_upload_name(original_name: &str) -> String {
    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && !ext.is_empty())
        .unwrap_or("bin");

    format!("{}.{}", uuid::Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_upload_name_keeps_extension() {
        let name = generate_upload_name("photo.jpg");
        assert!(name.ends_with(".jpg"));
        assert_ne!(name, "photo.jpg");
    }

    #[test]
    fn test_generate_upload_name_no_extension() {
        let name = generate_upload_name("file");
        assert!(name.ends_with(".bin"));
    }

    #[test]
    fn test_generate_upload_name_hidden_file() {
        // Leading dot is not an extension separator
        let name = generate_upload_name(".gitignore");
        assert!(name.ends_with(".bin"));
    }

    #[test]
    fn test_generate_upload_name_unique() {
        assert_ne!(generate_upload_name("a.png"), generate_upload_name("a.png"));
    }

    #[test]
    fn test_local_storage_public_url() {
        let storage = LocalStorage::new(PathBuf::from("./uploads"), "/img/".to_string());
        assert_eq!(storage.public_url("abc.png"), "/img/abc.png");
    }
}
