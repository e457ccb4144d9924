//! Media attachment manager.
//!
//! Associates uploaded blobs with messages. Naming and storage are
//! delegated to the injected [`StorageBackend`]; the manager only
//! decides whether an upload is present and what to call it.

use metagram_common::{AppResult, StorageService, generate_upload_name};

/// An uploaded file as received from the transport layer.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Client-supplied file name (used only for its extension).
    pub original_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Whether this upload carries no usable content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() || self.original_name.is_empty()
    }
}

/// Attachment manager service.
#[derive(Clone)]
pub struct AttachmentService {
    storage: StorageService,
}

impl AttachmentService {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(storage: StorageService) -> Self {
        Self { storage }
    }

    /// Store an upload and return its stored name.
    ///
    /// An absent or empty upload is a no-op returning `None`. Valid on
    /// update paths; create paths must reject it before calling here.
    pub async fn attach(&self, upload: Option<&FileUpload>) -> AppResult<Option<String>> {
        let Some(upload) = upload else {
            return Ok(None);
        };
        if upload.is_empty() {
            return Ok(None);
        }

        let name = generate_upload_name(&upload.original_name);
        let stored = self.storage.store(&name, &upload.bytes).await?;
        Ok(Some(stored.name))
    }

    /// Remove a stored blob. `Ok(false)` when it was already absent.
    pub async fn remove(&self, filename: &str) -> AppResult<bool> {
        self.storage.delete(filename).await
    }

    /// Public URL for a stored name.
    #[must_use]
    pub fn public_url(&self, filename: &str) -> String {
        self.storage.public_url(filename)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use metagram_common::NoOpStorage;
    use std::sync::Arc;

    fn create_test_service() -> AttachmentService {
        AttachmentService::new(Arc::new(NoOpStorage::new("/img".to_string())))
    }

    #[tokio::test]
    async fn test_attach_absent_upload_is_none() {
        let service = create_test_service();
        let result = service.attach(None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_attach_empty_upload_is_none() {
        let service = create_test_service();
        let upload = FileUpload {
            original_name: "photo.jpg".to_string(),
            bytes: vec![],
        };
        let result = service.attach(Some(&upload)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_attach_stores_under_generated_name() {
        let service = create_test_service();
        let upload = FileUpload {
            original_name: "photo.jpg".to_string(),
            bytes: vec![1, 2, 3],
        };
        let result = service.attach(Some(&upload)).await.unwrap();

        let name = result.unwrap();
        assert!(name.ends_with(".jpg"));
        assert_ne!(name, "photo.jpg");
    }

    #[tokio::test]
    async fn test_remove_delegates_to_backend() {
        let service = create_test_service();
        assert!(service.remove("abc.jpg").await.unwrap());
    }
}
