use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DeleteOutcome, ImageStore, ImageUpload, MediaError, MediaResult, UploadedImage};

const BASE_URL: &str = "https://media.local/notekeeper/image/upload/v1";

#[derive(Default)]
struct Blobs {
    stored: HashSet<String>,
    deleted: Vec<String>,
}

#[derive(Default)]
struct Faults {
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

/// Image store that keeps uploads in process
///
/// Issues URLs of the same shape as the hosted store so public id extraction
/// works unchanged. Used when no Cloudinary credentials are configured and
/// by the integration tests, which can make either operation fail on demand.
#[derive(Clone, Default)]
pub struct MemoryImageStore {
    blobs: Arc<RwLock<Blobs>>,
    faults: Arc<Faults>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.faults.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.faults.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Public ids currently stored
    pub async fn stored(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.blobs.read().await.stored.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Public ids removed so far, in order
    pub async fn deleted(&self) -> Vec<String> {
        self.blobs.read().await.deleted.clone()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, image: ImageUpload) -> MediaResult<UploadedImage> {
        if self.faults.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Upload("store unavailable".to_string()));
        }

        let extension = image
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| "bin".to_string());
        let public_id = Uuid::new_v4().simple().to_string();
        let url = format!("{}/{}.{}", BASE_URL, public_id, extension);

        self.blobs.write().await.stored.insert(public_id.clone());
        Ok(UploadedImage { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> MediaResult<DeleteOutcome> {
        if self.faults.fail_deletes.load(Ordering::SeqCst) {
            return Err(MediaError::Delete("store unavailable".to_string()));
        }

        let mut blobs = self.blobs.write().await;
        if blobs.stored.remove(public_id) {
            blobs.deleted.push(public_id.to_string());
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::AlreadyGone)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::public_id_from_url;
    use axum::body::Bytes;

    fn png() -> ImageUpload {
        ImageUpload {
            file_name: "cat.PNG".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[tokio::test]
    async fn test_upload_issues_extractable_urls() {
        let store = MemoryImageStore::new();
        let uploaded = store.upload(png()).await.unwrap();

        assert!(uploaded.url.ends_with(".png"));
        assert_eq!(
            public_id_from_url(&uploaded.url),
            Some(uploaded.public_id.clone())
        );
        assert_eq!(store.stored().await, vec![uploaded.public_id]);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryImageStore::new();
        let uploaded = store.upload(png()).await.unwrap();

        assert_eq!(
            store.delete(&uploaded.public_id).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.delete(&uploaded.public_id).await.unwrap(),
            DeleteOutcome::AlreadyGone
        );
        assert_eq!(store.deleted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_fault_toggles() {
        let store = MemoryImageStore::new();
        store.fail_uploads(true);
        assert!(store.upload(png()).await.is_err());
        store.fail_uploads(false);

        let uploaded = store.upload(png()).await.unwrap();
        store.fail_deletes(true);
        assert!(store.delete(&uploaded.public_id).await.is_err());
    }
}
