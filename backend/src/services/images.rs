//! Image staging for documents
//!
//! An image is uploaded before its document is written. If the write fails
//! the upload is removed again, so a failed create or update never leaves a
//! blob behind.

use std::future::Future;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::media::{delete_by_url, ImageStore, ImageUpload, UploadedImage};

#[derive(Clone)]
pub struct ImageStager {
    store: Arc<dyn ImageStore>,
}

impl ImageStager {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self { store }
    }

    /// Validate an optional upload without touching the store
    pub fn check(&self, image: Option<&ImageUpload>) -> ApiResult<()> {
        if let Some(image) = image {
            image.check()?;
        }
        Ok(())
    }

    /// Upload, then run `persist`; the upload is discarded if `persist` fails
    pub async fn with_upload<T, F, Fut>(
        &self,
        image: Option<ImageUpload>,
        persist: F,
    ) -> ApiResult<T>
    where
        F: FnOnce(Option<String>) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let staged = match image {
            Some(image) => Some(self.store.upload(image).await?),
            None => None,
        };

        match persist(staged.as_ref().map(|s| s.url.clone())).await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(staged) = staged {
                    self.discard(&staged).await;
                }
                Err(err)
            }
        }
    }

    /// Delete a stored image that is no longer referenced.
    ///
    /// URLs the store did not issue are skipped; any other failure is an
    /// `UpstreamError`.
    pub async fn retire(&self, url: Option<&str>) -> ApiResult<()> {
        let Some(url) = url else {
            return Ok(());
        };
        delete_by_url(self.store.as_ref(), url)
            .await
            .map_err(|e| ApiError::UpstreamError(e.to_string()))
    }

    async fn discard(&self, staged: &UploadedImage) {
        match self.store.delete(&staged.public_id).await {
            Ok(_) => tracing::info!(public_id = %staged.public_id, "Discarded orphaned upload"),
            Err(e) => tracing::error!(
                public_id = %staged.public_id,
                error = %e,
                "Failed to discard orphaned upload"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MemoryImageStore;
    use axum::body::Bytes;

    fn png() -> ImageUpload {
        ImageUpload {
            file_name: "cat.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: Bytes::from_static(b"png"),
        }
    }

    #[tokio::test]
    async fn test_failed_persist_discards_upload() {
        let store = MemoryImageStore::new();
        let stager = ImageStager::new(Arc::new(store.clone()));

        let result: ApiResult<()> = stager
            .with_upload(Some(png()), |url| async move {
                assert!(url.is_some());
                Err(ApiError::UpstreamError("write failed".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert!(store.stored().await.is_empty());
        assert_eq!(store.deleted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_successful_persist_keeps_upload() {
        let store = MemoryImageStore::new();
        let stager = ImageStager::new(Arc::new(store.clone()));

        let url = stager
            .with_upload(Some(png()), |url| async move { Ok(url) })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(store.stored().await.len(), 1);
        stager.retire(Some(&url)).await.unwrap();
        assert!(store.stored().await.is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_skips_persist() {
        let store = MemoryImageStore::new();
        store.fail_uploads(true);
        let stager = ImageStager::new(Arc::new(store));

        let result: ApiResult<()> = stager
            .with_upload(Some(png()), |_| async move {
                Err(ApiError::InternalError("persist ran".to_string()))
            })
            .await;
        assert!(matches!(result, Err(ApiError::UpstreamError(_))));
    }

    #[tokio::test]
    async fn test_retire_failure_is_upstream_error() {
        let store = MemoryImageStore::new();
        let stager = ImageStager::new(Arc::new(store.clone()));
        let uploaded = store.upload(png()).await.unwrap();

        store.fail_deletes(true);
        let err = stager.retire(Some(&uploaded.url)).await.unwrap_err();
        assert!(matches!(err, ApiError::UpstreamError(_)));
    }
}
