//! Image blob store collaborators
//!
//! Notes and todo lists keep only the public URL of their image. The bytes
//! live in an external store reached through [`ImageStore`].

use async_trait::async_trait;
use axum::body::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

mod cloudinary;
mod memory;

pub use cloudinary::CloudinaryStore;
pub use memory::MemoryImageStore;

/// Matches the public id in `.../upload/<version>/<public_id>.<ext>`
static PUBLIC_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/upload/[^/]+/([^/]+)\.").expect("public id pattern is a valid regex")
});

#[derive(Error, Debug)]
pub enum MediaError {
    /// The payload itself is unacceptable
    #[error("{0}")]
    Rejected(String),

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("Image delete failed: {0}")]
    Delete(String),

    #[error("Image store request failed: {0}")]
    Http(String),
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        MediaError::Http(err.to_string())
    }
}

pub type MediaResult<T> = Result<T, MediaError>;

/// An image received from a client, not yet uploaded
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Reject empty payloads and declared non-image content types
    pub fn check(&self) -> MediaResult<()> {
        if self.bytes.is_empty() {
            return Err(MediaError::Rejected("The image file is empty".to_string()));
        }
        if let Some(content_type) = self.content_type.as_deref() {
            if !content_type.starts_with("image/") {
                return Err(MediaError::Rejected(format!(
                    "Unsupported image type '{}'",
                    content_type
                )));
            }
        }
        Ok(())
    }
}

/// Location of a stored image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

/// How a delete request was answered by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing stored under that id; counts as success
    AlreadyGone,
}

impl DeleteOutcome {
    /// Map the store's `result` field
    pub fn from_result(result: &str) -> MediaResult<Self> {
        match result {
            "ok" => Ok(DeleteOutcome::Deleted),
            "not found" => Ok(DeleteOutcome::AlreadyGone),
            other => Err(MediaError::Delete(format!("unexpected result '{}'", other))),
        }
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> MediaResult<UploadedImage>;

    async fn delete(&self, public_id: &str) -> MediaResult<DeleteOutcome>;
}

/// Public id of an image URL, or `None` for URLs the store did not issue
pub fn public_id_from_url(url: &str) -> Option<String> {
    PUBLIC_ID_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Delete the image behind `url`; foreign URLs are skipped silently
pub async fn delete_by_url(store: &dyn ImageStore, url: &str) -> MediaResult<()> {
    let Some(public_id) = public_id_from_url(url) else {
        tracing::debug!(url = %url, "Skipping delete of image without a public id");
        return Ok(());
    };

    match store.delete(&public_id).await? {
        DeleteOutcome::Deleted => tracing::debug!(public_id = %public_id, "Image deleted"),
        DeleteOutcome::AlreadyGone => {
            tracing::debug!(public_id = %public_id, "Image already absent from store")
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_from_url() {
        assert_eq!(
            public_id_from_url(
                "https://res.cloudinary.com/demo/image/upload/v1712345678/abc123xyz.png"
            ),
            Some("abc123xyz".to_string())
        );
        assert_eq!(
            public_id_from_url("http://res.cloudinary.com/demo/image/upload/v1/photo.tar.gz"),
            Some("photo.tar".to_string())
        );
        assert_eq!(public_id_from_url("https://example.com/cat.png"), None);
        assert_eq!(public_id_from_url(""), None);
    }

    #[test]
    fn test_delete_outcome_accepts_not_found() {
        assert_eq!(DeleteOutcome::from_result("ok").unwrap(), DeleteOutcome::Deleted);
        assert_eq!(
            DeleteOutcome::from_result("not found").unwrap(),
            DeleteOutcome::AlreadyGone
        );
        assert!(DeleteOutcome::from_result("error").is_err());
    }

    #[test]
    fn test_upload_check() {
        let upload = |content_type: Option<&str>, bytes: &'static [u8]| ImageUpload {
            file_name: "cat.png".to_string(),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from_static(bytes),
        };

        assert!(upload(Some("image/png"), b"png").check().is_ok());
        assert!(upload(None, b"png").check().is_ok());
        assert!(matches!(
            upload(Some("text/plain"), b"hi").check(),
            Err(MediaError::Rejected(_))
        ));
        assert!(matches!(
            upload(Some("image/png"), b"").check(),
            Err(MediaError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_by_url_skips_foreign_urls() {
        let store = MemoryImageStore::new();
        delete_by_url(&store, "https://example.com/cat.png")
            .await
            .unwrap();
        assert!(store.deleted().await.is_empty());
    }
}
