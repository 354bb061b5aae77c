//! Cloudinary upload API client

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

use super::{DeleteOutcome, ImageStore, ImageUpload, MediaError, MediaResult, UploadedImage};
use crate::config::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Signed client for the image upload and destroy endpoints
#[derive(Clone)]
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", API_BASE, self.config.cloud_name, action)
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => format!("{}: {}", status, body.error.message),
            Err(_) => status.to_string(),
        }
    }
}

/// Signature over the alphabetically sorted parameters and the API secret
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    sha1_smol::Sha1::from(format!("{}{}", joined, api_secret))
        .digest()
        .to_string()
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload(&self, image: ImageUpload) -> MediaResult<UploadedImage> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(&[("timestamp", &timestamp)], &self.config.api_secret);

        let mut part = Part::bytes(image.bytes.to_vec()).file_name(image.file_name.clone());
        if let Some(content_type) = image.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| MediaError::Rejected(e.to_string()))?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaError::Upload(Self::error_message(response).await));
        }

        let body: UploadResponse = response.json().await?;
        let url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| MediaError::Upload("response carried no url".to_string()))?;

        tracing::info!(public_id = %body.public_id, "Image uploaded");
        Ok(UploadedImage {
            url,
            public_id: body.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> MediaResult<DeleteOutcome> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let params = [
            ("public_id", public_id.to_string()),
            ("api_key", self.config.api_key.clone()),
            ("timestamp", timestamp),
            ("signature", signature),
        ];

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaError::Delete(Self::error_message(response).await));
        }

        let body: DestroyResponse = response.json().await?;
        DeleteOutcome::from_result(&body.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_sorts_parameters() {
        let a = sign(&[("timestamp", "1315060510"), ("public_id", "sample")], "abcd");
        let b = sign(&[("public_id", "sample"), ("timestamp", "1315060510")], "abcd");
        assert_eq!(a, b);
        assert_eq!(
            a,
            sha1_smol::Sha1::from("public_id=sample&timestamp=1315060510abcd")
                .digest()
                .to_string()
        );
    }

    #[test]
    fn test_endpoint_uses_cloud_name() {
        let store = CloudinaryStore::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(
            store.endpoint("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }
}
