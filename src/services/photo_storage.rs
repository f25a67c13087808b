//! Cloud photo storage client
//!
//! HTTP client for the external media service that hosts member photos.
//! Uploads go out as multipart form data; deletions reference the storage
//! service's public id. Service-reported problems come back inside the
//! result types (mirroring the service's own error envelope), while
//! transport failures surface as `AppError`.

use crate::config::PhotoStorageConfig;
use crate::error::AppError;
use anyhow::anyhow;
use async_trait::async_trait;
use serde::Deserialize;

/// Error envelope the media service embeds in its responses
#[derive(Debug, Clone, Deserialize)]
pub struct StorageServiceError {
    /// Human-readable message from the service
    pub message: String,
}

/// Outcome of an upload request
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    /// Public HTTPS URL of the stored image
    pub secure_url: Option<String>,
    /// Identifier for later deletion
    pub public_id: Option<String>,
    /// Set when the service rejected the upload
    pub error: Option<StorageServiceError>,
}

/// Outcome of a deletion request
#[derive(Debug, Clone, Deserialize)]
pub struct DeletionResult {
    /// Service status string (e.g. "ok", "not found")
    pub result: Option<String>,
    /// Set when the service could not delete the image
    pub error: Option<StorageServiceError>,
}

/// Photo storage operations used by the photo endpoints
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Upload image bytes, returning the hosted URL and public id
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResult, AppError>;

    /// Delete a previously uploaded image by its public id
    async fn delete(&self, public_id: &str) -> Result<DeletionResult, AppError>;
}

/// Reqwest-based client for the cloud media API
pub struct CloudMediaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CloudMediaClient {
    /// Create a client from configuration
    pub fn new(config: &PhotoStorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl PhotoStorage for CloudMediaClient {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResult, AppError> {
        let url = format!("{}/image/upload", self.base_url);

        tracing::debug!(
            url = %url,
            file_name = %file_name,
            size = bytes.len(),
            "Uploading photo to storage service"
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone());

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                AppError::Internal(anyhow!("Failed to send upload to storage service: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::Internal(anyhow!("Failed to read storage service response: {}", e))
        })?;

        if !status.is_success() {
            tracing::error!(
                status_code = status.as_u16(),
                error_body = %body,
                "Storage service rejected upload"
            );
            // The service wraps rejections in its error envelope; fall back
            // to the raw body when it does not.
            if let Ok(parsed) = serde_json::from_str::<UploadResult>(&body) {
                if parsed.error.is_some() {
                    return Ok(parsed);
                }
            }
            return Ok(UploadResult {
                secure_url: None,
                public_id: None,
                error: Some(StorageServiceError {
                    message: format!("Upload failed with status {}: {}", status.as_u16(), body),
                }),
            });
        }

        let parsed: UploadResult = serde_json::from_str(&body).map_err(|e| {
            AppError::Internal(anyhow!(
                "Failed to parse storage service response: {} - Response body: {}",
                e,
                body
            ))
        })?;

        Ok(parsed)
    }

    async fn delete(&self, public_id: &str) -> Result<DeletionResult, AppError> {
        let url = format!("{}/image/destroy", self.base_url);

        tracing::debug!(url = %url, public_id = %public_id, "Deleting photo from storage service");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "public_id": public_id,
                "api_key": self.api_key,
            }))
            .send()
            .await
            .map_err(|e| {
                AppError::Internal(anyhow!("Failed to send deletion to storage service: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::Internal(anyhow!("Failed to read storage service response: {}", e))
        })?;

        if !status.is_success() {
            tracing::error!(
                status_code = status.as_u16(),
                error_body = %body,
                "Storage service rejected deletion"
            );
            if let Ok(parsed) = serde_json::from_str::<DeletionResult>(&body) {
                if parsed.error.is_some() {
                    return Ok(parsed);
                }
            }
            return Ok(DeletionResult {
                result: None,
                error: Some(StorageServiceError {
                    message: format!("Deletion failed with status {}: {}", status.as_u16(), body),
                }),
            });
        }

        let parsed: DeletionResult = serde_json::from_str(&body).map_err(|e| {
            AppError::Internal(anyhow!(
                "Failed to parse storage service response: {} - Response body: {}",
                e,
                body
            ))
        })?;

        Ok(parsed)
    }
}
