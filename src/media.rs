//! Media host adapter.
//!
//! Uploaded images are forwarded to an external host and only the public
//! URL is stored on the owning document. The host sits behind a trait so
//! credential-less local runs and the tests use an in-memory stand-in.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::error::ApiError;

/// MIME types accepted for the `image` form field.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("media host rejected the upload ({status}): {detail}")]
    Host { status: u16, detail: String },

    #[error("media host timed out")]
    Timeout,

    #[error("media host unreachable: {0}")]
    Transport(String),

    #[error("media host response missing an asset URL: {0}")]
    BadResponse(String),
}

/// Type and size gate, run before any bytes leave the process.
pub fn check_image(content_type: &str, size: usize, max_bytes: usize) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        errors.push(format!(
            "image type {content_type} is not allowed (jpeg, jpg, png, gif)"
        ));
    }
    if size > max_bytes {
        errors.push(format!("image exceeds the maximum size of {max_bytes} bytes"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload the bytes and return a fully-qualified public URL.
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, UploadError>;

    /// Best-effort removal of a previously uploaded asset.
    async fn delete(&self, url: &str) -> Result<(), UploadError>;
}

/// HTTP client for the external image host.
pub struct HttpMediaHost {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl HttpMediaHost {
    pub fn new(
        base_url: &str,
        api_key: &str,
        api_secret: &str,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| UploadError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }
}

fn transport_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        UploadError::Timeout
    } else {
        UploadError::Transport(err.to_string())
    }
}

#[async_trait]
impl MediaHost for HttpMediaHost {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, UploadError> {
        let part = Part::bytes(bytes)
            .file_name("image")
            .mime_str(content_type)
            .map_err(|err| UploadError::Transport(err.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/image/upload", self.base_url))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(UploadError::Host {
                status: status.as_u16(),
                detail,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| UploadError::BadResponse(err.to_string()))?;
        body.get("secure_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| UploadError::BadResponse(body.to_string()))
    }

    async fn delete(&self, url: &str) -> Result<(), UploadError> {
        let response = self
            .client
            .post(format!("{}/image/destroy", self.base_url))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(UploadError::Host {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }
}

/// In-memory stand-in used when no media credentials are configured, and
/// by the integration tests.
#[derive(Default)]
pub struct MemoryMediaHost {
    uploads: Mutex<Vec<String>>,
}

impl MemoryMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs currently held, oldest first.
    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().expect("media host lock poisoned").clone()
    }
}

#[async_trait]
impl MediaHost for MemoryMediaHost {
    async fn upload(&self, _bytes: Vec<u8>, content_type: &str) -> Result<String, UploadError> {
        let extension = content_type.strip_prefix("image/").unwrap_or("bin");
        let mut uploads = self.uploads.lock().expect("media host lock poisoned");
        let url = format!("https://media.local/assets/{}.{}", uploads.len() + 1, extension);
        uploads.push(url.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), UploadError> {
        let mut uploads = self.uploads.lock().expect("media host lock poisoned");
        uploads.retain(|stored| stored != url);
        Ok(())
    }
}

/// Media host that refuses every call; lets tests drive the
/// abort-before-persist path without a network.
pub struct FailingMediaHost;

#[async_trait]
impl MediaHost for FailingMediaHost {
    async fn upload(&self, _bytes: Vec<u8>, _content_type: &str) -> Result<String, UploadError> {
        Err(UploadError::Host {
            status: 503,
            detail: "upload refused".to_string(),
        })
    }

    async fn delete(&self, _url: &str) -> Result<(), UploadError> {
        Err(UploadError::Host {
            status: 503,
            detail: "delete refused".to_string(),
        })
    }
}
