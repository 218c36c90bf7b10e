//! Direct retrieval of stored objects
//!
//! Keys are opaque strings handed out by the API. They are appended to the
//! configured bucket endpoint segment by segment, so `/` inside a key keeps
//! its meaning while every other reserved character is escaped.

use std::time::Duration;

use reqwest::Client;

use crate::config::ClientConfig;
use crate::domain::models::{Image, ImageMetadata};
use crate::shared::errors::{ApiOperation, ClientError, Result, ValidationError};
use crate::shared::logging::{log_object_fetch, log_request_failure, log_request_start};

#[derive(Debug, Clone)]
pub struct ObjectStorage {
    base_url: String,
    http: Client,
    request_timeout: Duration,
}

impl ObjectStorage {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.storage_url.clone(),
            http,
            request_timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{storage_url}/{key}`
    pub fn object_url(&self, key: &str) -> std::result::Result<String, ValidationError> {
        let key = key.trim_start_matches('/');
        if key.trim().is_empty() {
            return Err(ValidationError::EmptyStorageKey);
        }

        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        Ok(format!("{}/{}", self.base_url, encoded.join("/")))
    }

    pub fn original_url(&self, image: &Image) -> Option<String> {
        self.object_url(&image.object_storage_image_key).ok()
    }

    /// Present only once processing has produced an output
    pub fn transformed_url(&self, image: &Image) -> Option<String> {
        image
            .transformed_image_key
            .as_deref()
            .and_then(|key| self.object_url(key).ok())
    }

    pub fn metadata_urls(&self, metadata: &ImageMetadata) -> (Option<String>, Option<String>) {
        let original = self.object_url(&metadata.object_storage_image_key).ok();
        let transformed = metadata
            .transformed_image_key
            .as_deref()
            .and_then(|key| self.object_url(key).ok());
        (original, transformed)
    }

    /// Download an object's bytes.
    pub async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let operation = ApiOperation::FetchObject;
        let url = self.object_url(key)?;
        log_request_start(operation, &url);

        let result = self.fetch_url(operation, &url).await;
        match &result {
            Ok(bytes) => log_object_fetch(key, bytes.len()),
            Err(error) => log_request_failure(error),
        }
        result
    }

    async fn fetch_url(&self, operation: ApiOperation, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { operation, status });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;
        Ok(bytes.to_vec())
    }
}
