use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::{ClientConfig, DEFAULT_STORAGE_URL};
use crate::domain::models::{
    CreateImageRequest, CreateImageResponse, Image, ImageMetadata, ListImagesResponse,
    MessageResponse, UpdateImageRequest,
};
use crate::domain::services::{ImageService, validate_id, validate_page};
use crate::shared::errors::{ApiOperation, ClientError, Result, ValidationError};
use crate::shared::logging::{
    log_request_failure, log_request_start, log_request_success, log_validation_failure,
};

/// REST client for the `/v1/images/` resource.
///
/// Cheap to clone; clones share the underlying connection pool. No caching,
/// no retries: every call is one request reflecting the server's state.
#[derive(Debug, Clone)]
pub struct ImageApiClient {
    base_url: String,
    pub(crate) http: Client,
    request_timeout: Duration,
}

impl ImageApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_url.clone(),
            http,
            request_timeout: config.request_timeout,
        })
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(&ClientConfig::new(base_url, DEFAULT_STORAGE_URL)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/v1/images/{suffix}`
    pub(crate) fn collection_url(&self, suffix: &str) -> String {
        format!("{}/v1/images/{}", self.base_url, suffix)
    }

    /// `{base}/v1/images/{id}{tail}` with the id percent-encoded
    pub(crate) fn item_url(&self, id: &str, tail: &str) -> String {
        format!("{}/v1/images/{}{}", self.base_url, urlencoding::encode(id), tail)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: ApiOperation,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        log_request_start(operation, url);
        let result = self.execute(operation, request).await;
        if let Err(error) = &result {
            log_request_failure(error);
        }
        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: ApiOperation,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { operation, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;
        let value = serde_json::from_slice(&body)
            .map_err(|source| ClientError::Decode { operation, source })?;

        log_request_success(operation, status.as_u16());
        Ok(value)
    }

    fn reject<T>(operation: ApiOperation, error: ValidationError) -> Result<T> {
        let error = ClientError::from(error);
        log_validation_failure(operation, &error);
        Err(error)
    }
}

#[async_trait]
impl ImageService for ImageApiClient {
    async fn list_images(&self, page: u32, limit: u32) -> Result<ListImagesResponse> {
        let operation = ApiOperation::ListImages;
        if let Err(e) = validate_page(page, limit) {
            return Self::reject(operation, e);
        }

        let url = self.collection_url("");
        let request = self.http.get(&url).query(&[("page", page), ("limit", limit)]);
        self.send(operation, &url, request).await
    }

    async fn get_image(&self, id: &str) -> Result<Image> {
        let operation = ApiOperation::GetImage;
        if let Err(e) = validate_id(id) {
            return Self::reject(operation, e);
        }

        let url = self.item_url(id, "");
        self.send(operation, &url, self.http.get(&url)).await
    }

    async fn get_image_metadata(&self, id: &str) -> Result<ImageMetadata> {
        let operation = ApiOperation::GetImageMetadata;
        if let Err(e) = validate_id(id) {
            return Self::reject(operation, e);
        }

        let url = self.item_url(id, "/metadata");
        self.send(operation, &url, self.http.get(&url)).await
    }

    async fn create_image(&self, request: &CreateImageRequest) -> Result<CreateImageResponse> {
        let operation = ApiOperation::CreateImage;
        if let Err(e) = request.validate() {
            return Self::reject(operation, e);
        }

        let url = self.collection_url("");
        let created: CreateImageResponse =
            self.send(operation, &url, self.http.post(&url).json(request)).await?;

        if created.id.trim().is_empty() {
            let error = ClientError::UnexpectedResponse {
                operation,
                reason: "response carried an empty id".to_string(),
            };
            log_request_failure(&error);
            return Err(error);
        }
        Ok(created)
    }

    async fn update_image(&self, request: &UpdateImageRequest) -> Result<MessageResponse> {
        let operation = ApiOperation::UpdateImage;
        if let Err(e) = request.validate() {
            return Self::reject(operation, e);
        }

        let url = self.collection_url("");
        self.send(operation, &url, self.http.put(&url).json(request)).await
    }

    async fn delete_image(&self, id: &str) -> Result<MessageResponse> {
        let operation = ApiOperation::DeleteImage;
        if let Err(e) = validate_id(id) {
            return Self::reject(operation, e);
        }

        let url = self.item_url(id, "");
        self.send(operation, &url, self.http.delete(&url)).await
    }
}
