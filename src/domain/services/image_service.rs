//! Service seam between view state and transport
//!
//! `ImageApiClient` is the production implementation; view-state tests use an
//! in-memory one.

use async_trait::async_trait;

use crate::domain::models::{
    CreateImageRequest, CreateImageResponse, Image, ImageMetadata, ListImagesResponse,
    MessageResponse, UpdateImageRequest,
};
use crate::shared::errors::Result;

/// CRUD operations on the `/v1/images/` resource
#[async_trait]
pub trait ImageService: Send + Sync {
    /// One page of images (`page` is 1-based)
    async fn list_images(&self, page: u32, limit: u32) -> Result<ListImagesResponse>;

    async fn get_image(&self, id: &str) -> Result<Image>;

    /// Supplementary details; callers should treat failure as non-fatal
    async fn get_image_metadata(&self, id: &str) -> Result<ImageMetadata>;

    /// Returns only the new identifier
    async fn create_image(&self, request: &CreateImageRequest) -> Result<CreateImageResponse>;

    /// Replaces the whole transformation list
    async fn update_image(&self, request: &UpdateImageRequest) -> Result<MessageResponse>;

    async fn delete_image(&self, id: &str) -> Result<MessageResponse>;
}
