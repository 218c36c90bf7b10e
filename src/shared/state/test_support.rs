//! In-memory `ImageService` for view-state tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;

use crate::domain::models::{
    CreateImageRequest, CreateImageResponse, Image, ImageMetadata, ImageStatus,
    ListImagesResponse, MessageResponse, Transformation, UpdateImageRequest,
};
use crate::domain::services::ImageService;
use crate::shared::errors::{ApiOperation, ClientError, Result};

pub(crate) fn sample_image(id: &str, status: ImageStatus) -> Image {
    let now = Utc::now();
    Image {
        id: id.to_string(),
        original_image_url: format!("https://example.com/{}.jpg", id),
        object_storage_image_key: format!("originals/{}.jpg", id),
        transformed_image_key: status.is_done().then(|| format!("transformed/{}.jpg", id)),
        mime_type: "image/jpeg".to_string(),
        checksum: String::new(),
        status,
        error_message: None,
        transformations: vec![Transformation::Grayscale],
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub(crate) struct InMemoryImageService {
    images: Mutex<Vec<Image>>,
    next_id: AtomicUsize,
    pub(crate) fail_metadata: bool,
    pub(crate) fail_list: bool,
    pub(crate) calls: AtomicUsize,
}

impl InMemoryImageService {
    pub(crate) fn with_images(images: Vec<Image>) -> Self {
        Self {
            images: Mutex::new(images),
            ..Default::default()
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn not_found(operation: ApiOperation) -> ClientError {
        ClientError::Status {
            operation,
            status: StatusCode::NOT_FOUND,
        }
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageService for InMemoryImageService {
    async fn list_images(&self, page: u32, limit: u32) -> Result<ListImagesResponse> {
        self.record_call();
        if self.fail_list {
            return Err(ClientError::Status {
                operation: ApiOperation::ListImages,
                status: StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        let images = self.images.lock().unwrap();
        let start = ((page.max(1) - 1) * limit) as usize;
        let data = images.iter().skip(start).take(limit as usize).cloned().collect();
        Ok(ListImagesResponse {
            page,
            limit,
            count: images.len() as u64,
            data,
        })
    }

    async fn get_image(&self, id: &str) -> Result<Image> {
        self.record_call();
        self.images
            .lock()
            .unwrap()
            .iter()
            .find(|image| image.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found(ApiOperation::GetImage))
    }

    async fn get_image_metadata(&self, id: &str) -> Result<ImageMetadata> {
        self.record_call();
        if self.fail_metadata {
            return Err(ClientError::Status {
                operation: ApiOperation::GetImageMetadata,
                status: StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        let images = self.images.lock().unwrap();
        let image = images
            .iter()
            .find(|image| image.id == id)
            .ok_or_else(|| Self::not_found(ApiOperation::GetImageMetadata))?;
        Ok(ImageMetadata {
            id: image.id.clone(),
            original_image_url: image.original_image_url.clone(),
            object_storage_image_key: image.object_storage_image_key.clone(),
            transformed_image_key: image.transformed_image_key.clone(),
            mime_type: image.mime_type.clone(),
            status: image.status,
            checksum: image.checksum.clone(),
            error_message: image.error_message.clone(),
            transformation_count: image.transformations.len(),
            updated_at: image.updated_at,
            created_at: image.created_at,
        })
    }

    async fn create_image(&self, request: &CreateImageRequest) -> Result<CreateImageResponse> {
        self.record_call();
        let id = format!("img-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut image = sample_image(&id, ImageStatus::Pending);
        image.original_image_url = request.image_url.clone();
        image.transformations = request.transformations.clone();
        self.images.lock().unwrap().push(image);
        Ok(CreateImageResponse { id })
    }

    async fn update_image(&self, request: &UpdateImageRequest) -> Result<MessageResponse> {
        self.record_call();
        let mut images = self.images.lock().unwrap();
        let image = images
            .iter_mut()
            .find(|image| image.id == request.id)
            .ok_or_else(|| Self::not_found(ApiOperation::UpdateImage))?;
        image.transformations = request.transformations.clone();
        Ok(MessageResponse {
            message: "Image updated".to_string(),
        })
    }

    async fn delete_image(&self, id: &str) -> Result<MessageResponse> {
        self.record_call();
        let mut images = self.images.lock().unwrap();
        let before = images.len();
        images.retain(|image| image.id != id);
        if images.len() == before {
            return Err(Self::not_found(ApiOperation::DeleteImage));
        }
        Ok(MessageResponse {
            message: "Image deleted".to_string(),
        })
    }
}
