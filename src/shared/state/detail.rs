use super::draft::TransformationDraft;
use crate::domain::models::{Image, ImageMetadata, UpdateImageRequest};
use crate::domain::services::{ImageService, validate_id};
use crate::infrastructure::storage::ObjectStorage;
use crate::shared::errors::{Result, ValidationError};
use crate::shared::logging::{log_optional_load_failure, log_update_ignored};

const VIEW: &str = "detail";

/// One image with its technical details and an optional edit session
#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    id: String,
    pub image: Option<Image>,
    /// Absent when the metadata call failed; the view still renders
    pub metadata: Option<ImageMetadata>,
    /// Present while the transformation editor is open
    pub draft: Option<TransformationDraft>,
    pub deleted: bool,
    pub error: Option<String>,
}

impl DetailState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image: None,
            metadata: None,
            draft: None,
            deleted: false,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fetch the image, then its metadata. Only the image is required.
    pub async fn load<S>(&mut self, service: &S) -> Result<()>
    where
        S: ImageService + ?Sized,
    {
        let image = match service.get_image(&self.id).await {
            Ok(image) => image,
            Err(error) => {
                self.error = Some(error.to_string());
                return Err(error);
            }
        };
        self.image = Some(image);
        self.error = None;

        self.metadata = match service.get_image_metadata(&self.id).await {
            Ok(metadata) => Some(metadata),
            Err(error) => {
                log_optional_load_failure(VIEW, &self.id, &error);
                None
            }
        };
        Ok(())
    }

    /// Replace the image wholesale with a pushed copy. Updates for other
    /// images are ignored.
    pub fn apply_update(&mut self, image: Image) -> bool {
        if image.id != self.id {
            log_update_ignored(VIEW, &self.id, &image.id);
            return false;
        }
        self.image = Some(image);
        true
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    /// Open the editor on a copy of the current list.
    pub fn start_editing(&mut self) -> &mut TransformationDraft {
        let current = self
            .image
            .as_ref()
            .map(|image| image.transformations.as_slice())
            .unwrap_or_default();
        self.draft.insert(TransformationDraft::from_transformations(current))
    }

    pub fn cancel_editing(&mut self) {
        self.draft = None;
    }

    pub fn draft_mut(&mut self) -> Option<&mut TransformationDraft> {
        self.draft.as_mut()
    }

    /// Submit the draft as a full replace, then reload. The editor stays
    /// open when the update fails.
    pub async fn save_edits<S>(&mut self, service: &S) -> Result<String>
    where
        S: ImageService + ?Sized,
    {
        let draft = self.draft.as_ref().ok_or(ValidationError::NoPendingEdits)?;
        let transformations = draft.to_transformations()?;

        let response = service
            .update_image(&UpdateImageRequest::new(self.id.clone(), transformations))
            .await?;
        self.draft = None;
        self.load(service).await?;
        Ok(response.message)
    }

    /// Delete the image; the local copy is discarded on success.
    pub async fn delete<S>(&mut self, service: &S) -> Result<String>
    where
        S: ImageService + ?Sized,
    {
        validate_id(&self.id)?;
        let response = service.delete_image(&self.id).await?;
        self.image = None;
        self.metadata = None;
        self.draft = None;
        self.deleted = true;
        Ok(response.message)
    }

    pub fn original_url(&self, storage: &ObjectStorage) -> Option<String> {
        self.image.as_ref().and_then(|image| storage.original_url(image))
    }

    pub fn transformed_url(&self, storage: &ObjectStorage) -> Option<String> {
        self.image.as_ref().and_then(|image| storage.transformed_url(image))
    }
}
