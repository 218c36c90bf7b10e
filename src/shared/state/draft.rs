use crate::domain::models::{CreateImageRequest, Transformation, TransformationKind};
use crate::domain::services::{ImageService, validate_image_url, validate_transformations};
use crate::shared::errors::{Result, ValidationError};

/// Ordered, editable list of transformation steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformationDraft {
    items: Vec<Transformation>,
}

impl TransformationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an image's current list (edit mode)
    pub fn from_transformations(transformations: &[Transformation]) -> Self {
        Self {
            items: transformations.to_vec(),
        }
    }

    pub fn items(&self) -> &[Transformation] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a step of `kind` with its editor defaults.
    pub fn add(&mut self, kind: TransformationKind) -> &Transformation {
        self.push(Transformation::default_for(kind))
    }

    pub fn push(&mut self, transformation: Transformation) -> &Transformation {
        self.items.push(transformation);
        &self.items[self.items.len() - 1]
    }

    pub fn replace(&mut self, index: usize, transformation: Transformation) -> std::result::Result<(), ValidationError> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(ValidationError::TransformationIndexOutOfRange { index, len })?;
        *slot = transformation;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> std::result::Result<Transformation, ValidationError> {
        if index >= self.items.len() {
            return Err(ValidationError::TransformationIndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// The list ready to submit: non-empty, every step valid.
    pub fn to_transformations(&self) -> std::result::Result<Vec<Transformation>, ValidationError> {
        validate_transformations(&self.items)?;
        Ok(self.items.clone())
    }
}

/// Create form: source URL plus the steps to apply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateImageForm {
    pub image_url: String,
    pub draft: TransformationDraft,
}

impl CreateImageForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit button enabled
    pub fn can_submit(&self) -> bool {
        !self.image_url.trim().is_empty() && !self.draft.is_empty()
    }

    pub fn to_request(&self) -> std::result::Result<CreateImageRequest, ValidationError> {
        let image_url = self.image_url.trim();
        validate_image_url(image_url)?;
        let transformations = self.draft.to_transformations()?;
        Ok(CreateImageRequest::new(image_url, transformations))
    }

    /// Validate, create, and reset the form. Returns the new image id.
    pub async fn submit<S>(&mut self, service: &S) -> Result<String>
    where
        S: ImageService + ?Sized,
    {
        let request = self.to_request()?;
        let created = service.create_image(&request).await?;
        *self = Self::default();
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::ClientError;
    use crate::shared::state::test_support::InMemoryImageService;

    #[test]
    fn test_add_uses_editor_defaults() {
        let mut draft = TransformationDraft::new();
        draft.add(TransformationKind::Resize);
        draft.add(TransformationKind::Blur);
        assert_eq!(
            draft.items(),
            &[
                Transformation::resize(800, 600).unwrap(),
                Transformation::blur(1.5).unwrap()
            ]
        );
    }

    #[test]
    fn test_replace_and_remove_keep_order() {
        let mut draft = TransformationDraft::new();
        draft.add(TransformationKind::Grayscale);
        draft.add(TransformationKind::Trim);
        draft.add(TransformationKind::Rotate);

        draft.replace(1, Transformation::trim(42).unwrap()).unwrap();
        let removed = draft.remove(0).unwrap();
        assert_eq!(removed, Transformation::Grayscale);
        assert_eq!(
            draft.items(),
            &[
                Transformation::trim(42).unwrap(),
                Transformation::rotate(90).unwrap()
            ]
        );
    }

    #[test]
    fn test_out_of_range_index() {
        let mut draft = TransformationDraft::new();
        assert_eq!(
            draft.remove(0),
            Err(ValidationError::TransformationIndexOutOfRange { index: 0, len: 0 })
        );
        assert!(draft.replace(3, Transformation::Grayscale).is_err());
    }

    #[test]
    fn test_empty_draft_rejected() {
        let draft = TransformationDraft::new();
        assert_eq!(draft.to_transformations(), Err(ValidationError::NoTransformations));
    }

    #[test]
    fn test_form_can_submit() {
        let mut form = CreateImageForm::new();
        assert!(!form.can_submit());
        form.image_url = "https://example.com/cat.png".to_string();
        assert!(!form.can_submit());
        form.draft.add(TransformationKind::Grayscale);
        assert!(form.can_submit());
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_service() {
        let service = InMemoryImageService::default();
        let mut form = CreateImageForm::new();
        form.image_url = "not a url".to_string();
        form.draft.add(TransformationKind::Grayscale);

        let err = form.submit(&service).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::InvalidImageUrl { .. })
        ));
        assert_eq!(service.call_count(), 0);
        assert_eq!(form.image_url, "not a url");
    }

    #[tokio::test]
    async fn test_submit_creates_and_resets() {
        let service = InMemoryImageService::default();
        let mut form = CreateImageForm::new();
        form.image_url = " https://example.com/cat.png ".to_string();
        form.draft.add(TransformationKind::Rotate);

        let id = form.submit(&service).await.unwrap();
        assert_eq!(id, "img-0");
        assert_eq!(form, CreateImageForm::default());

        let image = service.get_image(&id).await.unwrap();
        assert_eq!(image.original_image_url, "https://example.com/cat.png");
        assert_eq!(image.transformations, vec![Transformation::rotate(90).unwrap()]);
    }
}
