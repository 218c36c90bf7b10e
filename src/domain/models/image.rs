use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de::{empty_string_as_none, null_as_default};
use super::status::ImageStatus;
use super::transformation::{Transformation, decode_stored};

/// Service-side upper bound for `limit` on list requests
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Page size used by the gallery view
pub const DEFAULT_GALLERY_LIMIT: u32 = 12;

/// Image record as stored by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub original_image_url: String,
    #[serde(default)]
    pub object_storage_image_key: String,
    /// Set once processing has produced an output object
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub transformed_image_key: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub checksum: String,
    pub status: ImageStatus,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,
    /// Steps this client cannot represent decode as
    /// [`Transformation::Unsupported`] instead of failing the record
    #[serde(default, deserialize_with = "decode_stored")]
    pub transformations: Vec<Transformation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub fn is_processed(&self) -> bool {
        self.status.is_done() && self.transformed_image_key.is_some()
    }
}

/// Technical-details projection of [`Image`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub id: String,
    pub original_image_url: String,
    #[serde(default)]
    pub object_storage_image_key: String,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub transformed_image_key: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    pub status: ImageStatus,
    #[serde(default)]
    pub checksum: String,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,
    #[serde(default)]
    pub transformation_count: usize,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One page of images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListImagesResponse {
    pub page: u32,
    pub limit: u32,
    /// Total number of images across all pages
    pub count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Image>,
}

impl ListImagesResponse {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.count, self.limit)
    }
}

/// `ceil(count / limit)`; zero when there is nothing to show.
pub fn total_pages(count: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    count.div_ceil(u64::from(limit)).min(u64::from(u32::MAX)) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateImageRequest {
    pub image_url: String,
    pub transformations: Vec<Transformation>,
}

impl CreateImageRequest {
    pub fn new(image_url: impl Into<String>, transformations: Vec<Transformation>) -> Self {
        Self {
            image_url: image_url.into(),
            transformations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateImageResponse {
    pub id: String,
}

/// Full replace of an image's transformation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateImageRequest {
    pub id: String,
    pub transformations: Vec<Transformation>,
}

impl UpdateImageRequest {
    pub fn new(id: impl Into<String>, transformations: Vec<Transformation>) -> Self {
        Self {
            id: id.into(),
            transformations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::ValidationError;

    const PENDING_IMAGE: &str = r#"{
        "id": "6f1c2d4e-0000-4000-8000-000000000001",
        "original_image_url": "https://example.com/a.jpg",
        "object_storage_image_key": "",
        "transformed_image_key": "",
        "mime_type": "",
        "checksum": "",
        "status": "pending",
        "transformations": [{"name":"resize","config":{"width":800,"height":600}}],
        "created_at": "2025-01-02T03:04:05.123456789Z",
        "updated_at": "2025-01-02T03:04:05Z"
    }"#;

    #[test]
    fn test_decode_pending_image_normalizes_empty_keys() {
        let image: Image = serde_json::from_str(PENDING_IMAGE).unwrap();
        assert_eq!(image.status, ImageStatus::Pending);
        assert_eq!(image.transformed_image_key, None);
        assert_eq!(image.error_message, None);
        assert_eq!(image.transformations.len(), 1);
        assert!(!image.is_processed());
    }

    #[test]
    fn test_decode_null_transformations() {
        let json = PENDING_IMAGE.replace(
            r#"[{"name":"resize","config":{"width":800,"height":600}}]"#,
            "null",
        );
        let image: Image = serde_json::from_str(&json).unwrap();
        assert!(image.transformations.is_empty());
    }

    #[test]
    fn test_page_with_unrepresentable_steps_still_decodes() {
        let odd = PENDING_IMAGE
            .replace("6f1c2d4e-0000-4000-8000-000000000001", "legacy")
            .replace(
                r#"[{"name":"resize","config":{"width":800,"height":600}}]"#,
                r#"[{"name":"trim","config":{"threshold":12.5}},{"name":"crop","config":{"x":4}},{"name":"grayscale"}]"#,
            );
        let json = format!(
            r#"{{"page":1,"limit":12,"count":2,"data":[{},{}]}}"#,
            PENDING_IMAGE, odd
        );

        let page: ListImagesResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].transformations, vec![Transformation::resize(800, 600).unwrap()]);

        let legacy = &page.data[1];
        assert_eq!(legacy.transformations.len(), 3);
        assert_eq!(
            legacy.transformations[0],
            Transformation::Unsupported {
                name: "trim".to_string(),
                config: serde_json::json!({"threshold": 12.5}),
            }
        );
        assert_eq!(legacy.transformations[1].name(), "crop");
        assert!(!legacy.transformations[1].is_supported());
        assert_eq!(legacy.transformations[2], Transformation::Grayscale);
    }

    #[test]
    fn test_unsupported_steps_are_never_resubmitted() {
        let steps = vec![
            Transformation::Grayscale,
            Transformation::Unsupported {
                name: "crop".to_string(),
                config: serde_json::json!({"x": 4}),
            },
        ];
        let err = UpdateImageRequest::new("legacy", steps).validate().unwrap_err();
        match err {
            ValidationError::InvalidTransformation { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(*source, ValidationError::UnsupportedTransformation("crop".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // submitted bodies stay strict
        assert!(serde_json::from_str::<Transformation>(r#"{"name":"crop","config":{}}"#).is_err());
    }

    #[test]
    fn test_status_decoding_ignores_case() {
        let json = PENDING_IMAGE.replace(r#""status": "pending""#, r#""status": "Processed""#);
        let image: Image = serde_json::from_str(&json).unwrap();
        assert_eq!(image.status, ImageStatus::Processed);
    }

    #[test]
    fn test_decode_processed_image() {
        let json = PENDING_IMAGE
            .replace(r#""status": "pending""#, r#""status": "processed""#)
            .replace(r#""transformed_image_key": """#, r#""transformed_image_key": "out/a.jpg""#);
        let image: Image = serde_json::from_str(&json).unwrap();
        assert!(image.is_processed());
        assert_eq!(image.transformed_image_key.as_deref(), Some("out/a.jpg"));
    }

    #[test]
    fn test_decode_metadata() {
        let json = r#"{
            "id": "abc",
            "original_image_url": "https://example.com/a.jpg",
            "object_storage_image_key": "orig/abc",
            "transformed_image_key": "out/abc",
            "mime_type": "image/jpeg",
            "status": "failed",
            "checksum": "deadbeef",
            "error_message": "decode failed",
            "transformation_count": 3,
            "updated_at": "2025-01-02T03:04:05Z",
            "created_at": "2025-01-02T03:04:05Z"
        }"#;
        let metadata: ImageMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.transformation_count, 3);
        assert_eq!(metadata.status, ImageStatus::Failed);
        assert_eq!(metadata.error_message.as_deref(), Some("decode failed"));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 12), 0);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_create_request_wire_shape() {
        let request = CreateImageRequest::new(
            "https://example.com/a.jpg",
            vec![Transformation::resize(800, 600).unwrap()],
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "image_url": "https://example.com/a.jpg",
                "transformations": [{"name": "resize", "config": {"width": 800, "height": 600}}]
            })
        );
    }
}
