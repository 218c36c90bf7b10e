//! Client-side input validation
//!
//! Everything here runs before a request is built, so a rejected input never
//! reaches the network.

use reqwest::Url;

use crate::domain::models::{CreateImageRequest, MAX_PAGE_LIMIT, Transformation, UpdateImageRequest};
use crate::shared::errors::ValidationError;

/// Source URLs must be absolute http(s) URLs with a host.
pub fn validate_image_url(url: &str) -> Result<(), ValidationError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyImageUrl);
    }

    let invalid = |reason: String| ValidationError::InvalidImageUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

/// Non-empty, and every step individually valid.
pub fn validate_transformations(transformations: &[Transformation]) -> Result<(), ValidationError> {
    if transformations.is_empty() {
        return Err(ValidationError::NoTransformations);
    }
    for (index, transformation) in transformations.iter().enumerate() {
        transformation
            .validate()
            .map_err(|source| ValidationError::InvalidTransformation {
                index,
                source: Box::new(source),
            })?;
    }
    Ok(())
}

pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    Ok(())
}

pub fn validate_page(page: u32, limit: u32) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::InvalidPage(page));
    }
    if limit < 1 || limit > MAX_PAGE_LIMIT {
        return Err(ValidationError::InvalidLimit {
            value: limit,
            max: MAX_PAGE_LIMIT,
        });
    }
    Ok(())
}

impl CreateImageRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_image_url(&self.image_url)?;
        validate_transformations(&self.transformations)
    }
}

impl UpdateImageRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id(&self.id)?;
        validate_transformations(&self.transformations)
    }
}
