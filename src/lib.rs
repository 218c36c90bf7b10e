// Public API exports
pub mod config;
pub mod domain;
pub mod shared;

// HTTP / SSE adapters
pub mod infrastructure;

// Terminal front-end (used by the `henkan` binary)
pub mod cli;

pub use config::ClientConfig;
pub use domain::models::{
    CreateImageRequest, CreateImageResponse, Image, ImageMetadata, ImageStatus,
    ListImagesResponse, MessageResponse, Transformation, TransformationKind, UpdateImageRequest,
};
pub use domain::services::ImageService;
pub use infrastructure::api::{ImageApiClient, StreamScope, StreamStats, Subscription};
pub use infrastructure::storage::ObjectStorage;
pub use shared::errors::{ApiOperation, ClientError, Result, ValidationError};
