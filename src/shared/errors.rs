use reqwest::StatusCode;
use thiserror::Error;

/// Remote operations exposed by the image service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    ListImages,
    GetImage,
    GetImageMetadata,
    CreateImage,
    UpdateImage,
    DeleteImage,
    StreamAllImages,
    StreamImage,
    FetchObject,
}

impl ApiOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiOperation::ListImages => "list_images",
            ApiOperation::GetImage => "get_image",
            ApiOperation::GetImageMetadata => "get_image_metadata",
            ApiOperation::CreateImage => "create_image",
            ApiOperation::UpdateImage => "update_image",
            ApiOperation::DeleteImage => "delete_image",
            ApiOperation::StreamAllImages => "stream_all_images",
            ApiOperation::StreamImage => "stream_image",
            ApiOperation::FetchObject => "fetch_object",
        }
    }

    /// Generic, user-facing failure message for this operation.
    pub fn failure_message(&self) -> &'static str {
        match self {
            ApiOperation::ListImages => "Failed to fetch images",
            ApiOperation::GetImage => "Failed to fetch image",
            ApiOperation::GetImageMetadata => "Failed to fetch image metadata",
            ApiOperation::CreateImage => "Failed to create image",
            ApiOperation::UpdateImage => "Failed to update image",
            ApiOperation::DeleteImage => "Failed to delete image",
            ApiOperation::StreamAllImages => "Failed to stream image updates",
            ApiOperation::StreamImage => "Failed to stream image",
            ApiOperation::FetchObject => "Failed to fetch object",
        }
    }
}

impl std::fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.failure_message())
    }
}

/// Input rejected before any request is issued.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Image URL is required")]
    EmptyImageUrl,

    #[error("Invalid image URL '{url}': {reason}")]
    InvalidImageUrl { url: String, reason: String },

    #[error("At least one transformation is required")]
    NoTransformations,

    #[error("Unknown transformation: {0}")]
    UnknownTransformation(String),

    #[error("Transformation '{0}' is not supported by this client")]
    UnsupportedTransformation(String),

    #[error("Invalid {kind} configuration: {reason}")]
    InvalidConfig { kind: &'static str, reason: String },

    #[error("Transformation #{index} is invalid: {source}")]
    InvalidTransformation {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("No pending edits to save")]
    NoPendingEdits,

    #[error("No transformation at position {index} (list has {len})")]
    TransformationIndexOutOfRange { index: usize, len: usize },

    #[error("Image id is required")]
    EmptyId,

    #[error("Storage key is required")]
    EmptyStorageKey,

    #[error("Page must be at least 1 (got {0})")]
    InvalidPage(u32),

    #[error("Limit must be between 1 and {max} (got {value})")]
    InvalidLimit { value: u32, max: u32 },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{operation}: {source}")]
    Transport {
        operation: ApiOperation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation}: server responded with {status}")]
    Status {
        operation: ApiOperation,
        status: StatusCode,
    },

    #[error("{operation}: malformed response body: {source}")]
    Decode {
        operation: ApiOperation,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation}: {reason}")]
    UnexpectedResponse {
        operation: ApiOperation,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Stream task ended abnormally: {0}")]
    StreamTask(String),
}

impl ClientError {
    /// Operation that failed, when the error came from a remote call.
    pub fn operation(&self) -> Option<ApiOperation> {
        match self {
            ClientError::Transport { operation, .. }
            | ClientError::Status { operation, .. }
            | ClientError::Decode { operation, .. }
            | ClientError::UnexpectedResponse { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
