// Service seam and input validation
// Transport-free; the HTTP client lives in infrastructure

pub mod image_service;
pub mod validation;

pub use image_service::ImageService;
pub use validation::*;
