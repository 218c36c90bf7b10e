// Domain models (wire records of the image service)
// Pure Rust, no transport dependencies

mod de;

pub mod image;
pub mod status;
pub mod transformation;

pub use image::*;
pub use status::{ImageStatus, StatusFilter};
pub use transformation::{
    BlurConfig, ResizeConfig, RotateAngle, RotateConfig, Transformation, TransformationKind,
    TrimConfig,
};
