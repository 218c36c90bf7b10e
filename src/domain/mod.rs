// Domain layer: wire models and the service seam
pub mod models;
pub mod services;
