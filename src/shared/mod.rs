pub mod errors;
pub mod logging;
pub mod utils;

// Framework-agnostic view state (gallery, detail, announcements, editors)
pub mod state;
