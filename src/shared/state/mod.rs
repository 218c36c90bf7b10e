//! View state shared by the front-ends
//!
//! Plain owned data: the owning view mutates it in response to a completed
//! call or a pushed update.

pub mod announcements;
pub mod detail;
pub mod draft;
pub mod gallery;

pub use announcements::{ANNOUNCEMENT_BACKLOG, AnnouncementFeed};
pub use detail::DetailState;
pub use draft::{CreateImageForm, TransformationDraft};
pub use gallery::GalleryState;

#[cfg(test)]
pub(crate) mod test_support;
