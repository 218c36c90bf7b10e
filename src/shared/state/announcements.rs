use crate::domain::models::Image;

/// Number of pushed updates the announcement bar keeps
pub const ANNOUNCEMENT_BACKLOG: usize = 5;

/// Most recent images pushed over the global stream, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnouncementFeed {
    updates: Vec<Image>,
    visible: bool,
}

impl AnnouncementFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pushed image and show the bar.
    pub fn push(&mut self, image: Image) {
        self.updates.insert(0, image);
        self.updates.truncate(ANNOUNCEMENT_BACKLOG);
        self.visible = true;
    }

    pub fn latest(&self) -> Option<&Image> {
        self.updates.first()
    }

    pub fn updates(&self) -> &[Image] {
        &self.updates
    }

    pub fn is_visible(&self) -> bool {
        self.visible && !self.updates.is_empty()
    }

    /// Hide until the next push
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    /// Bar text for the latest update, while visible
    pub fn message(&self) -> Option<String> {
        if !self.is_visible() {
            return None;
        }
        self.latest().map(announcement_text)
    }
}

pub fn announcement_text(image: &Image) -> String {
    format!("New image processed: {} - Status: {}", image.id, image.status)
}
