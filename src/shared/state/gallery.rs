use crate::domain::models::{
    DEFAULT_GALLERY_LIMIT, Image, ListImagesResponse, StatusFilter, total_pages,
};
use crate::domain::services::ImageService;
use crate::shared::errors::Result;

/// Paginated, filterable list of images
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryState {
    pub page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub images: Vec<Image>,
    /// Case-insensitive substring of the image id
    pub search_query: String,
    pub status_filter: StatusFilter,
    /// Generic failure message of the last load, if it failed
    pub error: Option<String>,
}

impl Default for GalleryState {
    fn default() -> Self {
        Self::new(DEFAULT_GALLERY_LIMIT)
    }
}

impl GalleryState {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total_count: 0,
            images: Vec::new(),
            search_query: String::new(),
            status_filter: StatusFilter::All,
            error: None,
        }
    }

    /// Fetch the current page. On failure the previous page stays visible
    /// and `error` carries the message.
    pub async fn load<S>(&mut self, service: &S) -> Result<()>
    where
        S: ImageService + ?Sized,
    {
        match service.list_images(self.page, self.limit).await {
            Ok(response) => {
                self.apply_page(response);
                Ok(())
            }
            Err(error) => {
                self.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    pub fn apply_page(&mut self, response: ListImagesResponse) {
        self.page = response.page.max(1);
        self.total_count = response.count;
        self.images = response.data;
        self.error = None;
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.limit)
    }

    /// Move to `page`, clamped to the known page range. Returns whether the
    /// page changed (and a reload is due).
    pub fn set_page(&mut self, page: u32) -> bool {
        let last = self.total_pages().max(1);
        let target = page.clamp(1, last);
        let changed = target != self.page;
        self.page = target;
        changed
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    pub fn next_page(&mut self) -> bool {
        self.has_next_page() && self.set_page(self.page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.has_previous_page() && self.set_page(self.page - 1)
    }

    /// Images on the current page passing the search query and status filter
    pub fn visible_images(&self) -> Vec<&Image> {
        let query = self.search_query.trim().to_lowercase();
        self.images
            .iter()
            .filter(|image| query.is_empty() || image.id.to_lowercase().contains(&query))
            .filter(|image| self.status_filter.matches(image.status))
            .collect()
    }

    /// Replace the matching image wholesale. Returns false when the image
    /// is not on the current page.
    pub fn apply_update(&mut self, image: Image) -> bool {
        match self.images.iter_mut().find(|existing| existing.id == image.id) {
            Some(existing) => {
                *existing = image;
                true
            }
            None => false,
        }
    }

    /// Drop a deleted image from the current page.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|image| image.id != id);
        let removed = self.images.len() != before;
        if removed {
            self.total_count = self.total_count.saturating_sub(1);
        }
        removed
    }

    pub fn summary(&self) -> String {
        format!(
            "{} image(s) • Page {} of {}",
            self.total_count,
            self.page,
            self.total_pages().max(1)
        )
    }
}
