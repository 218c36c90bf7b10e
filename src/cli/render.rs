use std::fmt::Write;

use crate::domain::models::{Image, ImageMetadata, ImageStatus, Transformation};
use crate::infrastructure::storage::ObjectStorage;
use crate::shared::state::{DetailState, GalleryState};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn status_badge(status: ImageStatus) -> String {
    format!("[{}]", status)
}

/// `resize 800x600 → grayscale`, or `(none)`
pub fn transformations(list: &[Transformation]) -> String {
    if list.is_empty() {
        return "(none)".to_string();
    }
    list.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" → ")
}

pub fn image_row(image: &Image) -> String {
    format!(
        "{:<38} {:<13} {}  {}",
        image.id,
        status_badge(image.status),
        image.updated_at.format(TIMESTAMP_FORMAT),
        transformations(&image.transformations)
    )
}

pub fn gallery(state: &GalleryState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", state.summary());

    let visible = state.visible_images();
    if visible.is_empty() {
        let _ = writeln!(out, "No images found");
        return out;
    }
    for image in visible {
        let _ = writeln!(out, "{}", image_row(image));
    }
    out
}

pub fn detail(state: &DetailState, storage: &ObjectStorage) -> String {
    let mut out = String::new();
    let Some(image) = state.image.as_ref() else {
        let _ = writeln!(out, "Image {} not loaded", state.id());
        return out;
    };

    let _ = writeln!(out, "Image {}", image.id);
    let _ = writeln!(out, "  Status:       {}", status_badge(image.status));
    if let Some(message) = &image.error_message {
        let _ = writeln!(out, "  Error:        {}", message);
    }
    let _ = writeln!(out, "  Source:       {}", image.original_image_url);
    let _ = writeln!(
        out,
        "  Original:     {}",
        state.original_url(storage).unwrap_or_else(|| "-".to_string())
    );
    let _ = writeln!(
        out,
        "  Transformed:  {}",
        state
            .transformed_url(storage)
            .unwrap_or_else(|| format!("(not available while {})", image.status))
    );
    let _ = writeln!(out, "  Created:      {}", image.created_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "  Updated:      {}", image.updated_at.format(TIMESTAMP_FORMAT));

    let _ = writeln!(out, "  Transformations:");
    if image.transformations.is_empty() {
        let _ = writeln!(out, "    (none)");
    }
    for (index, step) in image.transformations.iter().enumerate() {
        let _ = writeln!(out, "    {}. {}", index + 1, step);
    }

    if let Some(metadata) = &state.metadata {
        let _ = writeln!(out, "  MIME type:    {}", or_dash(&metadata.mime_type));
        let _ = writeln!(out, "  Checksum:     {}", or_dash(&metadata.checksum));
    }
    out
}

pub fn metadata(metadata: &ImageMetadata, storage: &ObjectStorage) -> String {
    let (original, transformed) = storage.metadata_urls(metadata);
    let mut out = String::new();
    let _ = writeln!(out, "Metadata for {}", metadata.id);
    let _ = writeln!(out, "  Status:          {}", status_badge(metadata.status));
    let _ = writeln!(out, "  MIME type:       {}", or_dash(&metadata.mime_type));
    let _ = writeln!(out, "  Checksum:        {}", or_dash(&metadata.checksum));
    let _ = writeln!(out, "  Transformations: {}", metadata.transformation_count);
    let _ = writeln!(out, "  Storage key:     {}", or_dash(&metadata.object_storage_image_key));
    let _ = writeln!(out, "  Original:        {}", original.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  Transformed:     {}", transformed.as_deref().unwrap_or("-"));
    if let Some(message) = &metadata.error_message {
        let _ = writeln!(out, "  Error:           {}", message);
    }
    out
}

/// One line per pushed update while watching a single image
pub fn update_line(image: &Image) -> String {
    let mut line = format!(
        "{} {} {}",
        image.updated_at.format(TIMESTAMP_FORMAT),
        image.id,
        status_badge(image.status)
    );
    if let Some(message) = &image.error_message {
        line.push(' ');
        line.push_str(message);
    }
    line
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
