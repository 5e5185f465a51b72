//! The explicit allow-list of source formats.
//!
//! Indexing, thumbnailing and the movie rule all agree on what counts as an
//! image through this table. Extensions match case-insensitively, so
//! `IMG_0001.JPG` and `img.jpeg` are both in.

use image::ImageFormat;
use std::path::Path;

/// Extension → format. Only formats whose decoder and encoder are compiled in.
const SUPPORTED: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("webp", ImageFormat::WebP),
];

/// Extension of the sibling video a still may carry.
pub const MOVIE_EXTENSION: &str = "mp4";

/// Format implied by the file extension, if it is on the allow-list.
pub fn format_for_path(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?;
    SUPPORTED
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, format)| *format)
}

pub fn is_supported_image(path: &Path) -> bool {
    format_for_path(path).is_some()
}
