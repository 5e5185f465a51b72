//! CLI output formatting.
//!
//! Each command has a `format_*` function returning lines, which keeps them
//! pure and testable, and `main` prints them. Entities lead with a 3-digit
//! positional index, with details on the same line or indented below.
//!
//! ```text
//! 0:/trips
//! Directories
//!     001 japan/
//!     002 norway/
//! Images
//!     001 dawn.jpg  4000x3000
//!     002 surf.jpg  1920x1080  +movie
//! ```

use crate::index::IndexSummary;
use crate::library::{DirectoryListing, WarmStats};
use crate::locator::Locator;
use crate::resource::ImageMetadata;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

const INDENT: &str = "    ";

fn last_component(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn dimensions(width: u32, height: u32) -> String {
    if width == 0 && height == 0 {
        "unreadable".to_string()
    } else {
        format!("{width}x{height}")
    }
}

pub fn format_indexes(indexes: &[IndexSummary]) -> Vec<String> {
    indexes
        .iter()
        .map(|index| format!("{} {}", index.id, index.name))
        .collect()
}

pub fn format_listing(locator: &Locator, listing: &DirectoryListing) -> Vec<String> {
    let mut lines = vec![locator.to_string()];

    if !listing.subdirectories.is_empty() {
        lines.push("Directories".to_string());
        for (i, dir) in listing.subdirectories.iter().enumerate() {
            lines.push(format!("{INDENT}{} {}/", format_index(i + 1), dir.name));
        }
    }
    if !listing.images.is_empty() {
        lines.push("Images".to_string());
        for (i, image) in listing.images.iter().enumerate() {
            let movie = if image.has_movie { "  +movie" } else { "" };
            lines.push(format!(
                "{INDENT}{} {}  {}{movie}",
                format_index(i + 1),
                last_component(&image.path),
                dimensions(image.width, image.height)
            ));
        }
    }
    if listing.subdirectories.is_empty() && listing.images.is_empty() {
        lines.push(format!("{INDENT}(empty)"));
    }
    lines
}

pub fn format_metadata(locator: &Locator, metadata: &ImageMetadata) -> Vec<String> {
    vec![
        locator.to_string(),
        format!("{INDENT}Size: {}", dimensions(metadata.width, metadata.height)),
        format!(
            "{INDENT}Movie: {}",
            if metadata.has_movie { "yes" } else { "no" }
        ),
    ]
}

pub fn format_warm(index: &IndexSummary, stats: &WarmStats) -> String {
    format!("{} {}: {}", index.id, index.name, stats)
}
