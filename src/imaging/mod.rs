//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Flatten animation** | [`Decoded::into_still`] (first frame) |
//! | **Thumbnail** | centered square crop + Lanczos3 `resize_exact` |
//!
//! The module is split into:
//! - **Formats**: the source-format allow-list shared with the indexer
//! - **Calculations**: pure crop geometry (unit testable)
//! - **Parameters**: data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub mod formats;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{CropRect, centered_square_crop};
pub use formats::{MOVIE_EXTENSION, format_for_path, is_supported_image};
pub use params::{Quality, THUMBNAIL_SIZE, ThumbnailParams};
pub use rust_backend::{Decoded, RustBackend};
