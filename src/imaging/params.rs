//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. The
//! [`thumbnail`](crate::thumbnail) generator builds them and hands them to an
//! [`ImageBackend`](super::ImageBackend), which does the pixel work. Keeping
//! the two apart lets tests swap in a recording mock backend.

use image::ImageFormat;
use std::path::PathBuf;

/// Edge length of every thumbnail artifact, in pixels.
pub const THUMBNAIL_SIZE: u32 = 256;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for a square thumbnail: center crop, then resize to `size`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    /// Output edge length; the result is always `size x size`.
    pub size: u32,
    /// Encoding used for the artifact bytes.
    pub format: ImageFormat,
    pub quality: Quality,
}
