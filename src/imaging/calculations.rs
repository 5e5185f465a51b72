//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// A crop window inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Calculate the largest square that fits the source, centered on the longer axis.
///
/// The side equals the shorter of width/height. Odd leftovers round the offset
/// down, so a 5x2 source crops at x=1.
///
/// # Examples
/// ```
/// # use lightbox::imaging::centered_square_crop;
/// let crop = centered_square_crop(800, 600);
/// assert_eq!((crop.x, crop.y, crop.width, crop.height), (100, 0, 600, 600));
/// ```
pub fn centered_square_crop(width: u32, height: u32) -> CropRect {
    let side = width.min(height);
    CropRect {
        x: (width - side) / 2,
        y: (height - side) / 2,
        width: side,
        height: side,
    }
}
