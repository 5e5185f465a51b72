//! Shared test utilities: synthetic image fixtures and small tree builders.
//!
//! Fixtures are encoded on the fly with the `image` crate, so no binary test
//! data is checked in.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! create_test_jpeg(&tmp.path().join("a.jpg"), 320, 200);
//! create_test_gif(&tmp.path().join("loop.gif"), 30, 20, 3);
//! ```

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{Delay, Frame, ImageEncoder, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
}

fn create_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
}

/// Write a small valid JPEG with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    create_parent(path);
    let img = gradient(width, height);
    let writer = BufWriter::new(File::create(path).unwrap());
    JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid PNG with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    create_parent(path);
    gradient(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write an animated GIF with `frames` solid-color frames. The first frame
/// is pure red; later ones cycle through green and blue.
pub fn create_test_gif(path: &Path, width: u32, height: u32, frames: usize) {
    const COLORS: [[u8; 4]; 3] = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]];

    create_parent(path);
    let mut encoder = GifEncoder::new(BufWriter::new(File::create(path).unwrap()));
    let frames = (0..frames).map(|i| {
        let buffer = RgbaImage::from_pixel(width, height, Rgba(COLORS[i % COLORS.len()]));
        Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1))
    });
    encoder.encode_frames(frames).unwrap();
}

/// Create empty directories and placeholder files under `root`. Entries
/// ending in `/` are directories; everything else is a file whose content
/// is not a decodable image.
pub fn create_tree(root: &Path, entries: &[&str]) {
    for entry in entries {
        let path = root.join(entry.trim_end_matches('/'));
        if entry.ends_with('/') {
            fs::create_dir_all(&path).unwrap();
        } else {
            create_parent(&path);
            fs::write(&path, b"placeholder").unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fixtures_decode_with_expected_dimensions() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("nested/a.jpg"), 12, 7);
        create_test_png(&tmp.path().join("b.png"), 5, 9);
        create_test_gif(&tmp.path().join("c.gif"), 4, 4, 2);

        assert_eq!(image::image_dimensions(tmp.path().join("nested/a.jpg")).unwrap(), (12, 7));
        assert_eq!(image::image_dimensions(tmp.path().join("b.png")).unwrap(), (5, 9));
        assert_eq!(image::image_dimensions(tmp.path().join("c.gif")).unwrap(), (4, 4));
    }

    #[test]
    fn tree_builder_makes_dirs_and_files() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), &["a/b/", "a/x.jpg", ".hidden"]);

        assert!(tmp.path().join("a/b").is_dir());
        assert!(tmp.path().join("a/x.jpg").is_file());
        assert!(tmp.path().join(".hidden").is_file());
    }
}
