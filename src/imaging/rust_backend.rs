//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header probe, no full decode) |
//! | Decode (JPEG, PNG) | `image::ImageReader` |
//! | Decode (GIF, WebP) | `GifDecoder` / `WebPDecoder` through [`AnimationDecoder`] |
//! | Crop | `DynamicImage::crop_imm` on a [`centered_square_crop`] window |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode | `JpegEncoder` (quality), otherwise `DynamicImage::write_to` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::centered_square_crop;
use super::params::{Quality, ThumbnailParams};
use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPDecoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, Frames, ImageError, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded source. Formats able to carry several frames decode to
/// `Animated` regardless of how many frames this particular file has.
pub enum Decoded {
    Still(DynamicImage),
    Animated(Frames<'static>),
}

impl Decoded {
    /// Collapse to one static image. Animations are represented by their first frame.
    pub fn into_still(self) -> Result<DynamicImage, BackendError> {
        match self {
            Decoded::Still(img) => Ok(img),
            Decoded::Animated(mut frames) => {
                let frame = frames
                    .next()
                    .ok_or_else(|| BackendError::Decode("animation has no frames".into()))?
                    .map_err(|e| BackendError::Decode(e.to_string()))?;
                Ok(DynamicImage::ImageRgba8(frame.into_buffer()))
            }
        }
    }
}

fn decode_error(path: &Path, e: ImageError) -> BackendError {
    match e {
        ImageError::IoError(io) => BackendError::Io(io),
        other => BackendError::Decode(format!("{}: {}", path.display(), other)),
    }
}

/// Load an image from disk, sniffing the format from its content.
pub fn decode(path: &Path) -> Result<Decoded, BackendError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;

    match reader.format() {
        Some(ImageFormat::Gif) => {
            let decoder = GifDecoder::new(BufReader::new(File::open(path)?))
                .map_err(|e| decode_error(path, e))?;
            Ok(Decoded::Animated(decoder.into_frames()))
        }
        Some(ImageFormat::WebP) => {
            let decoder = WebPDecoder::new(BufReader::new(File::open(path)?))
                .map_err(|e| decode_error(path, e))?;
            if decoder.has_animation() {
                Ok(Decoded::Animated(decoder.into_frames()))
            } else {
                DynamicImage::from_decoder(decoder)
                    .map(Decoded::Still)
                    .map_err(|e| decode_error(path, e))
            }
        }
        _ => reader
            .decode()
            .map(Decoded::Still)
            .map_err(|e| decode_error(path, e)),
    }
}

/// Encode into memory. JPEG honours `quality`; GIF and WebP are written as RGBA.
fn encode(img: &DynamicImage, format: ImageFormat, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Cursor::new(Vec::new());
    let written = match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        ImageFormat::Gif | ImageFormat::WebP => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, format)
        }
        other => img.write_to(&mut buf, other),
    };
    written.map_err(|e| BackendError::Encode(format!("{format:?}: {e}")))?;
    Ok(buf.into_inner())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Vec<u8>, BackendError> {
        let img = decode(&params.source)?.into_still()?;

        let crop = centered_square_crop(img.width(), img.height());
        if crop.width == 0 {
            return Err(BackendError::Decode(format!(
                "{}: image has no pixels",
                params.source.display()
            )));
        }

        let square = img.crop_imm(crop.x, crop.y, crop.width, crop.height);
        let thumb = square.resize_exact(params.size, params.size, FilterType::Lanczos3);
        encode(&thumb, params.format, params.quality)
    }
}
