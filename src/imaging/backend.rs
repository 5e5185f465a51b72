//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the artifact layer
//! needs from a codec: identify (probe dimensions) and thumbnail (decode,
//! flatten, crop, resize, encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, statically
//! linked, no system libraries.

use super::params::ThumbnailParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Backends never touch the artifact tree: `thumbnail` returns encoded bytes
/// and the caller owns where (and how atomically) they land on disk.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without a full decode where the format allows it.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Produce an encoded square thumbnail for `params.source`.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Vec<u8>, BackendError>;
}
