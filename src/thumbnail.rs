//! Square thumbnail artifacts.
//!
//! A thumbnail is the centered square crop of the source (its first frame,
//! for animated formats), resized to [`THUMBNAIL_SIZE`] and encoded in the
//! source's own format. The artifact lives at the mirrored path from
//! [`ArtifactStore::thumbnail_path`] and, once written, is served as is.
//!
//! Generation runs under the artifact's key lock and re-checks for the file
//! after acquiring it, so concurrent requests produce one write and everyone
//! else picks up the result. A failure at any stage leaves no file behind.

use crate::artifacts::ArtifactStore;
use crate::imaging::{
    BackendError, ImageBackend, Quality, THUMBNAIL_SIZE, ThumbnailParams, format_for_path,
};
use crate::locator::Locator;
use crate::resource::Image;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Thumbnail generation failed for {locator}: {source}")]
    GenerationFailure {
        locator: Locator,
        #[source]
        source: BackendError,
    },
}

/// A thumbnail on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailArtifact {
    pub path: PathBuf,
    /// Whether this call wrote it.
    pub created: bool,
}

/// Describe the thumbnail of `source`.
pub fn plan(source: &Path, quality: Quality) -> Result<ThumbnailParams, BackendError> {
    let format = format_for_path(source).ok_or_else(|| {
        BackendError::Decode(format!("unsupported image format: {}", source.display()))
    })?;
    Ok(ThumbnailParams {
        source: source.to_path_buf(),
        size: THUMBNAIL_SIZE,
        format,
        quality,
    })
}

/// The thumbnail of `image`, generating it on first request.
pub fn thumbnail(
    backend: &impl ImageBackend,
    artifacts: &ArtifactStore,
    image: &Image,
    quality: Quality,
) -> Result<ThumbnailArtifact, ThumbnailError> {
    let dest = artifacts.thumbnail_path(&image.path);
    let cached = || ThumbnailArtifact {
        path: dest.clone(),
        created: false,
    };
    if dest.is_file() {
        return Ok(cached());
    }

    artifacts
        .with_lock(&dest, || -> Result<ThumbnailArtifact, BackendError> {
            if dest.is_file() {
                return Ok(cached());
            }
            let params = plan(&image.path, quality)?;
            let bytes = backend.thumbnail(&params)?;
            if bytes.is_empty() {
                return Err(BackendError::Encode("encoder produced no data".into()));
            }
            artifacts.write_atomic(&dest, &bytes)?;
            debug!(locator = %image.locator, artifact = %dest.display(), "thumbnail written");
            Ok(ThumbnailArtifact {
                path: dest.clone(),
                created: true,
            })
        })
        .map_err(|source| ThumbnailError::GenerationFailure {
            locator: image.locator.clone(),
            source,
        })
}
