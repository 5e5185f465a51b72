//! Per-image metadata: pixel dimensions and the sibling-movie flag.
//!
//! ## Resolution order
//!
//! 1. The value memoized on the [`Image`] instance.
//! 2. The metadata artifact on disk. Its content is authoritative: once it
//!    exists the source is never probed again, even if the source changes.
//! 3. A fresh probe of the source, which is then persisted and memoized.
//!
//! All three happen under the image's slot lock, so concurrent callers for
//! one image collapse into a single probe.
//!
//! ## Failure
//!
//! A source that cannot be decoded yields [`MetadataError::DecodeFailure`]
//! from [`try_metadata`]. [`metadata`] turns that into a best-effort record
//! (zero dimensions) after logging it. Nothing is persisted or memoized for a
//! failure, so the next call retries from scratch.

use crate::artifacts::ArtifactStore;
use crate::imaging::{BackendError, ImageBackend};
use crate::index::IndexRegistry;
use crate::locator::Locator;
use crate::movie;
use crate::resource::{Image, ImageMetadata, lock_slot};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Cannot decode {locator}: {source}")]
    DecodeFailure {
        locator: Locator,
        #[source]
        source: BackendError,
    },
}

/// Metadata for `image`, falling back to a zero-dimension record when the
/// source cannot be decoded.
pub fn metadata(
    backend: &impl ImageBackend,
    artifacts: &ArtifactStore,
    registry: &IndexRegistry,
    image: &Image,
) -> ImageMetadata {
    match try_metadata(backend, artifacts, registry, image) {
        Ok(metadata) => metadata,
        Err(err @ MetadataError::DecodeFailure { .. }) => {
            warn!(locator = %image.locator, error = %err, "using empty metadata");
            ImageMetadata {
                width: 0,
                height: 0,
                has_movie: movie::has_movie(registry, &image.locator),
            }
        }
    }
}

pub fn try_metadata(
    backend: &impl ImageBackend,
    artifacts: &ArtifactStore,
    registry: &IndexRegistry,
    image: &Image,
) -> Result<ImageMetadata, MetadataError> {
    let mut slot = lock_slot(&image.metadata);
    if let Some(metadata) = slot.as_ref() {
        return Ok(metadata.clone());
    }

    let artifact = artifacts.metadata_path(&image.path);
    if let Some(metadata) = load(&artifact) {
        debug!(locator = %image.locator, "metadata loaded from cache");
        *slot = Some(metadata.clone());
        return Ok(metadata);
    }

    let dimensions =
        backend
            .identify(&image.path)
            .map_err(|source| MetadataError::DecodeFailure {
                locator: image.locator.clone(),
                source,
            })?;
    let metadata = ImageMetadata {
        width: dimensions.width,
        height: dimensions.height,
        has_movie: movie::has_movie(registry, &image.locator),
    };

    // An unwritable cache costs a re-probe next run, not this answer.
    match serde_json::to_vec_pretty(&metadata) {
        Ok(bytes) => match artifacts.write_atomic(&artifact, &bytes) {
            Ok(()) => debug!(locator = %image.locator, artifact = %artifact.display(), "metadata written"),
            Err(e) => warn!(artifact = %artifact.display(), error = %e, "cannot write metadata"),
        },
        Err(e) => warn!(locator = %image.locator, error = %e, "cannot serialize metadata"),
    }

    *slot = Some(metadata.clone());
    Ok(metadata)
}

/// Read a metadata artifact. Missing is `None`; unreadable or malformed is
/// also `None` (logged) so the caller regenerates it.
fn load(path: &Path) -> Option<ImageMetadata> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(artifact = %path.display(), error = %e, "cannot read metadata artifact");
            return None;
        }
    };
    match serde_json::from_slice(&content) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!(artifact = %path.display(), error = %e, "discarding malformed metadata artifact");
            None
        }
    }
}
