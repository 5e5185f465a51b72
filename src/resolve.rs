//! Resource path resolution with strict root containment.
//!
//! Resolution runs in two passes:
//!
//! 1. **Lexical**: the relative path is normalized without touching the
//!    filesystem. `.` segments vanish, `..` pops the previous segment, and a
//!    `..` with nothing left to pop is rejected as [`ResolveError::PathTraversal`].
//!    Leading separators are ignored, so `/a/b` and `a/b` are the same path.
//! 2. **Canonical**: the candidate under the index root is canonicalized
//!    (following symlinks) and must still be a component-wise descendant of
//!    the canonical root. A symlink pointing outside its root fails here.
//!
//! Symlinks that stay inside the root are followed.

use crate::index::IndexRegistry;
use crate::locator::Locator;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Unknown index: {0}")]
    InvalidIndex(usize),
    #[error("Path escapes its index root: {0}")]
    PathTraversal(Locator),
    #[error("Not found: {0}")]
    NotFound(Locator),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Map a locator to the canonical absolute path it names.
///
/// Fails with `InvalidIndex` before any path is built and with
/// `PathTraversal` before any filesystem access when the relative path
/// climbs out lexically.
pub fn resolve(registry: &IndexRegistry, locator: &Locator) -> Result<PathBuf, ResolveError> {
    let index = registry
        .get(locator.index)
        .ok_or(ResolveError::InvalidIndex(locator.index))?;

    let relative = locator
        .normalized()
        .ok_or_else(|| ResolveError::PathTraversal(locator.clone()))?;
    let candidate = index.root.join(&relative.path);

    let canonical = candidate.canonicalize().map_err(|source| match source.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => ResolveError::NotFound(locator.clone()),
        _ => ResolveError::Io {
            path: candidate.clone(),
            source,
        },
    })?;

    if !canonical.starts_with(&index.root) {
        return Err(ResolveError::PathTraversal(locator.clone()));
    }
    Ok(canonical)
}

/// The locator of `path` relative to `root`, with `/` separators.
/// `None` when `path` is outside `root` or not valid UTF-8.
pub fn relative_locator(index: usize, root: &Path, path: &Path) -> Option<Locator> {
    let parts: Option<Vec<&str>> = path
        .strip_prefix(root)
        .ok()?
        .iter()
        .map(|part| part.to_str())
        .collect();
    Some(Locator::new(index, parts?.join("/")))
}

/// Whether the locator names a directory. Missing paths are `NotFound`.
pub fn is_directory(registry: &IndexRegistry, locator: &Locator) -> Result<bool, ResolveError> {
    let path = resolve(registry, locator)?;
    let metadata = std::fs::metadata(&path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ResolveError::NotFound(locator.clone()),
        _ => ResolveError::Io { path, source },
    })?;
    Ok(metadata.is_dir())
}
