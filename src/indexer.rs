//! Directory indexing: partition a directory into subdirectories and images.
//!
//! A single pass over the immediate entries, sorted by name, produces both
//! halves of a [`Listing`]. Hidden (dot-prefixed) entries and files outside
//! the format allow-list are skipped. Entries are classified after following
//! symlinks, and the allow-list is checked against the link target, the same
//! file the thumbnail is later made from. A symlink whose target leaves the
//! index root is dropped, as is any entry whose name is not valid UTF-8 (it
//! could not be addressed by a locator anyway).
//!
//! Each [`Entry`] keeps the name it has in the scanned directory, so a
//! listing reads the same whichever locator first reached its entries.
//!
//! The full listing is computed once per [`Directory`] and cached on it.

use crate::cache::ResourceCache;
use crate::imaging::is_supported_image;
use crate::resolve::ResolveError;
use crate::resource::{Directory, Entry, Image, Listing, lock_slot};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Bound on first-child descent when looking for a representative image.
pub const MAX_REPRESENTATIVE_DEPTH: usize = 64;

fn io_error(dir: &Directory, path: &Path, source: std::io::Error) -> ResolveError {
    match source.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => {
            ResolveError::NotFound(dir.locator.clone())
        }
        _ => ResolveError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Scan `dir` once. With `image_limit`, image collection stops at the limit;
/// directory collection always runs to the end.
fn scan(
    cache: &ResourceCache,
    dir: &Directory,
    image_limit: Option<usize>,
) -> Result<Listing, ResolveError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(&dir.path).map_err(|e| io_error(dir, &dir.path, e))? {
        let entry = entry.map_err(|e| io_error(dir, &dir.path, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            debug!(dir = %dir.locator, entry = ?entry.file_name(), "skipping non UTF-8 entry");
            continue;
        };
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();

    let mut listing = Listing::default();
    for name in names {
        let full = dir.path.join(&name);
        // Follows symlinks; dangling links fail here and are skipped.
        let (Ok(target), Ok(meta)) = (full.canonicalize(), fs::metadata(&full)) else {
            debug!(dir = %dir.locator, entry = %name, "skipping unreadable entry");
            continue;
        };
        let locator = dir.locator.child(&name);

        if meta.is_dir() {
            match cache.directory(&locator) {
                Ok(resource) => listing.directories.push(Entry { name, resource }),
                Err(e) => debug!(locator = %locator, error = %e, "skipping directory"),
            }
        } else if meta.is_file()
            && is_supported_image(&target)
            && image_limit.is_none_or(|limit| listing.images.len() < limit)
        {
            match cache.image(&locator) {
                Ok(resource) => listing.images.push(Entry { name, resource }),
                Err(e) => debug!(locator = %locator, error = %e, "skipping image"),
            }
        }
    }
    Ok(listing)
}

/// The full listing of `dir`, computed on first use and cached on the instance.
///
/// Concurrent callers for the same directory wait on the instance's slot, so
/// the directory is read once. A failed scan leaves the slot empty.
pub fn listing(cache: &ResourceCache, dir: &Directory) -> Result<Arc<Listing>, ResolveError> {
    let mut slot = lock_slot(&dir.listing);
    if let Some(listing) = slot.as_ref() {
        return Ok(Arc::clone(listing));
    }
    let listing = Arc::new(scan(cache, dir, None)?);
    debug!(
        dir = %dir.locator,
        directories = listing.directories.len(),
        images = listing.images.len(),
        "indexed directory"
    );
    *slot = Some(Arc::clone(&listing));
    Ok(listing)
}

/// Child directories of `dir`, by name.
pub fn list_children(
    cache: &ResourceCache,
    dir: &Directory,
) -> Result<Vec<Entry<Directory>>, ResolveError> {
    Ok(listing(cache, dir)?.directories.clone())
}

/// Supported images directly inside `dir`, by name, optionally capped.
///
/// A capped request is served from the cached listing when there is one.
/// Otherwise it scans without caching, so a truncated result never stands in
/// for the full listing.
pub fn list_images(
    cache: &ResourceCache,
    dir: &Directory,
    limit: Option<usize>,
) -> Result<Vec<Entry<Image>>, ResolveError> {
    match limit {
        None => Ok(listing(cache, dir)?.images.clone()),
        Some(limit) => match dir.cached_listing() {
            Some(listing) => Ok(listing.images.iter().take(limit).cloned().collect()),
            None => Ok(scan(cache, dir, Some(limit))?.images),
        },
    }
}

/// First image of `dir`, or of its first subdirectory, and so on down the
/// first-child chain.
///
/// Returns `None` when the chain ends without an image, revisits a directory
/// (symlink cycle), or exceeds [`MAX_REPRESENTATIVE_DEPTH`].
pub fn representative_image(
    cache: &ResourceCache,
    dir: &Arc<Directory>,
) -> Result<Option<Arc<Image>>, ResolveError> {
    let mut visited = HashSet::new();
    let mut current = Arc::clone(dir);

    for _ in 0..MAX_REPRESENTATIVE_DEPTH {
        if !visited.insert(current.path.clone()) {
            debug!(dir = %dir.locator, cycle_at = %current.locator, "directory cycle");
            return Ok(None);
        }
        let listing = listing(cache, &current)?;
        if let Some(image) = listing.images.first() {
            return Ok(Some(Arc::clone(&image.resource)));
        }
        match listing.directories.first() {
            Some(child) => current = Arc::clone(&child.resource),
            None => return Ok(None),
        }
    }
    debug!(dir = %dir.locator, "representative search hit depth bound");
    Ok(None)
}
