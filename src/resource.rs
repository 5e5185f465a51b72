//! Long-lived resource objects: directories and images.
//!
//! One instance exists per canonical path (see [`ResourceCache`](crate::cache::ResourceCache)).
//! Each carries a lazily filled slot: a directory its [`Listing`], an image
//! its [`ImageMetadata`]. Slots are behind a `Mutex` rather than a `OnceLock`
//! because filling them can fail, and a failure must leave the slot empty so
//! the next caller retries. Holding the lock while filling is what collapses
//! concurrent builders into one.

use crate::locator::Locator;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock a slot, recovering from poisoning. Slots hold either nothing or a
/// fully built value, so a panic elsewhere cannot leave them half-written.
pub(crate) fn lock_slot<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One listed entry: its name inside the scanned directory and the shared
/// instance it resolves to. The name is what the directory holds; through a
/// symlink it can differ from the last component of `resource.locator`.
#[derive(Debug)]
pub struct Entry<T> {
    pub name: String,
    pub resource: Arc<T>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            resource: Arc::clone(&self.resource),
        }
    }
}

/// Immediate contents of a directory, name-ordered, hidden entries excluded.
#[derive(Debug, Default)]
pub struct Listing {
    pub directories: Vec<Entry<Directory>>,
    pub images: Vec<Entry<Image>>,
}

#[derive(Debug)]
pub struct Directory {
    /// Canonical locator: names `path` without going through a symlink.
    pub locator: Locator,
    /// Canonical absolute path; the cache key.
    pub path: PathBuf,
    pub(crate) listing: Mutex<Option<Arc<Listing>>>,
}

impl Directory {
    pub(crate) fn new(locator: Locator, path: PathBuf) -> Self {
        Self {
            locator,
            path,
            listing: Mutex::new(None),
        }
    }

    /// The cached listing, if one has been computed.
    pub fn cached_listing(&self) -> Option<Arc<Listing>> {
        lock_slot(&self.listing).clone()
    }
}

/// Per-image metadata, as persisted in the metadata artifact. It describes
/// the file, not any one locator reaching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub has_movie: bool,
}

#[derive(Debug)]
pub struct Image {
    /// Canonical locator, as for [`Directory::locator`].
    pub locator: Locator,
    /// Canonical absolute path; the cache key.
    pub path: PathBuf,
    pub(crate) metadata: Mutex<Option<ImageMetadata>>,
}

impl Image {
    pub(crate) fn new(locator: Locator, path: PathBuf) -> Self {
        Self {
            locator,
            path,
            metadata: Mutex::new(None),
        }
    }
}
