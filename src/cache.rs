//! In-process resource cache: one object per canonical path.
//!
//! Directories and images are memoized by the canonical absolute path their
//! locator resolves to, so `0:/a` and `0:/a/../a/` share an instance, as do
//! two locators reaching the same file through an in-root symlink. An
//! instance is named by its canonical locator, never by the spelling of the
//! request that created it.
//!
//! # Design
//!
//! The cache is an explicit service owned by the [`Library`](crate::library::Library)
//! and handed to the indexer, not a process-wide global, so tests build
//! isolated instances freely.
//!
//! Lookups resolve first (outside any lock; resolution may stat), then take
//! the map lock and insert-if-absent. Construction is cheap and infallible,
//! so doing it under the lock is what makes it happen exactly once per key
//! even with concurrent callers. Expensive work (listing, metadata) happens
//! later, per instance, behind each object's own slot lock.
//!
//! Entries are never evicted; they live as long as the cache.

use crate::index::IndexRegistry;
use crate::locator::Locator;
use crate::resolve::{self, ResolveError};
use crate::resource::{Directory, Image, lock_slot};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Insert-once map from canonical path to shared instance.
struct Slots<T> {
    map: Mutex<HashMap<PathBuf, Arc<T>>>,
}

impl<T> Slots<T> {
    fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    fn get_or_insert_with(&self, key: PathBuf, build: impl FnOnce(PathBuf) -> T) -> Arc<T> {
        let mut map = lock_slot(&self.map);
        if let Some(existing) = map.get(&key) {
            return Arc::clone(existing);
        }
        let value = Arc::new(build(key.clone()));
        map.insert(key, Arc::clone(&value));
        value
    }

    fn len(&self) -> usize {
        lock_slot(&self.map).len()
    }
}

pub struct ResourceCache {
    registry: Arc<IndexRegistry>,
    directories: Slots<Directory>,
    images: Slots<Image>,
}

impl ResourceCache {
    pub fn new(registry: Arc<IndexRegistry>) -> Self {
        Self {
            registry,
            directories: Slots::new(),
            images: Slots::new(),
        }
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Shared directory object for `locator`.
    pub fn directory(&self, locator: &Locator) -> Result<Arc<Directory>, ResolveError> {
        let (locator, path) = self.resolve(locator)?;
        Ok(self
            .directories
            .get_or_insert_with(path, |path| Directory::new(locator, path)))
    }

    /// Shared image object for `locator`.
    pub fn image(&self, locator: &Locator) -> Result<Arc<Image>, ResolveError> {
        let (locator, path) = self.resolve(locator)?;
        Ok(self
            .images
            .get_or_insert_with(path, |path| Image::new(locator, path)))
    }

    /// Canonical locator plus canonical path.
    fn resolve(&self, locator: &Locator) -> Result<(Locator, PathBuf), ResolveError> {
        let path = resolve::resolve(&self.registry, locator)?;
        let canonical = self
            .registry
            .get(locator.index)
            .and_then(|index| resolve::relative_locator(locator.index, &index.root, &path))
            // Only a non UTF-8 symlink target lands here
            .unwrap_or_else(|| locator.clone());
        Ok((canonical, path))
    }

    /// Number of cached directories and images.
    pub fn counts(&self) -> (usize, usize) {
        (self.directories.len(), self.images.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    fn cache(tmp: &TempDir) -> ResourceCache {
        let root = tmp.path().join("root");
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/pic.jpg"), b"x").unwrap();
        let registry = IndexRegistry::from_config(&[IndexConfig {
            name: "Root".into(),
            path: root,
        }])
        .unwrap();
        ResourceCache::new(Arc::new(registry))
    }

    #[test]
    fn same_locator_same_directory_instance() {
        let tmp = TempDir::new().unwrap();
        let cache = cache(&tmp);

        let first = cache.directory(&Locator::new(0, "a")).unwrap();
        let second = cache.directory(&Locator::new(0, "a")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn equivalent_spellings_share_an_instance() {
        let tmp = TempDir::new().unwrap();
        let cache = cache(&tmp);

        let plain = cache.image(&Locator::new(0, "a/pic.jpg")).unwrap();
        let dotted = cache.image(&Locator::new(0, "/a/b/../pic.jpg")).unwrap();
        assert!(Arc::ptr_eq(&plain, &dotted));
        assert_eq!(dotted.locator, Locator::new(0, "a/pic.jpg"));
        assert_eq!(plain.locator, Locator::new(0, "a/pic.jpg"));
        assert_eq!(cache.counts(), (0, 1));
    }

    #[test]
    fn instances_are_named_by_their_canonical_locator() {
        let tmp = TempDir::new().unwrap();
        let cache = cache(&tmp);

        let dir = cache.directory(&Locator::new(0, "/a/./b/")).unwrap();
        assert_eq!(dir.locator, Locator::new(0, "a/b"));
    }

    #[cfg(unix)]
    #[test]
    fn alias_reached_first_does_not_name_the_instance() {
        let tmp = TempDir::new().unwrap();
        let cache = cache(&tmp);
        let root = tmp.path().join("root");
        std::os::unix::fs::symlink(root.join("a/b"), root.join("z_link")).unwrap();
        std::os::unix::fs::symlink(root.join("a/pic.jpg"), root.join("alias.jpg")).unwrap();

        let via_alias = cache.directory(&Locator::new(0, "z_link")).unwrap();
        let direct = cache.directory(&Locator::new(0, "a/b")).unwrap();
        assert!(Arc::ptr_eq(&via_alias, &direct));
        assert_eq!(via_alias.locator, Locator::new(0, "a/b"));

        let image = cache.image(&Locator::new(0, "alias.jpg")).unwrap();
        assert_eq!(image.locator, Locator::new(0, "a/pic.jpg"));
    }

    #[test]
    fn directories_and_images_are_separate() {
        let tmp = TempDir::new().unwrap();
        let cache = cache(&tmp);

        cache.directory(&Locator::new(0, "a")).unwrap();
        cache.image(&Locator::new(0, "a/pic.jpg")).unwrap();
        cache.directory(&Locator::new(0, "a/b")).unwrap();
        assert_eq!(cache.counts(), (2, 1));
    }

    #[test]
    fn failed_resolution_caches_nothing() {
        let tmp = TempDir::new().unwrap();
        let cache = cache(&tmp);

        assert!(matches!(
            cache.directory(&Locator::new(0, "../..")),
            Err(ResolveError::PathTraversal(_))
        ));
        assert!(matches!(
            cache.image(&Locator::new(0, "a/missing.jpg")),
            Err(ResolveError::NotFound(_))
        ));
        assert_eq!(cache.counts(), (0, 0));
    }

    #[test]
    fn concurrent_lookups_build_once() {
        let tmp = TempDir::new().unwrap();
        let cache = cache(&tmp);

        let instances: Vec<Arc<Directory>> = thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| cache.directory(&Locator::new(0, "a/b")).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(instances.iter().all(|d| Arc::ptr_eq(d, &instances[0])));
        assert_eq!(cache.counts(), (1, 0));
    }
}
