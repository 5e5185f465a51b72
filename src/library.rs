//! The operations a serving layer calls, one per endpoint.
//!
//! A [`Library`] owns every shared service: the index registry, the resource
//! cache, the artifact store and the image backend. It is `Sync`; share it
//! behind an `Arc` and call it from as many request threads as needed.
//!
//! | Operation | Result |
//! |---|---|
//! | [`list_indexes`](Library::list_indexes) | configured roots, id order |
//! | [`list_directory`](Library::list_directory) | subdirectories + image metadata |
//! | [`image_metadata`](Library::image_metadata) | `{width, height, hasMovie}` |
//! | [`thumbnail`](Library::thumbnail) | thumbnail file (directories use their representative image) |
//! | [`original`](Library::original) | source image file |
//! | [`movie`](Library::movie) | sibling movie file |
//! | [`warm`](Library::warm) | pre-generate every artifact of an index |
//!
//! Failures come back as [`LibraryError`]. A thumbnail that cannot be
//! generated is reported as `NotFound` after being logged; an image that
//! cannot be decoded still lists, with zero dimensions.

use crate::artifacts::ArtifactStore;
use crate::cache::ResourceCache;
use crate::config::LibraryConfig;
use crate::imaging::{ImageBackend, Quality, RustBackend, is_supported_image};
use crate::index::{IndexRegistry, IndexSummary, RegistryError};
use crate::indexer;
use crate::locator::Locator;
use crate::metadata;
use crate::movie;
use crate::resolve::{self, ResolveError};
use crate::resource::{Directory, Image, ImageMetadata};
use crate::thumbnail::{self, ThumbnailArtifact};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LibraryError {
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
        source: io::Error,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<ResolveError> for LibraryError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidIndex(id) => Self::InvalidIndex(id),
            ResolveError::PathTraversal(locator) => Self::PathTraversal(locator),
            ResolveError::NotFound(locator) => Self::NotFound(locator),
            ResolveError::Io { path, source } => Self::Io { path, source },
        }
    }
}

/// A subdirectory as listed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub path: String,
    pub name: String,
}

/// An image as listed to clients: its path plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub has_movie: bool,
}

impl ImageEntry {
    fn new(path: String, metadata: ImageMetadata) -> Self {
        Self {
            path,
            width: metadata.width,
            height: metadata.height,
            has_movie: metadata.has_movie,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    pub subdirectories: Vec<DirectoryEntry>,
    pub images: Vec<ImageEntry>,
}

/// An open file ready to stream.
#[derive(Debug)]
pub struct MediaFile {
    pub path: PathBuf,
    pub len: u64,
    pub file: File,
}

impl MediaFile {
    fn open(path: PathBuf, locator: &Locator) -> Result<Self, LibraryError> {
        let open = || -> io::Result<(File, u64)> {
            let file = File::open(&path)?;
            let len = file.metadata()?.len();
            Ok((file, len))
        };
        match open() {
            Ok((file, len)) => Ok(Self { path, len, file }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(LibraryError::NotFound(locator.clone()))
            }
            Err(source) => Err(LibraryError::Io { path, source }),
        }
    }
}

impl Read for MediaFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Outcome counts for a warm-up run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmStats {
    /// Thumbnails written by this run.
    pub created: usize,
    /// Thumbnails that already existed.
    pub cached: usize,
    /// Images whose thumbnail could not be generated.
    pub failed: usize,
}

impl WarmStats {
    pub fn total(&self) -> usize {
        self.created + self.cached + self.failed
    }

    fn merge(self, other: Self) -> Self {
        Self {
            created: self.created + other.created,
            cached: self.cached + other.cached,
            failed: self.failed + other.failed,
        }
    }
}

impl fmt::Display for WarmStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} cached, {} failed ({} total)",
            self.created,
            self.cached,
            self.failed,
            self.total()
        )
    }
}

pub struct Library<B: ImageBackend = RustBackend> {
    backend: B,
    cache: ResourceCache,
    artifacts: ArtifactStore,
    quality: Quality,
}

impl Library<RustBackend> {
    /// Open a library with the pure-Rust image backend.
    pub fn open(config: &LibraryConfig) -> Result<Self, LibraryError> {
        Self::with_backend(config, RustBackend::new())
    }
}

impl<B: ImageBackend> Library<B> {
    /// Open a library with a specific backend (allows testing with a mock).
    pub fn with_backend(config: &LibraryConfig, backend: B) -> Result<Self, LibraryError> {
        let registry = IndexRegistry::from_config(&config.indexes)?;
        info!(
            indexes = registry.len(),
            cache_dir = %config.cache_dir.display(),
            "library opened"
        );
        Ok(Self {
            backend,
            cache: ResourceCache::new(Arc::new(registry)),
            artifacts: ArtifactStore::new(&config.cache_dir),
            quality: Quality::new(config.thumbnails.quality),
        })
    }

    fn registry(&self) -> &IndexRegistry {
        self.cache.registry()
    }

    pub fn list_indexes(&self) -> Vec<IndexSummary> {
        self.registry().summaries()
    }

    pub fn is_directory(&self, locator: &Locator) -> Result<bool, LibraryError> {
        Ok(resolve::is_directory(self.registry(), locator)?)
    }

    fn directory(&self, locator: &Locator) -> Result<Arc<Directory>, LibraryError> {
        if !self.is_directory(locator)? {
            return Err(LibraryError::NotFound(locator.clone()));
        }
        Ok(self.cache.directory(locator)?)
    }

    /// The image at `locator`. Anything that is not a regular file with a
    /// supported extension is `NotFound`. Through a symlink, the extension
    /// that counts is the target's.
    fn image(&self, locator: &Locator) -> Result<Arc<Image>, LibraryError> {
        let path = resolve::resolve(self.registry(), locator)?;
        if !path.is_file() || !is_supported_image(&path) {
            return Err(LibraryError::NotFound(locator.clone()));
        }
        Ok(self.cache.image(locator)?)
    }

    /// Subdirectories and images of a directory. Entry paths extend the
    /// requested locator with the names the directory holds.
    pub fn list_directory(&self, locator: &Locator) -> Result<DirectoryListing, LibraryError> {
        let dir = self.directory(locator)?;
        let base = locator
            .normalized()
            .ok_or_else(|| LibraryError::PathTraversal(locator.clone()))?;
        let listing = indexer::listing(&self.cache, &dir)?;

        let subdirectories = listing
            .directories
            .iter()
            .map(|entry| DirectoryEntry {
                path: base.child(&entry.name).path,
                name: entry.name.clone(),
            })
            .collect();
        let images = listing
            .images
            .par_iter()
            .map(|entry| {
                ImageEntry::new(base.child(&entry.name).path, self.metadata_of(&entry.resource))
            })
            .collect();

        Ok(DirectoryListing {
            subdirectories,
            images,
        })
    }

    fn metadata_of(&self, image: &Image) -> ImageMetadata {
        metadata::metadata(&self.backend, &self.artifacts, self.registry(), image)
    }

    pub fn image_metadata(&self, locator: &Locator) -> Result<ImageMetadata, LibraryError> {
        let image = self.image(locator)?;
        Ok(self.metadata_of(&image))
    }

    /// Thumbnail for an image, or for a directory's representative image.
    pub fn thumbnail(&self, locator: &Locator) -> Result<MediaFile, LibraryError> {
        let image = if self.is_directory(locator)? {
            let dir = self.cache.directory(locator)?;
            indexer::representative_image(&self.cache, &dir)?
                .ok_or_else(|| LibraryError::NotFound(locator.clone()))?
        } else {
            self.image(locator)?
        };
        let artifact = self.generate_thumbnail(&image, locator)?;
        MediaFile::open(artifact.path, locator)
    }

    /// Generation failures are logged and reported as `NotFound(locator)`.
    fn generate_thumbnail(
        &self,
        image: &Image,
        locator: &Locator,
    ) -> Result<ThumbnailArtifact, LibraryError> {
        thumbnail::thumbnail(&self.backend, &self.artifacts, image, self.quality).map_err(|err| {
            warn!(%locator, error = %err, "thumbnail unavailable");
            LibraryError::NotFound(locator.clone())
        })
    }

    pub fn original(&self, locator: &Locator) -> Result<MediaFile, LibraryError> {
        let image = self.image(locator)?;
        MediaFile::open(image.path.clone(), locator)
    }

    /// The movie accompanying the image at `locator`. Anything but an image
    /// has no movie.
    pub fn movie(&self, locator: &Locator) -> Result<MediaFile, LibraryError> {
        self.image(locator)?;
        let path = movie::movie_path(self.registry(), locator)?;
        MediaFile::open(path, &movie::movie_locator(locator))
    }

    /// Generate metadata and thumbnails for every image under an index, in
    /// parallel. Failures are counted, not returned.
    pub fn warm(&self, index: usize) -> Result<WarmStats, LibraryError> {
        let root = &self
            .registry()
            .get(index)
            .ok_or(LibraryError::InvalidIndex(index))?
            .root;
        let locators = image_locators(index, root);
        debug!(index, images = locators.len(), "warming index");

        let stats = locators
            .par_iter()
            .map(|locator| self.warm_one(locator))
            .reduce(WarmStats::default, WarmStats::merge);
        let (directories, images) = self.cache.counts();
        info!(index, %stats, directories, images, "warm-up finished");
        Ok(stats)
    }

    fn warm_one(&self, locator: &Locator) -> WarmStats {
        let image = match self.image(locator) {
            Ok(image) => image,
            Err(e) => {
                debug!(locator = %locator, error = %e, "skipping during warm-up");
                return WarmStats::default();
            }
        };
        self.metadata_of(&image);
        match self.generate_thumbnail(&image, locator) {
            Ok(ThumbnailArtifact { created: true, .. }) => WarmStats {
                created: 1,
                ..WarmStats::default()
            },
            Ok(_) => WarmStats {
                cached: 1,
                ..WarmStats::default()
            },
            Err(_) => WarmStats {
                failed: 1,
                ..WarmStats::default()
            },
        }
    }
}

/// Locators of every file under `root`, skipping hidden entries. Symlinks
/// are followed; [`Library::image`] rejects targets that leave the root or
/// are not supported images.
fn image_locators(index: usize, root: &Path) -> Vec<Locator> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "walk error");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| resolve::relative_locator(index, root, e.path()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::create_tree;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        library: Library<MockBackend>,
    }

    /// Index 0 holds `entries`; `decodable` images get 4x3 mock dimensions.
    fn fixture(entries: &[&str], decodable: &[&str]) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("photos");
        fs::create_dir_all(&root).unwrap();
        create_tree(&root, entries);
        let canonical = root.canonicalize().unwrap();
        let backend = decodable.iter().fold(MockBackend::new(), |b, path| {
            b.with_dimensions(&canonical.join(path), 4, 3)
        });
        let config = LibraryConfig {
            cache_dir: tmp.path().join("cache"),
            indexes: vec![IndexConfig {
                name: "Photos".into(),
                path: root,
            }],
            ..LibraryConfig::default()
        };
        Fixture {
            library: Library::with_backend(&config, backend).unwrap(),
            tmp,
        }
    }

    fn loc(path: &str) -> Locator {
        Locator::new(0, path)
    }

    #[test]
    fn lists_indexes_in_config_order() {
        let fx = fixture(&[], &[]);
        assert_eq!(
            fx.library.list_indexes(),
            vec![IndexSummary {
                id: 0,
                name: "Photos".into()
            }]
        );
    }

    #[test]
    fn nested_empty_directory_scenario() {
        let fx = fixture(&["a/b/"], &[]);

        let listing = fx.library.list_directory(&loc("a")).unwrap();
        assert_eq!(
            listing,
            DirectoryListing {
                subdirectories: vec![DirectoryEntry {
                    path: "a/b".into(),
                    name: "b".into(),
                }],
                images: vec![],
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn alias_does_not_rename_listed_entries() {
        let fx = fixture(&["a/b/pic.jpg"], &["a/b/pic.jpg"]);
        let root = fx.tmp.path().join("photos");
        std::os::unix::fs::symlink(root.join("a/b"), root.join("z_link")).unwrap();

        // Index the root first so the alias is the first locator to reach a/b.
        fx.library.list_directory(&Locator::root(0)).unwrap();
        fx.library.list_directory(&loc("z_link")).unwrap();

        let a = fx.library.list_directory(&loc("a")).unwrap();
        assert_eq!(
            a.subdirectories,
            vec![DirectoryEntry {
                path: "a/b".into(),
                name: "b".into(),
            }]
        );
        let b = fx.library.list_directory(&loc("a/b")).unwrap();
        assert_eq!(b.images[0].path, "a/b/pic.jpg");
        let alias = fx.library.list_directory(&loc("z_link/")).unwrap();
        assert_eq!(alias.images[0].path, "z_link/pic.jpg");
        assert_eq!((alias.images[0].width, alias.images[0].height), (4, 3));
    }

    #[cfg(unix)]
    #[test]
    fn image_checks_use_the_link_target() {
        let fx = fixture(&["x/notes.txt", "x/real.jpg"], &["x/real.jpg"]);
        let x = fx.tmp.path().join("photos/x");
        std::os::unix::fs::symlink(x.join("notes.txt"), x.join("alias.jpg")).unwrap();
        std::os::unix::fs::symlink(x.join("real.jpg"), x.join("other.txt")).unwrap();

        let listing = fx.library.list_directory(&loc("x")).unwrap();
        let paths: Vec<_> = listing.images.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["x/other.txt", "x/real.jpg"]);

        assert!(matches!(
            fx.library.original(&loc("x/alias.jpg")),
            Err(LibraryError::NotFound(_))
        ));
        assert!(matches!(
            fx.library.thumbnail(&loc("x/alias.jpg")),
            Err(LibraryError::NotFound(_))
        ));
        // Everything listed can be thumbnailed
        for path in paths {
            assert!(fx.library.thumbnail(&loc(path)).is_ok(), "{path}");
        }
    }

    #[test]
    fn listing_includes_metadata_in_name_order() {
        let fx = fixture(&["x/2.jpg", "x/1.jpg", "x/1.mp4", "x/.h.jpg"], &["x/1.jpg", "x/2.jpg"]);

        let listing = fx.library.list_directory(&loc("x")).unwrap();
        let summary: Vec<_> = listing
            .images
            .iter()
            .map(|m| (m.path.as_str(), m.width, m.has_movie))
            .collect();
        assert_eq!(summary, vec![("x/1.jpg", 4, true), ("x/2.jpg", 4, false)]);
    }

    #[test]
    fn corrupt_image_still_lists() {
        let fx = fixture(&["x/good.jpg", "x/bad.jpg"], &["x/good.jpg"]);

        let listing = fx.library.list_directory(&loc("x")).unwrap();
        let bad = listing.images.iter().find(|m| m.path == "x/bad.jpg").unwrap();
        assert_eq!((bad.width, bad.height, bad.has_movie), (0, 0, false));
    }

    #[test]
    fn listing_a_file_or_missing_path_is_not_found() {
        let fx = fixture(&["x/a.jpg"], &[]);

        assert!(matches!(
            fx.library.list_directory(&loc("x/a.jpg")),
            Err(LibraryError::NotFound(_))
        ));
        assert!(matches!(
            fx.library.list_directory(&loc("nope")),
            Err(LibraryError::NotFound(_))
        ));
    }

    #[test]
    fn errors_map_through() {
        let fx = fixture(&["x/a.jpg"], &[]);

        assert!(matches!(
            fx.library.list_directory(&Locator::new(9, "")),
            Err(LibraryError::InvalidIndex(9))
        ));
        assert!(matches!(
            fx.library.original(&loc("../photos/x/a.jpg")),
            Err(LibraryError::PathTraversal(_))
        ));
    }

    #[test]
    fn unsupported_files_are_not_images() {
        let fx = fixture(&["x/notes.txt"], &[]);

        assert!(matches!(
            fx.library.image_metadata(&loc("x/notes.txt")),
            Err(LibraryError::NotFound(_))
        ));
        assert!(matches!(
            fx.library.original(&loc("x")),
            Err(LibraryError::NotFound(_))
        ));
    }

    #[test]
    fn directory_thumbnail_uses_representative_image() {
        let fx = fixture(&["a/b/first.jpg", "a/b/second.jpg"], &["a/b/first.jpg"]);

        let mut media = fx.library.thumbnail(&loc("a")).unwrap();
        let mut bytes = Vec::new();
        media.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, b"mock-thumbnail");
        assert!(media.path.ends_with("a/b/first.jpg"));
        assert_eq!(media.len, bytes.len() as u64);
    }

    #[test]
    fn thumbnail_of_imageless_directory_is_not_found() {
        let fx = fixture(&["a/b/", "a/readme.txt"], &[]);

        assert!(matches!(
            fx.library.thumbnail(&loc("a")),
            Err(LibraryError::NotFound(_))
        ));
    }

    #[test]
    fn failed_generation_is_not_found() {
        let fx = fixture(&["x/bad.jpg"], &[]);

        assert!(matches!(
            fx.library.thumbnail(&loc("x/bad.jpg")),
            Err(LibraryError::NotFound(_))
        ));
        assert!(!fx.tmp.path().join("cache/thumb").exists());
    }

    #[test]
    fn original_and_movie_stream_files() {
        let fx = fixture(&["x/clip.jpg", "x/clip.mp4", "x/still.jpg"], &[]);

        let original = fx.library.original(&loc("x/clip.jpg")).unwrap();
        assert_eq!(original.len, b"placeholder".len() as u64);

        let movie = fx.library.movie(&loc("x/clip.jpg")).unwrap();
        assert!(movie.path.ends_with("x/clip.mp4"));

        assert!(matches!(
            fx.library.movie(&loc("x/still.jpg")),
            Err(LibraryError::NotFound(l)) if l.path == "x/still.mp4"
        ));
    }

    #[test]
    fn only_images_have_movies() {
        let fx = fixture(&["x/clip.jpg", "x/clip.mp4", "x.mp4"], &[]);

        assert!(matches!(
            fx.library.movie(&loc("x/clip.mp4")),
            Err(LibraryError::NotFound(l)) if l.path == "x/clip.mp4"
        ));
        assert!(matches!(
            fx.library.movie(&loc("x")),
            Err(LibraryError::NotFound(l)) if l.path == "x"
        ));
    }

    #[test]
    fn warm_generates_everything_once() {
        let fx = fixture(
            &["a.jpg", "d/b.png", "d/bad.gif", ".hidden/c.jpg", "d/notes.txt"],
            &["a.jpg", "d/b.png", ".hidden/c.jpg"],
        );

        let first = fx.library.warm(0).unwrap();
        assert_eq!(
            first,
            WarmStats {
                created: 2,
                cached: 0,
                failed: 1
            }
        );

        let second = fx.library.warm(0).unwrap();
        assert_eq!((second.created, second.cached, second.failed), (0, 2, 1));
        // Only the failure is retried
        assert_eq!(fx.library.backend.count_thumbnails(), 4);
    }

    #[test]
    fn warm_unknown_index_is_invalid() {
        let fx = fixture(&[], &[]);
        assert!(matches!(fx.library.warm(3), Err(LibraryError::InvalidIndex(3))));
    }

    #[test]
    fn warm_stats_display() {
        let stats = WarmStats {
            created: 3,
            cached: 5,
            failed: 1,
        };
        assert_eq!(stats.to_string(), "3 created, 5 cached, 1 failed (9 total)");
    }
}
