//! # Lightbox
//!
//! Resource resolution and derived-artifact caching for serving trees of
//! image directories. A caller names a resource with a [`Locator`](locator::Locator)
//! (index id + relative path); Lightbox maps it to a file inside the index's
//! root, lists directories, and lazily computes thumbnails and metadata that
//! persist on disk across runs.
//!
//! # Architecture
//!
//! ```text
//! Locator ──► resolve ──► ResourceCache ──► Directory ──► indexer (listing)
//!                                      └──► Image ──────► metadata / thumbnail
//!                                                           │
//!                                            ArtifactStore ◄┘  <cache_dir>/{thumb,meta}/…
//! ```
//!
//! Every request is an independent call into a shared [`Library`](library::Library).
//! Shared state is of two kinds: in-process objects (one per canonical path,
//! never evicted) and the on-disk artifact tree (written once, atomically).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`library`] | Facade: one method per serving-layer operation, plus warm-up |
//! | [`index`] | Immutable registry of configured roots |
//! | [`locator`] | `(index, relative path)` value type |
//! | [`resolve`] | Locator → canonical path, with root containment |
//! | [`cache`] | One shared `Directory`/`Image` per canonical path |
//! | [`resource`] | The `Directory`, `Image` and `Listing` objects |
//! | [`indexer`] | Directory listings and representative images |
//! | [`metadata`] | Dimensions + movie flag, persisted as JSON |
//! | [`thumbnail`] | 256×256 center-crop thumbnails |
//! | [`movie`] | `IMG.jpg` ↔ `IMG.mp4` sibling lookup |
//! | [`artifacts`] | Mirrored artifact paths, atomic writes, per-key locks |
//! | [`imaging`] | Codec backend: identify, decode, crop, resize, encode |
//! | [`config`] | `lightbox.toml` loading, merging, validation |
//! | [`logging`] | `tracing` subscriber for the CLI |
//! | [`output`] | CLI text formatting |
//!
//! # Design Decisions
//!
//! ## Containment Before Access
//!
//! A locator's path is normalized lexically first; a `..` that would climb
//! past the root fails before the filesystem is touched. The surviving
//! candidate is then canonicalized and must be a component-wise descendant
//! of the canonical root. Symlinks inside a root are followed; one that
//! points out of it is treated as traversal.
//!
//! ## Write Once, Never Invalidate
//!
//! Artifacts are keyed by the source's absolute path and are never
//! regenerated once on disk. There is no watching and no eviction: removing
//! an artifact by hand is how a rebuild is forced. Writes go through a
//! temp file and a rename, so a crash or a failed encode never leaves a
//! truncated artifact behind.
//!
//! ## At-Most-One Build
//!
//! Concurrent requests for the same uncached object, listing, metadata
//! record or thumbnail collapse into one build: the cache map, each object's
//! slot, and each artifact key have their own lock, held for the build.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for every codec it needs,
//! so the binary has no system library dependencies.

pub mod artifacts;
pub mod cache;
pub mod config;
pub mod imaging;
pub mod index;
pub mod indexer;
pub mod library;
pub mod locator;
pub mod logging;
pub mod metadata;
pub mod movie;
pub mod output;
pub mod resolve;
pub mod resource;
pub mod thumbnail;

#[cfg(test)]
pub(crate) mod test_helpers;
