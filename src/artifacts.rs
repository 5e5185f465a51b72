//! The mirrored artifact tree under the cache root.
//!
//! ```text
//! <cache_dir>/
//! ├── thumb/<absolute source path>          # thumbnails, same extension as source
//! └── meta/<absolute source path>.json      # metadata records
//! ```
//!
//! Every write goes to a temporary file in the destination directory and is
//! renamed into place, so readers see either no artifact or a complete one.
//! A failed write drops the temporary file and leaves nothing behind.
//!
//! Generators serialize on a per-key lock from [`ArtifactStore::with_lock`]:
//! concurrent requests for the same artifact wait for the first builder and
//! then find its result on disk.

use crate::resource::lock_slot;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

const THUMB_DIR: &str = "thumb";
const META_DIR: &str = "meta";

pub struct ArtifactStore {
    root: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the thumbnail of `source` lives.
    pub fn thumbnail_path(&self, source: &Path) -> PathBuf {
        self.mirror(THUMB_DIR, source)
    }

    /// Where the metadata record of `source` lives.
    pub fn metadata_path(&self, source: &Path) -> PathBuf {
        let mut path = self.mirror(META_DIR, source).into_os_string();
        path.push(".json");
        PathBuf::from(path)
    }

    /// `root/<kind>/<source without root or prefix>`.
    fn mirror(&self, kind: &str, source: &Path) -> PathBuf {
        let mut path = self.root.join(kind);
        path.extend(source.components().filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        }));
        path
    }

    /// Write `bytes` to `dest` atomically, creating parent directories.
    pub fn write_atomic(&self, dest: &Path, bytes: &[u8]) -> io::Result<()> {
        let parent = dest.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("artifact path has no parent: {}", dest.display()),
            )
        })?;
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::with_prefix_in(temp_prefix(dest), parent)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest).map_err(|e| e.error)?;
        Ok(())
    }

    /// Run `f` while holding the lock for `key`. Callers with different keys
    /// never wait on each other.
    ///
    /// A key's lock lives in the map only while someone holds or waits on it.
    pub fn with_lock<T>(&self, key: &Path, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = lock_slot(&self.locks);
            Arc::clone(locks.entry(key.to_path_buf()).or_default())
        };
        let result = {
            let _guard = lock_slot(&lock);
            f()
        };

        // Clones are taken and dropped only under the map lock, so a count of
        // two (the map's and ours) means nobody else holds or waits on it.
        let mut locks = lock_slot(&self.locks);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
        drop(lock);
        drop(locks);
        result
    }
}

/// Temp files start with a dot so a half-written one never looks like an
/// artifact to anything scanning the tree.
fn temp_prefix(dest: &Path) -> OsString {
    let mut prefix = OsString::from(".");
    if let Some(name) = dest.file_name() {
        prefix.push(name);
    }
    prefix.push(".");
    prefix
}
