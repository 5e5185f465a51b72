//! Locators: `(index id, relative path)` pairs naming one resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical address inside one index. The path is `/`-separated and
/// relative to the index root; `""` names the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub index: usize,
    pub path: String,
}

impl Locator {
    pub fn new(index: usize, path: impl Into<String>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }

    /// The root of an index.
    pub fn root(index: usize) -> Self {
        Self::new(index, "")
    }

    /// Locator of a direct child entry.
    pub fn child(&self, name: &str) -> Self {
        let base = self.path.trim_end_matches('/');
        let path = if base.is_empty() {
            name.to_string()
        } else {
            format!("{base}/{name}")
        };
        Self::new(self.index, path)
    }

    /// Same locator with empty and `.` segments dropped and `..` applied.
    /// `None` if the path climbs above the root.
    pub fn normalized(&self) -> Option<Self> {
        let mut parts = Vec::new();
        for part in self.path.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop()?;
                }
                part => parts.push(part),
            }
        }
        Some(Self::new(self.index, parts.join("/")))
    }

    /// Same locator with the extension of the last component replaced.
    pub fn with_extension(&self, ext: &str) -> Self {
        let trimmed = self.path.trim_end_matches('/');
        let (dir, name) = match trimmed.rsplit_once('/') {
            Some((dir, name)) => (Some(dir), name),
            None => (None, trimmed),
        };
        let stem = match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        };
        let renamed = format!("{stem}.{ext}");
        let path = match dir {
            Some(dir) => format!("{dir}/{renamed}"),
            None => renamed,
        };
        Self::new(self.index, path)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:/{}", self.index, self.path.trim_start_matches('/'))
    }
}
