//! The index registry: the immutable list of configured image roots.
//!
//! Built once at startup from [`IndexConfig`] entries. Every root is
//! canonicalized here so containment checks later compare canonical paths
//! on both sides. The id of an index is its position in the config.

use crate::config::IndexConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Index root {path} is unavailable: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Index root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// A configured root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub id: usize,
    pub name: String,
    /// Canonical absolute root.
    pub root: PathBuf,
}

/// What clients see of an index: the root path stays private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub id: usize,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct IndexRegistry {
    indexes: Vec<Index>,
}

impl IndexRegistry {
    pub fn from_config(configs: &[IndexConfig]) -> Result<Self, RegistryError> {
        let indexes = configs
            .iter()
            .enumerate()
            .map(|(id, config)| {
                let root = canonical_root(&config.path)?;
                Ok(Index {
                    id,
                    name: config.name.clone(),
                    root,
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;
        Ok(Self { indexes })
    }

    pub fn get(&self, id: usize) -> Option<&Index> {
        self.indexes.get(id)
    }

    pub fn summaries(&self) -> Vec<IndexSummary> {
        self.indexes
            .iter()
            .map(|index| IndexSummary {
                id: index.id,
                name: index.name.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

fn canonical_root(path: &Path) -> Result<PathBuf, RegistryError> {
    let root = path
        .canonicalize()
        .map_err(|source| RegistryError::RootUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
    if !root.is_dir() {
        return Err(RegistryError::NotADirectory(root));
    }
    Ok(root)
}
