//! User-defined exclusions with durable JSON storage.
//!
//! The whole collection lives in one file. It is loaded once, cached, and
//! every mutation rewrites the full file under an update lock; readers
//! never block on writers.

use crate::files::Segments;
use crate::pkgs::PkgId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::debug;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExclusionError {
    #[error("failed to read exclusion store {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write exclusion store {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse exclusion store: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported exclusion store version {0}")]
    VersionMismatch(u32),
}

/// Which tools an exclusion applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExclusionTag {
    General,
    AppCleaner,
    CorpseFinder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionKind {
    Path { segments: Segments },
    Package { pkg_id: PkgId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub id: String,
    #[serde(default)]
    pub tags: BTreeSet<ExclusionTag>,
    #[serde(flatten)]
    pub kind: ExclusionKind,
}

impl Exclusion {
    pub fn path(id: impl Into<String>, segments: Segments) -> Self {
        Self {
            id: id.into(),
            tags: BTreeSet::new(),
            kind: ExclusionKind::Path { segments },
        }
    }

    pub fn package(id: impl Into<String>, pkg_id: PkgId) -> Self {
        Self {
            id: id.into(),
            tags: BTreeSet::new(),
            kind: ExclusionKind::Package { pkg_id },
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = ExclusionTag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Untagged exclusions and `General` ones apply everywhere.
    pub fn applies_to(&self, tag: ExclusionTag) -> bool {
        self.tags.is_empty()
            || self.tags.contains(&ExclusionTag::General)
            || self.tags.contains(&tag)
    }

    pub fn matches_pkg(&self, pkg: &PkgId) -> bool {
        matches!(&self.kind, ExclusionKind::Package { pkg_id } if pkg_id == pkg)
    }

    /// Exact path match.
    pub fn matches_path(&self, candidate: &Segments, ignore_case: bool) -> bool {
        matches!(&self.kind, ExclusionKind::Path { segments } if candidate.matches(segments, ignore_case))
    }

    /// Exact match or any descendant of the excluded path.
    pub fn covers_path(&self, candidate: &Segments, ignore_case: bool) -> bool {
        matches!(&self.kind, ExclusionKind::Path { segments } if candidate.starts_with(segments, ignore_case))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ExclusionStore {
    version: u32,
    exclusions: Vec<Exclusion>,
}

/// Owner of the exclusion collection. All mutation funnels through the
/// update lock; `current_exclusions` only touches the cache.
pub struct ExclusionManager {
    store_path: PathBuf,
    cache: RwLock<Arc<Vec<Exclusion>>>,
    update_lock: Mutex<()>,
}

impl ExclusionManager {
    /// A missing store file is an empty collection, not an error.
    pub fn load(store_path: impl Into<PathBuf>) -> Result<Self, ExclusionError> {
        let store_path = store_path.into();
        let exclusions = match std::fs::read_to_string(&store_path) {
            Ok(contents) => {
                let store: ExclusionStore = serde_json::from_str(&contents)?;
                if store.version != STORE_VERSION {
                    return Err(ExclusionError::VersionMismatch(store.version));
                }
                store.exclusions
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(ExclusionError::Read {
                    path: store_path,
                    source,
                })
            }
        };
        debug!("Loaded {} exclusions from {}", exclusions.len(), store_path.display());
        Ok(Self {
            store_path,
            cache: RwLock::new(Arc::new(exclusions)),
            update_lock: Mutex::new(()),
        })
    }

    pub fn current_exclusions(&self) -> Arc<Vec<Exclusion>> {
        match self.cache.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Insert or replace by id, then flush the whole collection.
    pub fn add(&self, exclusion: Exclusion) -> Result<(), ExclusionError> {
        self.update(|list| {
            list.retain(|existing| existing.id != exclusion.id);
            list.push(exclusion);
        })
    }

    pub fn remove(&self, id: &str) -> Result<(), ExclusionError> {
        self.update(|list| list.retain(|existing| existing.id != id))
    }

    fn update(&self, mutate: impl FnOnce(&mut Vec<Exclusion>)) -> Result<(), ExclusionError> {
        let _guard = match self.update_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut list = self.current_exclusions().as_ref().clone();
        mutate(&mut list);
        self.save(&list)?;
        let mut cache = match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cache = Arc::new(list);
        Ok(())
    }

    fn save(&self, exclusions: &[Exclusion]) -> Result<(), ExclusionError> {
        let store = ExclusionStore {
            version: STORE_VERSION,
            exclusions: exclusions.to_vec(),
        };
        let contents = serde_json::to_string_pretty(&store)?;
        if let Some(parent) = self.store_path.parent() {
            create_parent(parent, &self.store_path)?;
        }
        std::fs::write(&self.store_path, contents).map_err(|source| ExclusionError::Write {
            path: self.store_path.clone(),
            source,
        })
    }
}

fn create_parent(parent: &Path, store_path: &Path) -> Result<(), ExclusionError> {
    std::fs::create_dir_all(parent).map_err(|source| ExclusionError::Write {
        path: store_path.to_path_buf(),
        source,
    })
}
