//! Installed-package abstraction.
//!
//! Ownership resolution only ever asks three questions: is this id
//! installed, what packages exist (with their APK source dirs), and what
//! package id does this archive carry. `PkgRepo` is that capability; the
//! shipped `StaticPkgRepo` answers from an in-memory snapshot (tests, and
//! the offline CLI which loads one from JSON).

use crate::files::VirtualPath;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Android package id, e.g. `com.example.app`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PkgId(String);

impl PkgId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PkgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PkgId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// One installed package as reported by the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPkg {
    pub id: PkgId,
    /// Recorded APK location, absent for system stubs.
    #[serde(default)]
    pub source_dir: Option<VirtualPath>,
}

/// Identity extracted from an APK archive's manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkInfo {
    pub id: PkgId,
}

/// Package manager capability used by the resolver chain.
pub trait PkgRepo: Send + Sync {
    fn is_installed(&self, pkg_id: &PkgId) -> bool;

    fn current_pkgs(&self) -> Vec<InstalledPkg>;

    /// Introspect an APK on disk for its manifest package id.
    fn view_archive(&self, path: &VirtualPath) -> Option<ApkInfo>;
}

#[derive(Error, Debug)]
pub enum PkgSnapshotError {
    #[error("Failed to read package snapshot: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse package snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serialized form of a package snapshot file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PkgSnapshot {
    packages: Vec<InstalledPkg>,
    /// Archive path -> manifest package id, stands in for real APK parsing.
    archives: HashMap<String, PkgId>,
}

/// In-memory `PkgRepo` over a fixed package set.
#[derive(Debug, Default)]
pub struct StaticPkgRepo {
    packages: HashMap<PkgId, InstalledPkg>,
    archives: HashMap<String, PkgId>,
}

impl StaticPkgRepo {
    pub fn new(packages: impl IntoIterator<Item = InstalledPkg>) -> Self {
        Self {
            packages: packages.into_iter().map(|p| (p.id.clone(), p)).collect(),
            archives: HashMap::new(),
        }
    }

    /// Load from a JSON snapshot file.
    pub fn from_snapshot(path: &Path) -> Result<Self, PkgSnapshotError> {
        let contents = std::fs::read_to_string(path)?;
        let snapshot: PkgSnapshot = serde_json::from_str(&contents)?;
        let mut repo = Self::new(snapshot.packages);
        repo.archives = snapshot.archives;
        Ok(repo)
    }

    pub fn add_pkg(&mut self, pkg: InstalledPkg) {
        self.packages.insert(pkg.id.clone(), pkg);
    }

    pub fn add_archive(&mut self, path: VirtualPath, id: PkgId) {
        self.archives.insert(path.raw(), id);
    }
}

impl PkgRepo for StaticPkgRepo {
    fn is_installed(&self, pkg_id: &PkgId) -> bool {
        self.packages.contains_key(pkg_id)
    }

    fn current_pkgs(&self) -> Vec<InstalledPkg> {
        self.packages.values().cloned().collect()
    }

    fn view_archive(&self, path: &VirtualPath) -> Option<ApkInfo> {
        self.archives
            .get(&path.raw())
            .map(|id| ApkInfo { id: id.clone() })
    }
}
