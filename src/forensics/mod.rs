//! Forensic ownership resolution ("CSI").
//!
//! Given an arbitrary path discovered during a scan, the resolver locates
//! the data area with jurisdiction over it and attributes the path to zero
//! or more owning packages. "No owner found" is a normal result, not an
//! error; such paths are treated as unattributed and never auto-deleted.

pub mod csi;

pub use csi::FileForensics;

use crate::areas::{AreaType, DataArea};
use crate::files::{Segments, VirtualPath};
use crate::pkgs::PkgId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A path placed within the data area that has jurisdiction over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaInfo {
    pub file: VirtualPath,
    /// The owning area's root; always a true ancestor of `file`.
    pub prefix: VirtualPath,
    pub data_area: DataArea,
    /// Whether unattributed content here is a deletion candidate ("corpse").
    pub is_blacklist_location: bool,
    prefix_free: Segments,
}

impl AreaInfo {
    /// Returns `None` if the area root is not a true ancestor of `file`.
    pub fn new(file: VirtualPath, data_area: DataArea, is_blacklist_location: bool) -> Option<Self> {
        let prefix = data_area.path.clone();
        let prefix_free = file.remove_prefix(&prefix)?;
        Some(Self {
            file,
            prefix,
            data_area,
            is_blacklist_location,
            prefix_free,
        })
    }

    pub fn area_type(&self) -> AreaType {
        self.data_area.area_type
    }

    /// Segments of `file` relative to the area root.
    pub fn prefix_free_path(&self) -> &Segments {
        &self.prefix_free
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OwnerFlag {
    /// Responsible for, but not the creator of, the file.
    Custodian,
}

/// A package attributed as owner of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Owner {
    pub pkg_id: PkgId,
    pub flags: BTreeSet<OwnerFlag>,
}

impl Owner {
    pub fn new(pkg_id: PkgId) -> Self {
        Self {
            pkg_id,
            flags: BTreeSet::new(),
        }
    }

    pub fn custodian(pkg_id: PkgId) -> Self {
        Self {
            pkg_id,
            flags: [OwnerFlag::Custodian].into_iter().collect(),
        }
    }

    pub fn is_custodian(&self) -> bool {
        self.flags.contains(&OwnerFlag::Custodian)
    }
}

/// Outcome of one processor's owner search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsiResult {
    pub owners: BTreeSet<Owner>,
    /// True when the path is known to belong to the OS/an uninstalled party
    /// even though no concrete owner could be named.
    pub has_known_unknown_owner: bool,
}

impl CsiResult {
    pub fn of(owners: impl IntoIterator<Item = Owner>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
            has_known_unknown_owner: false,
        }
    }
}

/// Full resolution result for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerInfo {
    pub area_info: AreaInfo,
    pub owners: BTreeSet<Owner>,
    pub has_known_unknown_owner: bool,
}

impl OwnerInfo {
    pub fn is_owned_by(&self, pkg_id: &PkgId) -> bool {
        self.owners.iter().any(|o| &o.pkg_id == pkg_id)
    }

    /// Unattributed paths have no owners and no known-unknown marker.
    pub fn is_unattributed(&self) -> bool {
        self.owners.is_empty() && !self.has_known_unknown_owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::UserHandle;

    fn area(root: &str) -> DataArea {
        DataArea::new(AreaType::Data, VirtualPath::local(root), UserHandle::SYSTEM)
    }

    #[test]
    fn test_area_info_prefix_free() {
        let info = AreaInfo::new(
            VirtualPath::local("/data/pkg/cache/tmp"),
            area("/data"),
            true,
        )
        .unwrap();
        assert_eq!(*info.prefix_free_path(), Segments::from(["pkg", "cache", "tmp"]));
        assert_eq!(info.area_type(), AreaType::Data);
    }

    #[test]
    fn test_area_info_rejects_non_ancestor() {
        assert!(AreaInfo::new(VirtualPath::local("/cache/x"), area("/data"), true).is_none());
        // the root itself is not its own ancestor
        assert!(AreaInfo::new(VirtualPath::local("/data"), area("/data"), true).is_none());
    }

    #[test]
    fn test_owner_flags() {
        let plain = Owner::new(PkgId::from("a"));
        let custodian = Owner::custodian(PkgId::from("a"));
        assert!(!plain.is_custodian());
        assert!(custodian.is_custodian());
        assert_ne!(plain, custodian);
    }
}
