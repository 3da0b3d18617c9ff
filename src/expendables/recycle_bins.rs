//! Structural detection of per-app trash and recycle-bin hierarchies.

use super::sieves::JsonSieve;
use super::{ExpendablesFilter, SieveError};
use crate::areas::AreaType;
use crate::files::{PathLookup, Segments};
use crate::pkgs::PkgId;

const TRASH_FOLDERS: &[&str] = &[
    ".trash",
    "trash",
    ".trashfiles",
    "trashfiles",
    ".trashbin",
    "trashbin",
    ".recycle",
    "recycle",
    ".recyclebin",
    "recyclebin",
    ".garbage",
];

// Standalone trash file names directly under the pkg dir. None known at
// the moment; vendor-specific ones belong in db_trash_files.json instead.
const TRASH_FILES: &[&str] = &[];

/// Accepts well-known trash layouts by shape, then defers anything else
/// to the bundled per-vendor table.
#[derive(Debug, Default)]
pub struct RecycleBinsFilter {
    sieve: JsonSieve,
}

impl RecycleBinsFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExpendablesFilter for RecycleBinsFilter {
    fn name(&self) -> &'static str {
        "RecycleBinsFilter"
    }

    fn initialize(&self) -> Result<(), SieveError> {
        self.sieve.initialize()
    }

    fn is_expendable(
        &self,
        pkg: &PkgId,
        _lookup: &PathLookup,
        area_type: AreaType,
        segments: &Segments,
    ) -> bool {
        let lowered = segments.lowercase();
        let len = lowered.len();

        let second = lowered.get(1).unwrap_or_default();
        let third = lowered.get(2).unwrap_or_default();

        if len == 2 && TRASH_FILES.contains(&second) {
            return true;
        }
        if len == 3 && second == "files" && TRASH_FILES.contains(&third) {
            return true;
        }
        if len >= 3 && TRASH_FOLDERS.contains(&second) {
            return true;
        }
        if len >= 4 && second == "files" && (TRASH_FOLDERS.contains(&third) || third == "cache") {
            return true;
        }

        self.sieve.matches(pkg, area_type, segments)
    }
}
