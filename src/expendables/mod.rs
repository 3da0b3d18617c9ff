//! Junk classification sieves.
//!
//! A scanned file is expendable when ANY enabled filter accepts it. Each
//! filter loads its reference data at most once via `initialize()` and is
//! pure afterwards, so the scanner can fan out over packages freely.

mod default_caches;
mod recycle_bins;
mod sieves;

pub use default_caches::DefaultCachesFilter;
pub use recycle_bins::RecycleBinsFilter;
pub use sieves::{DynamicSieve, JsonSieve, MatchConfig};

use crate::areas::AreaType;
use crate::files::{PathLookup, Segments};
use crate::pkgs::PkgId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SieveError {
    #[error("sieve config needs at least one of contains/ancestors/patterns")]
    Underdefined,

    #[error("sieve config set is empty")]
    Empty,

    #[error("invalid sieve pattern '{pattern}': {source}")]
    BadRegex {
        pattern: String,
        source: regex::Error,
    },

    #[error("failed to parse sieve table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported sieve table version {0}")]
    VersionMismatch(u32),
}

/// One junk classifier consulted per scanned file.
pub trait ExpendablesFilter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Load reference data. Idempotent; called before the first
    /// `is_expendable` and safe to call again.
    fn initialize(&self) -> Result<(), SieveError>;

    /// `segments` is the area-relative path, first segment being the
    /// owning package's directory.
    fn is_expendable(
        &self,
        pkg: &PkgId,
        lookup: &PathLookup,
        area_type: AreaType,
        segments: &Segments,
    ) -> bool;
}
