//! Default cache directories every app owns.

use super::sieves::{DynamicSieve, MatchConfig};
use super::{ExpendablesFilter, SieveError};
use crate::areas::AreaType;
use crate::files::{PathLookup, Segments};
use crate::pkgs::PkgId;

/// Accepts content inside `{pkg}/cache` and `{pkg}/code_cache` in private
/// data areas, and `{pkg}/cache` in public app data. The cache dir itself
/// is kept; only its contents are expendable.
#[derive(Debug)]
pub struct DefaultCachesFilter {
    sieve: DynamicSieve,
}

impl DefaultCachesFilter {
    pub fn new() -> Result<Self, SieveError> {
        let private = MatchConfig {
            area_types: Some([AreaType::Data, AreaType::DataSdExt2].into()),
            patterns: Some(vec![
                r"[^/]+/cache/.+".to_string(),
                r"[^/]+/code_cache/.+".to_string(),
            ]),
            ..MatchConfig::default()
        };
        let public = MatchConfig {
            area_types: Some([AreaType::PublicData].into()),
            patterns: Some(vec![r"[^/]+/cache/.+".to_string()]),
            ..MatchConfig::default()
        };
        Ok(Self {
            sieve: DynamicSieve::new(vec![private, public])?,
        })
    }
}

impl ExpendablesFilter for DefaultCachesFilter {
    fn name(&self) -> &'static str {
        "DefaultCachesFilter"
    }

    fn initialize(&self) -> Result<(), SieveError> {
        Ok(())
    }

    fn is_expendable(
        &self,
        pkg: &PkgId,
        _lookup: &PathLookup,
        area_type: AreaType,
        segments: &Segments,
    ) -> bool {
        // Only the scanned package's own directory counts.
        let owned = segments
            .first()
            .is_some_and(|first| crate::files::seg_eq(first, pkg.name(), area_type.is_case_insensitive()));
        owned && self.sieve.matches(pkg, area_type, segments)
    }
}
