// Private app data under DATA roots (and the sdext2 extension).

use super::checks::{clean_hidden_name, ClutterCheck};
use super::{check_jurisdiction, identify_in_areas, CsiProcessor};
use crate::areas::{AreaType, DataAreaManager};
use crate::clutter::ClutterRepo;
use crate::files::VirtualPath;
use crate::forensics::{AreaInfo, CsiResult, Owner};
use crate::pkgs::{PkgId, PkgRepo};
use std::sync::Arc;

const JURISDICTION: &[AreaType] = &[AreaType::Data, AreaType::DataSdExt2];

/// Resolver for private app data.
///
/// Unlike public data there is no dirname fallback: a miss here stays
/// unattributed so nothing below `/data` gets deleted on a guess.
pub struct PrivateDataCsi {
    areas: Arc<DataAreaManager>,
    pkg_repo: Arc<dyn PkgRepo>,
    clutter_check: ClutterCheck,
}

impl PrivateDataCsi {
    pub fn new(
        areas: Arc<DataAreaManager>,
        pkg_repo: Arc<dyn PkgRepo>,
        clutter_repo: Arc<ClutterRepo>,
    ) -> Self {
        Self {
            areas,
            pkg_repo,
            clutter_check: ClutterCheck::new(clutter_repo),
        }
    }
}

impl CsiProcessor for PrivateDataCsi {
    fn name(&self) -> &'static str {
        "PrivateDataCsi"
    }

    fn has_jurisdiction(&self, area_type: AreaType) -> bool {
        JURISDICTION.contains(&area_type)
    }

    fn identify_area(&self, target: &VirtualPath) -> Option<AreaInfo> {
        identify_in_areas(&self.areas.current_areas(), JURISDICTION, target, true)
    }

    fn find_owners(&self, area_info: &AreaInfo) -> CsiResult {
        if !check_jurisdiction(self, area_info) {
            return CsiResult::default();
        }

        let Some(dir_name) = area_info.prefix_free_path().first() else {
            return CsiResult::default();
        };

        let direct = PkgId::from(dir_name);
        if self.pkg_repo.is_installed(&direct) {
            return CsiResult::of([Owner::new(direct)]);
        }

        if let Some(cleaned) = clean_hidden_name(dir_name) {
            let candidate = PkgId::from(cleaned);
            if self.pkg_repo.is_installed(&candidate) {
                return CsiResult::of([Owner::new(candidate)]);
            }
        }

        CsiResult::of(self.clutter_check.process(area_info))
    }
}
