// User-visible sdcard storage outside Android/{data,media,obb}.

use super::checks::ClutterCheck;
use super::{check_jurisdiction, identify_in_areas, CsiProcessor};
use crate::areas::{AreaType, DataAreaManager};
use crate::clutter::ClutterRepo;
use crate::files::VirtualPath;
use crate::forensics::{AreaInfo, CsiResult};
use std::sync::Arc;

const JURISDICTION: &[AreaType] = &[AreaType::Sdcard];

/// Resolver for loose sdcard content.
///
/// Anything can live here, so ownership comes from marker knowledge only
/// and unmatched paths stay unattributed. This is not a blacklist
/// location: name similarity to a package id proves nothing.
pub struct SdcardCsi {
    areas: Arc<DataAreaManager>,
    clutter_check: ClutterCheck,
}

impl SdcardCsi {
    pub fn new(areas: Arc<DataAreaManager>, clutter_repo: Arc<ClutterRepo>) -> Self {
        Self {
            areas,
            clutter_check: ClutterCheck::new(clutter_repo),
        }
    }
}

impl CsiProcessor for SdcardCsi {
    fn name(&self) -> &'static str {
        "SdcardCsi"
    }

    fn has_jurisdiction(&self, area_type: AreaType) -> bool {
        JURISDICTION.contains(&area_type)
    }

    fn identify_area(&self, target: &VirtualPath) -> Option<AreaInfo> {
        identify_in_areas(&self.areas.current_areas(), JURISDICTION, target, false)
    }

    fn find_owners(&self, area_info: &AreaInfo) -> CsiResult {
        if !check_jurisdiction(self, area_info) {
            return CsiResult::default();
        }
        CsiResult::of(self.clutter_check.process(area_info))
    }
}
