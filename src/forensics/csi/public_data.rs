// Public app data: <sdcard>/Android/{data,media,obb}.

use super::checks::{clean_hidden_name, ClutterCheck};
use super::{check_jurisdiction, identify_in_areas, CsiProcessor};
use crate::areas::{AreaType, DataAreaManager};
use crate::clutter::ClutterRepo;
use crate::files::{Segments, VirtualPath};
use crate::forensics::{AreaInfo, CsiResult, Owner};
use crate::pkgs::{PkgId, PkgRepo};
use std::sync::Arc;

const JURISDICTION: &[AreaType] = &[
    AreaType::PublicData,
    AreaType::PublicMedia,
    AreaType::PublicObb,
];

/// Resolver for public app data.
///
/// Directory names here conventionally equal package ids and a false
/// negative is costly, so the chain short-circuits on a direct dirname hit
/// and finally falls back to assuming dirname == pkg id.
pub struct PublicDataCsi {
    areas: Arc<DataAreaManager>,
    pkg_repo: Arc<dyn PkgRepo>,
    clutter_check: ClutterCheck,
}

impl PublicDataCsi {
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

impl CsiProcessor for PublicDataCsi {
    fn name(&self) -> &'static str {
        "PublicDataCsi"
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

        let mut hidden: Option<PkgId> = None;
        if let Some(cleaned) = clean_hidden_name(dir_name) {
            let candidate = PkgId::from(cleaned);
            if self.pkg_repo.is_installed(&candidate) {
                return CsiResult::of([Owner::new(candidate)]);
            }
            hidden = Some(candidate);
        }

        // Markers here target the top-level dir name; nested files inherit
        // its attribution.
        let clutter = self
            .clutter_check
            .process_segments(area_info.area_type(), &Segments::from([dir_name]));
        if !clutter.is_empty() {
            return CsiResult::of(clutter);
        }

        // No other owner: assuming dirname == pkg id has no downside here.
        CsiResult::of([Owner::new(hidden.unwrap_or(direct))])
    }
}
