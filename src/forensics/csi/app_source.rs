// App source dirs: /data/app-private and friends.

use super::checks::{
    ApkCheck, ClutterCheck, DirToPkgCheck, FileToPkgCheck, LuckyPatcherCheck, SimilarityFilter,
    SubDirToPkgCheck,
};
use super::{check_jurisdiction, identify_in_areas, CsiProcessor};
use crate::areas::{AreaType, DataAreaManager};
use crate::clutter::ClutterRepo;
use crate::files::{FileGateway, VirtualPath};
use crate::forensics::{AreaInfo, CsiResult, Owner};
use crate::pkgs::PkgRepo;
use std::sync::Arc;

const JURISDICTION: &[AreaType] = &[AreaType::AppAppPrivate];

/// Resolver for private APK install locations.
///
/// Runs the full source-check chain in declaration order, accumulating
/// owners, then lets the similarity filter collapse case-variant hits.
pub struct AppSourcePrivateCsi {
    areas: Arc<DataAreaManager>,
    file_to_pkg: FileToPkgCheck,
    lucky_patcher: LuckyPatcherCheck,
    dir_to_pkg: DirToPkgCheck,
    sub_dir: SubDirToPkgCheck,
    apk_check: ApkCheck,
    clutter_check: ClutterCheck,
    similarity: SimilarityFilter,
}

impl AppSourcePrivateCsi {
    pub fn new(
        areas: Arc<DataAreaManager>,
        pkg_repo: Arc<dyn PkgRepo>,
        clutter_repo: Arc<ClutterRepo>,
        gateway: Arc<dyn FileGateway>,
    ) -> Self {
        Self {
            areas,
            file_to_pkg: FileToPkgCheck::new(pkg_repo.clone()),
            lucky_patcher: LuckyPatcherCheck::new(pkg_repo.clone()),
            dir_to_pkg: DirToPkgCheck::new(pkg_repo.clone()),
            sub_dir: SubDirToPkgCheck::new(gateway, pkg_repo.clone()),
            apk_check: ApkCheck::new(pkg_repo.clone()),
            clutter_check: ClutterCheck::new(clutter_repo),
            similarity: SimilarityFilter::new(pkg_repo),
        }
    }
}

impl CsiProcessor for AppSourcePrivateCsi {
    fn name(&self) -> &'static str {
        "AppSourcePrivateCsi"
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

        let mut owners: Vec<Owner> = Vec::new();
        owners.extend(self.file_to_pkg.process(area_info));
        owners.extend(self.lucky_patcher.process(area_info));
        owners.extend(self.dir_to_pkg.process(area_info));
        owners.extend(self.sub_dir.process(area_info));
        owners.extend(self.apk_check.check(std::slice::from_ref(&area_info.file)));
        owners.extend(self.clutter_check.process(area_info));

        CsiResult::of(self.similarity.filter(owners))
    }
}
