// Dalvik cache and profile artifacts.

use super::checks::{ApkCheck, ClutterCheck, DirToPkgCheck, LuckyPatcherCheck, SourceDirCheck};
use super::{check_jurisdiction, identify_in_areas, CsiProcessor};
use crate::areas::{AreaType, DataAreaManager};
use crate::clutter::ClutterRepo;
use crate::files::{FileGateway, VirtualPath};
use crate::forensics::{AreaInfo, CsiResult, Owner};
use crate::pkgs::PkgRepo;
use std::sync::Arc;
use tracing::trace;

const JURISDICTION: &[AreaType] = &[AreaType::DalvikCache, AreaType::DalvikProfile];

/// Decode a mangled dalvik-cache name back into source-path candidates.
///
/// `system@priv-app@Foo@Foo.apk@classes.vdex` was compiled from
/// `/system/priv-app/Foo/Foo.apk`; the trailing component names the
/// compiled artifact and is dropped.
fn expand_candidates(area_info: &AreaInfo) -> Vec<VirtualPath> {
    let name = area_info.file.name();
    let parts: Vec<&str> = name.split('@').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return Vec::new();
    }
    let source = format!("/{}", parts[..parts.len() - 1].join("/"));
    trace!("Dalvik candidate for {name}: {source}");
    vec![VirtualPath::local(&source)]
}

/// Resolver for compiled dex artifacts and ART profiles.
pub struct DalvikCsi {
    areas: Arc<DataAreaManager>,
    gateway: Arc<dyn FileGateway>,
    source_dir: SourceDirCheck,
    apk_check: ApkCheck,
    dir_to_pkg: DirToPkgCheck,
    lucky_patcher: LuckyPatcherCheck,
    clutter_check: ClutterCheck,
}

impl DalvikCsi {
    pub fn new(
        areas: Arc<DataAreaManager>,
        pkg_repo: Arc<dyn PkgRepo>,
        clutter_repo: Arc<ClutterRepo>,
        gateway: Arc<dyn FileGateway>,
    ) -> Self {
        Self {
            areas,
            gateway,
            source_dir: SourceDirCheck::new(pkg_repo.clone()),
            apk_check: ApkCheck::new(pkg_repo.clone()),
            dir_to_pkg: DirToPkgCheck::new(pkg_repo.clone()),
            lucky_patcher: LuckyPatcherCheck::new(pkg_repo),
            clutter_check: ClutterCheck::new(clutter_repo),
        }
    }
}

impl CsiProcessor for DalvikCsi {
    fn name(&self) -> &'static str {
        "DalvikCsi"
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

        let candidates = expand_candidates(area_info);

        let mut owners: Vec<Owner> = Vec::new();
        owners.extend(self.source_dir.check(&candidates));
        owners.extend(self.apk_check.check(&candidates));
        owners.extend(self.dir_to_pkg.process(area_info));
        owners.extend(self.lucky_patcher.process(area_info));
        owners.extend(self.clutter_check.process(area_info));

        // A decodable artifact whose source still exists belongs to the OS
        // or an uninstalled party we can't name.
        let has_known_unknown_owner =
            owners.is_empty() && candidates.iter().any(|c| self.gateway.exists(c));

        let mut result = CsiResult::of(owners);
        result.has_known_unknown_owner = has_known_unknown_owner;
        result
    }
}
