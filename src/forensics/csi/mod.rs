//! CSI processors: one per data-area-type family.
//!
//! Each processor claims jurisdiction over a fixed set of area types,
//! places a path inside the most specific matching area, and runs an
//! ordered chain of ownership checks whose results accumulate unless the
//! processor's policy explicitly short-circuits.

pub mod checks;

mod app_source;
mod dalvik;
mod private_data;
mod public_data;
mod sdcard;

pub use app_source::AppSourcePrivateCsi;
pub use dalvik::DalvikCsi;
pub use private_data::PrivateDataCsi;
pub use public_data::PublicDataCsi;
pub use sdcard::SdcardCsi;

use super::{AreaInfo, CsiResult, OwnerInfo};
use crate::areas::{AreaSnapshot, AreaType};
use crate::clutter::ClutterRepo;
use crate::files::{FileGateway, VirtualPath};
use crate::pkgs::PkgRepo;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub trait CsiProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn has_jurisdiction(&self, area_type: AreaType) -> bool;

    /// Place the path within one of this processor's areas, or `None` if
    /// no area of ours is an ancestor of it.
    fn identify_area(&self, target: &VirtualPath) -> Option<AreaInfo>;

    /// Attribute the path to owners. Calling this with an `AreaInfo` whose
    /// type is outside our jurisdiction is a contract violation.
    fn find_owners(&self, area_info: &AreaInfo) -> CsiResult;
}

/// Longest-prefix area selection shared by all processors.
///
/// Among the snapshot's areas of the given types, the one with the most
/// path segments that is still an ancestor of `target` wins. A genuine tie
/// between distinct areas is a configuration problem; it is logged loudly
/// and broken by path order so resolution stays deterministic.
pub(crate) fn identify_in_areas(
    snapshot: &AreaSnapshot,
    types: &[AreaType],
    target: &VirtualPath,
    is_blacklist_location: bool,
) -> Option<AreaInfo> {
    let mut candidates: Vec<_> = snapshot
        .areas
        .iter()
        .filter(|area| types.contains(&area.area_type))
        .filter(|area| area.path.is_ancestor_of(target))
        .collect();

    candidates.sort_by(|a, b| {
        b.path
            .segments()
            .len()
            .cmp(&a.path.segments().len())
            .then_with(|| a.path.raw().cmp(&b.path.raw()))
    });

    if candidates.len() > 1
        && candidates[0].path.segments().len() == candidates[1].path.segments().len()
    {
        error!(
            "Ambiguous area ancestors for {}: {} vs {}, picking the first",
            target, candidates[0], candidates[1]
        );
    }

    let area = candidates.first()?;
    AreaInfo::new(target.clone(), (*area).clone(), is_blacklist_location)
}

/// Guard for the jurisdiction contract on `find_owners`.
pub(crate) fn check_jurisdiction(processor: &dyn CsiProcessor, area_info: &AreaInfo) -> bool {
    let ok = processor.has_jurisdiction(area_info.area_type());
    debug_assert!(
        ok,
        "{} called for wrong jurisdiction: {}",
        processor.name(),
        area_info.area_type()
    );
    if !ok {
        warn!(
            "{} invoked outside its jurisdiction ({}), returning empty",
            processor.name(),
            area_info.area_type()
        );
    }
    ok
}

/// Facade over the registered processor set.
pub struct FileForensics {
    processors: Vec<Box<dyn CsiProcessor>>,
}

impl FileForensics {
    pub fn new(processors: Vec<Box<dyn CsiProcessor>>) -> Self {
        Self { processors }
    }

    /// The default processor registry, assembled once at startup.
    pub fn with_default_processors(
        areas: Arc<crate::areas::DataAreaManager>,
        pkg_repo: Arc<dyn PkgRepo>,
        clutter_repo: Arc<ClutterRepo>,
        gateway: Arc<dyn FileGateway>,
    ) -> Self {
        Self::new(vec![
            Box::new(PublicDataCsi::new(
                areas.clone(),
                pkg_repo.clone(),
                clutter_repo.clone(),
            )),
            Box::new(PrivateDataCsi::new(
                areas.clone(),
                pkg_repo.clone(),
                clutter_repo.clone(),
            )),
            Box::new(AppSourcePrivateCsi::new(
                areas.clone(),
                pkg_repo.clone(),
                clutter_repo.clone(),
                gateway.clone(),
            )),
            Box::new(DalvikCsi::new(
                areas.clone(),
                pkg_repo,
                clutter_repo.clone(),
                gateway,
            )),
            Box::new(SdcardCsi::new(areas, clutter_repo)),
        ])
    }

    /// Resolve a path to its area and owners.
    ///
    /// Returns `None` when no registered processor has an area containing
    /// the path; an empty owner set inside `Some` means "unattributed".
    pub fn find_owners(&self, target: &VirtualPath) -> Option<OwnerInfo> {
        let (processor, area_info) = self.locate(target)?;
        debug!(
            "{} has jurisdiction over {} ({})",
            processor.name(),
            target,
            area_info.area_type()
        );
        let result = processor.find_owners(&area_info);
        Some(OwnerInfo {
            area_info,
            owners: result.owners,
            has_known_unknown_owner: result.has_known_unknown_owner,
        })
    }

    /// Place a path without running ownership checks.
    pub fn identify_area(&self, target: &VirtualPath) -> Option<AreaInfo> {
        self.locate(target).map(|(_, area_info)| area_info)
    }

    /// Pick the processor whose claimed area root is the deepest ancestor
    /// of `target`. Nested areas like dalvik-cache live inside the DATA
    /// root, so first-registered-wins would hand their contents to the
    /// wrong chain. Registry order breaks exact depth ties.
    fn locate(&self, target: &VirtualPath) -> Option<(&dyn CsiProcessor, AreaInfo)> {
        let mut best: Option<(&dyn CsiProcessor, AreaInfo)> = None;
        for processor in &self.processors {
            let Some(area_info) = processor.identify_area(target) else {
                continue;
            };
            let depth = area_info.data_area.path.segments().len();
            let best_depth = best
                .as_ref()
                .map(|(_, info)| info.data_area.path.segments().len());
            if best_depth.map_or(true, |current| depth > current) {
                best = Some((processor.as_ref(), area_info));
            }
        }
        best
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::{AreaFlag, DataArea, UserHandle};
    use crate::forensics::Owner;
    use crate::pkgs::PkgId;

    fn snapshot(areas: Vec<DataArea>) -> AreaSnapshot {
        AreaSnapshot { areas, generation: 1 }
    }

    struct StubCsi {
        name: &'static str,
        area: DataArea,
        owner: &'static str,
    }

    impl CsiProcessor for StubCsi {
        fn name(&self) -> &'static str {
            self.name
        }
        fn has_jurisdiction(&self, area_type: AreaType) -> bool {
            area_type == self.area.area_type
        }
        fn identify_area(&self, target: &VirtualPath) -> Option<AreaInfo> {
            if !self.area.path.is_ancestor_of(target) {
                return None;
            }
            AreaInfo::new(target.clone(), self.area.clone(), true)
        }
        fn find_owners(&self, _area_info: &AreaInfo) -> CsiResult {
            CsiResult::of([Owner::new(PkgId::from(self.owner))])
        }
    }

    #[test]
    fn test_facade_routes_to_most_specific_area() {
        let outer = StubCsi {
            name: "Outer",
            area: DataArea::new(
                AreaType::Data,
                VirtualPath::local("/data"),
                UserHandle::SYSTEM,
            ),
            owner: "outer.pkg",
        };
        let inner = StubCsi {
            name: "Inner",
            area: DataArea::new(
                AreaType::DalvikCache,
                VirtualPath::local("/data/dalvik-cache/arm64"),
                UserHandle::SYSTEM,
            ),
            owner: "inner.pkg",
        };
        // Registration order must not matter: the outer area's processor
        // comes first but the nested area wins for paths inside it.
        let forensics = FileForensics::new(vec![Box::new(outer), Box::new(inner)]);

        let deep = forensics
            .find_owners(&VirtualPath::local(
                "/data/dalvik-cache/arm64/system@framework@framework.jar@classes.dex",
            ))
            .unwrap();
        assert_eq!(deep.area_info.area_type(), AreaType::DalvikCache);
        assert!(deep.is_owned_by(&PkgId::from("inner.pkg")));

        let shallow = forensics
            .find_owners(&VirtualPath::local("/data/com.example.app/cache"))
            .unwrap();
        assert_eq!(shallow.area_info.area_type(), AreaType::Data);
        assert!(shallow.is_owned_by(&PkgId::from("outer.pkg")));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let shallow = DataArea::new(
            AreaType::Sdcard,
            VirtualPath::local("/storage/emulated/0"),
            UserHandle::SYSTEM,
        );
        let deep = DataArea::new(
            AreaType::Sdcard,
            VirtualPath::local("/storage/emulated/0/nested"),
            UserHandle::SYSTEM,
        );
        let snap = snapshot(vec![shallow, deep.clone()]);

        let target = VirtualPath::local("/storage/emulated/0/nested/file");
        let info = identify_in_areas(&snap, &[AreaType::Sdcard], &target, false).unwrap();
        assert_eq!(info.data_area, deep);
        assert_eq!(info.prefix_free_path().join(), "file");
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        let a = DataArea::new(
            AreaType::Data,
            VirtualPath::local("/data"),
            UserHandle::SYSTEM,
        )
        .with_flags([AreaFlag::Primary]);
        let b = DataArea::new(AreaType::Data, VirtualPath::local("/data"), UserHandle(10));
        let snap = snapshot(vec![b.clone(), a.clone()]);

        let target = VirtualPath::local("/data/pkg/cache");
        let first = identify_in_areas(&snap, &[AreaType::Data], &target, true).unwrap();
        let second = identify_in_areas(&snap, &[AreaType::Data], &target, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_identify_is_idempotent() {
        let area = DataArea::new(
            AreaType::Data,
            VirtualPath::local("/data"),
            UserHandle::SYSTEM,
        );
        let snap = snapshot(vec![area]);
        let target = VirtualPath::local("/data/pkg/file");
        let one = identify_in_areas(&snap, &[AreaType::Data], &target, true);
        let two = identify_in_areas(&snap, &[AreaType::Data], &target, true);
        assert_eq!(one, two);
        assert!(one.is_some());
    }
}
