//! End-to-end scan tests over snapshot directories.

use junkhound::areas::modules::{AreaModule, DiscoveryContext, StorageEnvironment};
use junkhound::areas::UserHandle;
use junkhound::config::{FilterConfig, ScanSettings};
use junkhound::exclusion::{Exclusion, ExclusionManager};
use junkhound::pkgs::InstalledPkg;
use junkhound::scanner::ScanError;
use junkhound::{
    AppScanner, AreaType, CancelFlag, ClutterRepo, DataArea, DataAreaManager, FileForensics,
    LocalGateway, PkgId, Segments, StaticPkgRepo, VirtualPath,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, size: usize) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; size]).unwrap();
}

fn settings() -> ScanSettings {
    ScanSettings {
        min_cache_size_bytes: 0,
        is_rooted: true,
        filter: FilterConfig::default(),
        ..ScanSettings::default()
    }
}

fn scanner_for(dir: &TempDir, installed: &[&str], settings: ScanSettings) -> AppScanner {
    let gateway = Arc::new(LocalGateway::rooted_at(dir.path().to_path_buf(), true));
    let areas = Arc::new(DataAreaManager::with_default_modules(
        gateway.clone(),
        StorageEnvironment::default(),
    ));
    areas.reload();
    let pkg_repo = Arc::new(StaticPkgRepo::new(installed.iter().map(|id| InstalledPkg {
        id: PkgId::from(*id),
        source_dir: None,
    })));
    let clutter_repo = Arc::new(ClutterRepo::bundled().unwrap());
    let forensics = Arc::new(FileForensics::with_default_processors(
        areas.clone(),
        pkg_repo,
        clutter_repo,
        gateway.clone(),
    ));
    let exclusions =
        Arc::new(ExclusionManager::load(dir.path().join("exclusions.json")).unwrap());
    AppScanner::new(gateway, areas, forensics, exclusions, settings).unwrap()
}

#[test]
fn test_scan_merges_areas_per_package() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/com.example.app/cache/blob.bin", 2048);
    write_file(
        dir.path(),
        "storage/emulated/0/Android/data/com.example.app/cache/tmp.jpg",
        1024,
    );
    write_file(dir.path(), "data/com.other.app/cache/junk", 512);
    write_file(dir.path(), "data/com.other.app/files/keep.db", 512);

    let scanner = scanner_for(&dir, &["com.example.app", "com.other.app"], settings());
    let junks = scanner.scan(&CancelFlag::new()).unwrap();

    assert_eq!(junks.len(), 2);

    let example = junks
        .iter()
        .find(|j| j.pkg == PkgId::from("com.example.app"))
        .unwrap();
    // Cache content from both the private and public area, merged.
    assert_eq!(example.size(), 3072);

    let other = junks
        .iter()
        .find(|j| j.pkg == PkgId::from("com.other.app"))
        .unwrap();
    assert_eq!(other.size(), 512);
    let items: Vec<_> = other.expendables.values().flatten().collect();
    assert!(items
        .iter()
        .all(|item| !item.lookup.path.raw().contains("keep.db")));
}

struct FixedAreas(Vec<DataArea>);

impl AreaModule for FixedAreas {
    fn name(&self) -> &'static str {
        "Fixed"
    }
    fn first_pass(&self, _ctx: &DiscoveryContext<'_>) -> Vec<DataArea> {
        self.0.clone()
    }
}

#[test]
fn test_scan_merges_two_private_data_areas() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/com.example.app/cache/tmpfile", 2048);
    write_file(dir.path(), "data/user/10/com.example.app/cache/tmpfile", 1024);

    // Primary user plus a work profile, both of type DATA.
    let gateway = Arc::new(LocalGateway::rooted_at(dir.path().to_path_buf(), true));
    let areas = Arc::new(DataAreaManager::new(
        gateway.clone(),
        StorageEnvironment::default(),
        vec![Box::new(FixedAreas(vec![
            DataArea::new(
                AreaType::Data,
                VirtualPath::local("/data"),
                UserHandle::SYSTEM,
            ),
            DataArea::new(
                AreaType::Data,
                VirtualPath::local("/data/user/10"),
                UserHandle(10),
            ),
        ]))],
    ));
    areas.reload();
    let pkg_repo = Arc::new(StaticPkgRepo::new([InstalledPkg {
        id: PkgId::from("com.example.app"),
        source_dir: None,
    }]));
    let forensics = Arc::new(FileForensics::with_default_processors(
        areas.clone(),
        pkg_repo,
        Arc::new(ClutterRepo::bundled().unwrap()),
        gateway.clone(),
    ));
    let exclusions =
        Arc::new(ExclusionManager::load(dir.path().join("exclusions.json")).unwrap());
    let scanner = AppScanner::new(gateway, areas, forensics, exclusions, settings()).unwrap();

    let junks = scanner.scan(&CancelFlag::new()).unwrap();

    // Each area resolves independently; the results merge into one entry.
    assert_eq!(junks.len(), 1);
    assert_eq!(junks[0].pkg, PkgId::from("com.example.app"));
    assert_eq!(junks[0].size(), 3072);
}

#[test]
fn test_unattributed_dirs_are_skipped() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/com.gone.app/cache/blob", 4096);

    let scanner = scanner_for(&dir, &[], settings());
    let junks = scanner.scan(&CancelFlag::new()).unwrap();
    assert!(junks.is_empty());
}

#[test]
fn test_nested_exclusion() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/com.example.app/cache/keep/precious.bin", 100);
    write_file(dir.path(), "data/com.example.app/cache/junk.bin", 100);

    let store = dir.path().join("exclusions.json");
    let manager = ExclusionManager::load(&store).unwrap();
    manager
        .add(Exclusion::path(
            "precious",
            Segments::from(["com.example.app", "cache", "keep"]),
        ))
        .unwrap();

    let scanner = scanner_for(&dir, &["com.example.app"], settings());
    let junks = scanner.scan(&CancelFlag::new()).unwrap();

    assert_eq!(junks.len(), 1);
    let items: Vec<_> = junks[0].expendables.values().flatten().collect();
    assert_eq!(items.len(), 1);
    assert!(items[0].lookup.path.raw().ends_with("junk.bin"));
}

#[test]
fn test_recycle_bin_content_is_found() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "storage/emulated/0/Android/data/com.example.app/files/trashbin/old.jpg",
        9000,
    );

    let scanner = scanner_for(&dir, &["com.example.app"], settings());
    let junks = scanner.scan(&CancelFlag::new()).unwrap();

    assert_eq!(junks.len(), 1);
    assert!(junks[0].expendables.contains_key("RecycleBinsFilter"));
}

#[test]
fn test_min_size_threshold_drops_small_results() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/com.example.app/cache/tiny", 10);

    let strict = ScanSettings {
        min_cache_size_bytes: 1000,
        ..settings()
    };
    let scanner = scanner_for(&dir, &["com.example.app"], strict);
    assert!(scanner.scan(&CancelFlag::new()).unwrap().is_empty());
}

#[test]
fn test_pre_cancelled_scan_stops() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data/com.example.app/cache/blob", 100);

    let scanner = scanner_for(&dir, &["com.example.app"], settings());
    let cancel = CancelFlag::new();
    cancel.cancel();
    assert!(matches!(scanner.scan(&cancel), Err(ScanError::Cancelled)));
}
