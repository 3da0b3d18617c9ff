//! Integration tests for the attribution pipeline.
//!
//! These tests replay a device snapshot mapped into a scratch directory
//! and run area discovery plus ownership resolution over it.

use junkhound::areas::modules::StorageEnvironment;
use junkhound::pkgs::InstalledPkg;
use junkhound::{
    AreaType, ClutterRepo, DataAreaManager, FileForensics, LocalGateway, PkgId, StaticPkgRepo,
    VirtualPath,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Lay out a snapshot with private data, public data and an sdcard.
fn build_snapshot(root: &Path) {
    for dir in [
        "data/com.example.app/cache",
        "data/dalvik-cache/arm64",
        "data/dalvik-cache/profiles",
        "data/app-private",
        "storage/emulated/0/Android/data/com.whatsapp/cache",
        "storage/emulated/0/Android/data/.com.gone.app",
        "storage/emulated/0/LOST.DIR",
        "cache",
    ] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
}

fn forensics_with_repo(dir: &TempDir, pkg_repo: StaticPkgRepo) -> FileForensics {
    build_snapshot(dir.path());
    let gateway = Arc::new(LocalGateway::rooted_at(dir.path().to_path_buf(), true));
    let areas = Arc::new(DataAreaManager::with_default_modules(
        gateway.clone(),
        StorageEnvironment::default(),
    ));
    areas.reload();
    let clutter_repo = Arc::new(ClutterRepo::bundled().unwrap());
    FileForensics::with_default_processors(areas, Arc::new(pkg_repo), clutter_repo, gateway)
}

fn forensics(dir: &TempDir, installed: &[&str]) -> FileForensics {
    forensics_with_repo(
        dir,
        StaticPkgRepo::new(installed.iter().map(|id| InstalledPkg {
            id: PkgId::from(*id),
            source_dir: None,
        })),
    )
}

#[test]
fn test_private_data_attribution() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &["com.example.app"]);

    let info = forensics
        .find_owners(&VirtualPath::local("/data/com.example.app/cache/tmp"))
        .unwrap();
    assert_eq!(info.area_info.area_type(), AreaType::Data);
    assert!(info.is_owned_by(&PkgId::from("com.example.app")));
}

#[test]
fn test_private_data_has_no_dirname_fallback() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &[]);

    let info = forensics
        .find_owners(&VirtualPath::local("/data/com.gone.app/files"))
        .unwrap();
    assert!(info.is_unattributed());
}

#[test]
fn test_public_data_attribution() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &["com.whatsapp"]);

    let info = forensics
        .find_owners(&VirtualPath::local(
            "/storage/emulated/0/Android/data/com.whatsapp/cache/img.jpg",
        ))
        .unwrap();
    assert_eq!(info.area_info.area_type(), AreaType::PublicData);
    assert!(info.is_owned_by(&PkgId::from("com.whatsapp")));
}

#[test]
fn test_public_data_falls_back_to_dirname() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &[]);

    // Public app data dirs conventionally equal pkg ids even after the
    // app is gone.
    let info = forensics
        .find_owners(&VirtualPath::local(
            "/storage/emulated/0/Android/data/com.gone.app/files",
        ))
        .unwrap();
    assert!(info.is_owned_by(&PkgId::from("com.gone.app")));
}

#[test]
fn test_public_data_hidden_name_resolution() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &["com.gone.app"]);

    let info = forensics
        .find_owners(&VirtualPath::local(
            "/storage/emulated/0/Android/data/.com.gone.app/blob",
        ))
        .unwrap();
    assert!(info.is_owned_by(&PkgId::from("com.gone.app")));
}

#[test]
fn test_sdcard_clutter_marker() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &[]);

    let info = forensics
        .find_owners(&VirtualPath::local("/storage/emulated/0/LOST.DIR/123"))
        .unwrap();
    assert_eq!(info.area_info.area_type(), AreaType::Sdcard);
    assert!(info.is_owned_by(&PkgId::from("android")));
}

#[test]
fn test_sdcard_has_no_dirname_fallback() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &[]);

    let info = forensics
        .find_owners(&VirtualPath::local("/storage/emulated/0/DCIM/Camera/img.jpg"))
        .unwrap();
    assert_eq!(info.area_info.area_type(), AreaType::Sdcard);
    assert!(info.is_unattributed());
}

#[test]
fn test_dalvik_artifact_attribution_through_nested_area() {
    let dir = TempDir::new().unwrap();
    let repo = StaticPkgRepo::new([InstalledPkg {
        id: PkgId::from("com.example.app"),
        source_dir: Some(VirtualPath::local("/data/app/com.example.app-1/base.apk")),
    }]);
    let forensics = forensics_with_repo(&dir, repo);

    // dalvik-cache sits inside the DATA root; the artifact must reach the
    // dalvik chain, not fall through the private-data one unattributed.
    let info = forensics
        .find_owners(&VirtualPath::local(
            "/data/dalvik-cache/arm64/data@app@com.example.app-1@base.apk@classes.dex",
        ))
        .unwrap();
    assert_eq!(info.area_info.area_type(), AreaType::DalvikCache);
    assert!(info.is_owned_by(&PkgId::from("com.example.app")));
}

#[test]
fn test_dalvik_profile_attribution_through_nested_area() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &["com.example.app"]);

    let info = forensics
        .find_owners(&VirtualPath::local(
            "/data/dalvik-cache/profiles/com.example.app",
        ))
        .unwrap();
    assert_eq!(info.area_info.area_type(), AreaType::DalvikProfile);
    assert!(info.is_owned_by(&PkgId::from("com.example.app")));
}

#[test]
fn test_app_private_attribution_through_nested_area() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &["com.example.app"]);

    let info = forensics
        .find_owners(&VirtualPath::local(
            "/data/app-private/com.example.app-1.apk",
        ))
        .unwrap();
    assert_eq!(info.area_info.area_type(), AreaType::AppAppPrivate);
    assert!(info.is_owned_by(&PkgId::from("com.example.app")));
}

#[test]
fn test_public_area_wins_over_enclosing_sdcard() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &["com.whatsapp"]);

    // Android/data sits inside the sdcard; the more specific area must win.
    let info = forensics
        .identify_area(&VirtualPath::local(
            "/storage/emulated/0/Android/data/com.whatsapp",
        ))
        .unwrap();
    assert_eq!(info.area_type(), AreaType::PublicData);
}

#[test]
fn test_path_outside_all_areas() {
    let dir = TempDir::new().unwrap();
    let forensics = forensics(&dir, &[]);

    assert!(forensics
        .find_owners(&VirtualPath::local("/proc/self/status"))
        .is_none());
}

#[test]
fn test_unelevated_gateway_sees_no_private_data() {
    let dir = TempDir::new().unwrap();
    build_snapshot(dir.path());
    let gateway = Arc::new(LocalGateway::rooted_at(dir.path().to_path_buf(), false));
    let areas = Arc::new(DataAreaManager::with_default_modules(
        gateway.clone(),
        StorageEnvironment::default(),
    ));
    let snapshot = areas.reload();

    assert!(!snapshot.areas.iter().any(|a| a.area_type == AreaType::Data));
    assert!(snapshot
        .areas
        .iter()
        .any(|a| a.area_type == AreaType::PublicData));
}
