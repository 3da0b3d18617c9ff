//! CLI integration tests.
//!
//! These tests run the junkhound binary against a snapshot directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, size: usize) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; size]).unwrap();
}

/// Snapshot with one installed app owning private and public cache data.
fn build_snapshot(dir: &TempDir) -> std::path::PathBuf {
    write_file(dir.path(), "data/com.example.app/cache/blob.bin", 4096);
    write_file(
        dir.path(),
        "storage/emulated/0/Android/data/com.example.app/cache/tmp.jpg",
        2048,
    );

    let pkgs = dir.path().join("pkgs.json");
    fs::write(
        &pkgs,
        r#"{"packages": [{"id": "com.example.app"}], "archives": {}}"#,
    )
    .unwrap();
    pkgs
}

fn junkhound() -> Command {
    Command::cargo_bin("junkhound").unwrap()
}

#[test]
fn test_scan_reports_junk() {
    let dir = TempDir::new().unwrap();
    let pkgs = build_snapshot(&dir);
    fs::write(dir.path().join(".junkhound.yml"), "min_cache_size_bytes: 0\n").unwrap();

    junkhound()
        .args(["--quiet", "scan", "--rooted"])
        .arg("--root")
        .arg(dir.path())
        .arg("--pkgs")
        .arg(&pkgs)
        .assert()
        .success()
        .stdout(predicate::str::contains("com.example.app"));
}

#[test]
fn test_scan_json_output() {
    let dir = TempDir::new().unwrap();
    let pkgs = build_snapshot(&dir);
    fs::write(dir.path().join(".junkhound.yml"), "min_cache_size_bytes: 0\n").unwrap();

    let output = junkhound()
        .args(["--quiet", "scan", "--rooted", "--json"])
        .arg("--root")
        .arg(dir.path())
        .arg("--pkgs")
        .arg(&pkgs)
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let packages = parsed["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["pkg"], "com.example.app");
    assert_eq!(packages[0]["size"], 6144);
}

#[test]
fn test_scan_without_elevation_skips_private_data() {
    let dir = TempDir::new().unwrap();
    let pkgs = build_snapshot(&dir);
    fs::write(dir.path().join(".junkhound.yml"), "min_cache_size_bytes: 0\n").unwrap();

    let output = junkhound()
        .args(["--quiet", "scan", "--json"])
        .arg("--root")
        .arg(dir.path())
        .arg("--pkgs")
        .arg(&pkgs)
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // Only the public cache file is reachable without elevation.
    assert_eq!(parsed["packages"][0]["size"], 2048);
}

#[test]
fn test_areas_lists_discovered_areas() {
    let dir = TempDir::new().unwrap();
    build_snapshot(&dir);

    junkhound()
        .args(["--quiet", "areas", "--rooted"])
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("DATA")
                .and(predicate::str::contains("PUBLIC_DATA"))
                .and(predicate::str::contains("SDCARD")),
        );
}

#[test]
fn test_missing_pkg_snapshot_fails() {
    let dir = TempDir::new().unwrap();

    junkhound()
        .args(["--quiet", "scan"])
        .arg("--root")
        .arg(dir.path())
        .arg("--pkgs")
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("package snapshot"));
}
