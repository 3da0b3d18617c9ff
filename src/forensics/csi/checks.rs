//! Ownership checks shared by the CSI processors.
//!
//! Every check takes an `AreaInfo` (or pre-expanded candidate paths) and
//! produces zero or more owners. Checks never error; a miss is an empty
//! result.

use crate::areas::AreaType;
use crate::clutter::{ClutterRepo, MarkerFlag};
use crate::files::{FileGateway, Segments, VirtualPath};
use crate::forensics::{AreaInfo, Owner};
use crate::pkgs::{PkgId, PkgRepo};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// `/data/app/somepkg-123.apk` -> `somepkg`, digits bounded to 1-4.
fn codesource_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w.\-]+)(?:-[0-9]{1,4}\.apk)$").expect("static regex"))
}

/// Oddly renamed dex artifacts left behind by repackaging tools.
fn patched_dex_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w\W]+?)(?:-[0-9]{1,4}\.o?dex)$").expect("static regex"))
}

/// Android install dirs: `pkg-2` or `pkg-4hK_Abc123==`.
fn install_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+?)-(?:[0-9]{1,4}|[A-Za-z0-9_\-]+={0,2})$").expect("static regex")
    })
}

/// Repackaging tools that claim custody of renamed dex artifacts.
const BAD_UNCLES: &[&str] = &[
    "com.forpda.lp",
    "com.chelpus.lackypatch",
    "com.dimonvideo.luckypatcher",
    "com.android.vending.billing.InAppBillingService.LUCK",
];

/// Match an APK file name to an installed package.
pub struct FileToPkgCheck {
    pkg_repo: Arc<dyn PkgRepo>,
}

impl FileToPkgCheck {
    pub fn new(pkg_repo: Arc<dyn PkgRepo>) -> Self {
        Self { pkg_repo }
    }

    pub fn process(&self, area_info: &AreaInfo) -> Vec<Owner> {
        let Some(captures) = codesource_file_regex().captures(area_info.file.name()) else {
            return Vec::new();
        };
        let pkg_id = PkgId::from(&captures[1]);
        if self.pkg_repo.is_installed(&pkg_id) {
            vec![Owner::new(pkg_id)]
        } else {
            Vec::new()
        }
    }
}

/// Repackaging-tool heuristic for `.dex`/`.odex` artifacts.
pub struct LuckyPatcherCheck {
    pkg_repo: Arc<dyn PkgRepo>,
}

impl LuckyPatcherCheck {
    pub fn new(pkg_repo: Arc<dyn PkgRepo>) -> Self {
        Self { pkg_repo }
    }

    pub fn process(&self, area_info: &AreaInfo) -> Vec<Owner> {
        let name = area_info.file.name();
        if !name.ends_with(".dex") && !name.ends_with(".odex") {
            return Vec::new();
        }
        let Some(captures) = patched_dex_regex().captures(name) else {
            return Vec::new();
        };

        let mut owners = Vec::new();
        let pkg_id = PkgId::from(&captures[1]);
        if self.pkg_repo.is_installed(&pkg_id) {
            owners.push(Owner::new(pkg_id));
        }

        // The tools themselves take custody of any artifact with this shape.
        for uncle in BAD_UNCLES {
            let uncle = PkgId::from(*uncle);
            if self.pkg_repo.is_installed(&uncle) {
                owners.push(Owner::custodian(uncle));
            }
        }
        owners
    }
}

/// Vendor conventions for hiding per-app folders: `.pkg`, `_pkg`,
/// `.external.pkg`.
pub fn clean_hidden_name(name: &str) -> Option<&str> {
    if let Some(stripped) = name.strip_prefix(".external.") {
        Some(stripped)
    } else if let Some(stripped) = name.strip_prefix('.') {
        Some(stripped)
    } else {
        name.strip_prefix('_')
    }
}

/// First prefix-free segment as a package id, with install-suffix stripping.
pub struct DirToPkgCheck {
    pkg_repo: Arc<dyn PkgRepo>,
}

impl DirToPkgCheck {
    pub fn new(pkg_repo: Arc<dyn PkgRepo>) -> Self {
        Self { pkg_repo }
    }

    pub fn process(&self, area_info: &AreaInfo) -> Vec<Owner> {
        let Some(dir_name) = area_info.prefix_free_path().first() else {
            return Vec::new();
        };

        let direct = PkgId::from(dir_name);
        if self.pkg_repo.is_installed(&direct) {
            return vec![Owner::new(direct)];
        }

        if let Some(captures) = install_suffix_regex().captures(dir_name) {
            let stripped = PkgId::from(&captures[1]);
            if self.pkg_repo.is_installed(&stripped) {
                return vec![Owner::new(stripped)];
            }
        }
        Vec::new()
    }
}

/// Extract the owner from an APK archive's manifest.
///
/// Compiled artifacts of GMS dynamite modules get dual attribution: the
/// module id from the manifest plus GMS core itself.
pub struct ApkCheck {
    pkg_repo: Arc<dyn PkgRepo>,
}

impl ApkCheck {
    pub fn new(pkg_repo: Arc<dyn PkgRepo>) -> Self {
        Self { pkg_repo }
    }

    pub fn check(&self, candidates: &[VirtualPath]) -> Vec<Owner> {
        for candidate in candidates {
            if !candidate.name().ends_with(".apk") {
                continue;
            }
            let Some(info) = self.pkg_repo.view_archive(candidate) else {
                continue;
            };
            trace!("ApkInfo for {}: {}", candidate, info.id);
            if info.id.name().starts_with("com.google.android.gms.") {
                return vec![
                    Owner::new(info.id),
                    Owner::new(PkgId::from("com.google.android.gms")),
                ];
            }
            return vec![Owner::new(info.id)];
        }
        Vec::new()
    }
}

/// Compare candidate paths against every installed package's source dir.
pub struct SourceDirCheck {
    pkg_repo: Arc<dyn PkgRepo>,
}

impl SourceDirCheck {
    pub fn new(pkg_repo: Arc<dyn PkgRepo>) -> Self {
        Self { pkg_repo }
    }

    pub fn check(&self, candidates: &[VirtualPath]) -> Vec<Owner> {
        self.pkg_repo
            .current_pkgs()
            .into_iter()
            .filter(|pkg| {
                pkg.source_dir
                    .as_ref()
                    .map(|src| candidates.iter().any(|c| c.segments() == src.segments()))
                    .unwrap_or(false)
            })
            .map(|pkg| Owner::new(pkg.id))
            .take(1)
            .collect()
    }
}

/// Walk one level into an unrecognized source dir looking for `base.apk`.
pub struct SubDirToPkgCheck {
    gateway: Arc<dyn FileGateway>,
    pkg_repo: Arc<dyn PkgRepo>,
}

impl SubDirToPkgCheck {
    pub fn new(gateway: Arc<dyn FileGateway>, pkg_repo: Arc<dyn PkgRepo>) -> Self {
        Self { gateway, pkg_repo }
    }

    pub fn process(&self, area_info: &AreaInfo) -> Vec<Owner> {
        if area_info.prefix_free_path().len() != 1 {
            return Vec::new();
        }
        let base_apk = area_info.file.child("base.apk");
        if !self.gateway.exists(&base_apk) {
            return Vec::new();
        }
        self.pkg_repo
            .view_archive(&base_apk)
            .map(|info| vec![Owner::new(info.id)])
            .unwrap_or_default()
    }
}

/// Clutter-database lookup of the prefix-free path.
pub struct ClutterCheck {
    clutter_repo: Arc<ClutterRepo>,
}

impl ClutterCheck {
    pub fn new(clutter_repo: Arc<ClutterRepo>) -> Self {
        Self { clutter_repo }
    }

    pub fn process(&self, area_info: &AreaInfo) -> Vec<Owner> {
        self.process_segments(area_info.area_type(), area_info.prefix_free_path())
    }

    /// Match arbitrary segments instead of the full prefix-free path,
    /// for processors that attribute by top-level dir only.
    pub fn process_segments(&self, area_type: AreaType, segments: &Segments) -> Vec<Owner> {
        self.clutter_repo
            .match_segments(area_type, segments)
            .into_iter()
            .flat_map(|matched| {
                let custodian = matched.flags.contains(&MarkerFlag::Custodian);
                matched.pkgs.into_iter().map(move |pkg| {
                    if custodian {
                        Owner::custodian(pkg)
                    } else {
                        Owner::new(pkg)
                    }
                })
            })
            .collect()
    }
}

/// Fuzzy cleanup pass: collapse case-variant duplicates of installed ids
/// onto the installed spelling.
pub struct SimilarityFilter {
    pkg_repo: Arc<dyn PkgRepo>,
}

impl SimilarityFilter {
    pub fn new(pkg_repo: Arc<dyn PkgRepo>) -> Self {
        Self { pkg_repo }
    }

    pub fn filter(&self, owners: Vec<Owner>) -> Vec<Owner> {
        let installed = self.pkg_repo.current_pkgs();
        owners
            .into_iter()
            .map(|owner| {
                if self.pkg_repo.is_installed(&owner.pkg_id) {
                    return owner;
                }
                let corrected = installed
                    .iter()
                    .find(|pkg| pkg.id.name().eq_ignore_ascii_case(owner.pkg_id.name()))
                    .map(|pkg| pkg.id.clone());
                match corrected {
                    Some(pkg_id) => Owner { pkg_id, ..owner },
                    None => owner,
                }
            })
            .collect()
    }
}
