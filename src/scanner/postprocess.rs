//! Cleanup passes over assembled scan results.

use super::AppJunk;
use crate::config::ScanSettings;
use crate::exclusion::{Exclusion, ExclusionTag};
use crate::files::Segments;
use std::collections::HashSet;
use tracing::{debug, warn};

/// OS modules whose caches cannot be cleared through automation on API 29
/// and later; reporting them as "inaccessible" would only offer an action
/// that cannot succeed.
pub const HIDDEN_Q_PKGS: &[&str] = &[
    "com.google.android.networkstack.permissionconfig",
    "com.google.android.ext.services",
    "com.google.android.angle",
    "com.google.android.documentsui",
    "com.google.android.modulemetadata",
    "com.google.android.networkstack",
    "com.google.android.permissioncontroller",
    "com.google.android.captiveportallogin",
];

/// Run all passes in order and drop results that end up empty or below
/// the size threshold.
pub fn postprocess(
    junks: Vec<AppJunk>,
    exclusions: &[Exclusion],
    settings: &ScanSettings,
) -> Vec<AppJunk> {
    let applicable: Vec<&Exclusion> = exclusions
        .iter()
        .filter(|e| e.applies_to(ExclusionTag::AppCleaner))
        .collect();

    junks
        .into_iter()
        .filter(|junk| {
            let dropped = applicable.iter().any(|e| e.matches_pkg(&junk.pkg));
            if dropped {
                debug!("Package excluded entirely: {}", junk.pkg);
            }
            !dropped
        })
        .map(|mut junk| {
            dedup_aliases(&mut junk);
            apply_path_exclusions(&mut junk, &applicable, settings);
            suppress_hidden_module_caches(&mut junk, settings);
            junk
        })
        .filter(|junk| {
            if junk.is_empty() {
                return false;
            }
            let size = junk.size();
            if size < settings.min_cache_size_bytes {
                debug!(
                    "Dropping {}: {} bytes below threshold",
                    junk.pkg, size
                );
                return false;
            }
            true
        })
        .collect()
}

/// Different checks can surface the same path; keep the first sighting
/// per bucket.
fn dedup_aliases(junk: &mut AppJunk) {
    for (filter, items) in junk.expendables.iter_mut() {
        let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
        items.retain(|item| {
            let fresh = seen.insert(item.lookup.path.raw());
            if !fresh {
                warn!(
                    "Dropping alias {} from {} results for {}",
                    item.lookup.path, filter, junk.pkg
                );
            }
            fresh
        });
    }
}

fn apply_path_exclusions(junk: &mut AppJunk, exclusions: &[&Exclusion], settings: &ScanSettings) {
    let cache_dir = Segments::from([junk.pkg.name(), "cache"]);
    for items in junk.expendables.values_mut() {
        items.retain(|item| {
            let ignore_case = item.area_type.is_case_insensitive();
            let excluded = exclusions
                .iter()
                .any(|e| e.covers_path(&item.segments, ignore_case));
            if !excluded {
                return true;
            }
            // The alternate bridge clears whole cache dirs only, so an
            // exclusion inside one cannot be honored; the dir itself stays
            // in the result and the conflict is surfaced upstream.
            let readmitted = !settings.is_rooted
                && settings.use_alt_bridge
                && item.segments.matches(&cache_dir, ignore_case);
            if readmitted {
                debug!(
                    "Re-admitting {} for {}: bridge cannot split cache dirs",
                    item.lookup.path, junk.pkg
                );
            }
            readmitted
        });
    }
}

fn suppress_hidden_module_caches(junk: &mut AppJunk, settings: &ScanSettings) {
    if settings.api_level >= 29
        && junk.inaccessible_cache.is_some()
        && HIDDEN_Q_PKGS.contains(&junk.pkg.name())
    {
        debug!("Suppressing inaccessible cache report for {}", junk.pkg);
        junk.inaccessible_cache = None;
    }
}
