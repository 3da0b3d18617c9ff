// Dalvik cache areas, derived from DATA and DOWNLOAD_CACHE roots.

use super::{AreaModule, DiscoveryContext};
use crate::areas::{AreaFlag, AreaType, DataArea, UserHandle};
use crate::files::VirtualPath;
use tracing::info;

const ARCHITECTURES: &[&str] = &["arm", "arm64", "x86", "x86_64"];

fn dalvik_parents<'a>(first: &'a [DataArea]) -> impl Iterator<Item = &'a VirtualPath> {
    first
        .iter()
        .filter(|area| {
            (area.area_type == AreaType::Data && area.has_flag(AreaFlag::Primary))
                || area.area_type == AreaType::DownloadCache
        })
        .map(|area| &area.path)
}

/// `<parent>/dalvik-cache/<arch>` for each present architecture.
pub struct DalvikCacheModule;

impl AreaModule for DalvikCacheModule {
    fn name(&self) -> &'static str {
        "DalvikCache"
    }

    fn second_pass(&self, ctx: &DiscoveryContext<'_>, first: &[DataArea]) -> Vec<DataArea> {
        if !ctx.gateway.has_elevated() {
            info!("Gateway has no elevated access, skipping dalvik-cache");
            return Vec::new();
        }

        dalvik_parents(first)
            .flat_map(|parent| {
                ARCHITECTURES
                    .iter()
                    .map(|arch| parent.child(&format!("dalvik-cache/{arch}")))
            })
            .filter(|path| ctx.gateway.exists(path))
            .map(|path| DataArea::new(AreaType::DalvikCache, path, UserHandle::SYSTEM))
            .collect()
    }
}

/// `<parent>/dalvik-cache/profiles`.
pub struct DalvikProfileModule;

impl AreaModule for DalvikProfileModule {
    fn name(&self) -> &'static str {
        "DalvikProfile"
    }

    fn second_pass(&self, ctx: &DiscoveryContext<'_>, first: &[DataArea]) -> Vec<DataArea> {
        if !ctx.gateway.has_elevated() {
            info!("Gateway has no elevated access, skipping dalvik profiles");
            return Vec::new();
        }

        dalvik_parents(first)
            .map(|parent| parent.child("dalvik-cache/profiles"))
            .filter(|path| ctx.gateway.exists(path))
            .map(|path| DataArea::new(AreaType::DalvikProfile, path, UserHandle::SYSTEM))
            .collect()
    }
}
