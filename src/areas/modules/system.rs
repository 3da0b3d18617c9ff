// System areas: the download cache partition and the APEX mount.

use super::{AreaModule, DiscoveryContext};
use crate::areas::{AreaType, DataArea, UserHandle};
use tracing::{info, warn};

/// `/cache`. Needs elevated access on modern devices.
pub struct DownloadCacheModule;

impl AreaModule for DownloadCacheModule {
    fn name(&self) -> &'static str {
        "DownloadCache"
    }

    fn first_pass(&self, ctx: &DiscoveryContext<'_>) -> Vec<DataArea> {
        if !ctx.gateway.has_elevated() {
            info!("Gateway has no elevated access, skipping download cache");
            return Vec::new();
        }

        let cache_dir = &ctx.environment.download_cache_dir;
        if !ctx.gateway.exists(cache_dir) {
            return Vec::new();
        }

        vec![DataArea::new(
            AreaType::DownloadCache,
            cache_dir.clone(),
            UserHandle::SYSTEM,
        )]
    }
}

/// `/apex`, resolved through symlinks so the area root matches what the
/// kernel actually reports for files below it.
pub struct ApexModule;

impl AreaModule for ApexModule {
    fn name(&self) -> &'static str {
        "Apex"
    }

    fn first_pass(&self, ctx: &DiscoveryContext<'_>) -> Vec<DataArea> {
        if !ctx.gateway.has_elevated() {
            info!("Gateway has no elevated access, skipping apex");
            return Vec::new();
        }

        let apex_dir = &ctx.environment.apex_dir;
        if !ctx.gateway.exists(apex_dir) {
            return Vec::new();
        }

        let resolved = match ctx.gateway.canonicalize(apex_dir) {
            Some(path) => path,
            None => {
                warn!("Failed to resolve canonical apex path, using {}", apex_dir);
                apex_dir.clone()
            }
        };

        vec![DataArea::new(AreaType::Apex, resolved, UserHandle::SYSTEM)]
    }
}
