// Private data areas: /data and the roots derived from it.

use super::{AreaModule, DiscoveryContext};
use crate::areas::{AreaFlag, AreaType, DataArea, UserHandle};
use tracing::{debug, info};

/// `/data` itself. Needs elevated access; without it nothing below
/// private data is reachable anyway.
pub struct DataModule;

impl AreaModule for DataModule {
    fn name(&self) -> &'static str {
        "Data"
    }

    fn first_pass(&self, ctx: &DiscoveryContext<'_>) -> Vec<DataArea> {
        if !ctx.gateway.has_elevated() {
            info!("Gateway has no elevated access, skipping private data");
            return Vec::new();
        }

        let data_dir = &ctx.environment.data_dir;
        if !ctx.gateway.exists(data_dir) {
            debug!("Data dir missing: {}", data_dir);
            return Vec::new();
        }

        vec![
            DataArea::new(AreaType::Data, data_dir.clone(), ctx.environment.current_user)
                .with_flags([AreaFlag::Primary]),
        ]
    }
}

/// `<data>/app-private`, the pre-scoped-storage private APK location.
pub struct AppSourcePrivateModule;

impl AreaModule for AppSourcePrivateModule {
    fn name(&self) -> &'static str {
        "AppSourcePrivate"
    }

    fn second_pass(&self, ctx: &DiscoveryContext<'_>, first: &[DataArea]) -> Vec<DataArea> {
        if !ctx.gateway.has_elevated() {
            info!("Gateway has no elevated access, skipping app-private");
            return Vec::new();
        }

        first
            .iter()
            .filter(|area| area.area_type == AreaType::Data && area.has_flag(AreaFlag::Primary))
            .map(|parent| {
                DataArea::new(
                    AreaType::AppAppPrivate,
                    parent.path.child("app-private"),
                    parent.user_handle,
                )
            })
            .filter(|area| ctx.gateway.exists(&area.path))
            .collect()
    }
}

/// `<data>/sdext2`, the link2sd-style extension partition mount.
pub struct DataSdExt2Module;

impl AreaModule for DataSdExt2Module {
    fn name(&self) -> &'static str {
        "DataSdExt2"
    }

    fn second_pass(&self, ctx: &DiscoveryContext<'_>, first: &[DataArea]) -> Vec<DataArea> {
        if !ctx.gateway.has_elevated() {
            info!("Gateway has no elevated access, skipping sdext2");
            return Vec::new();
        }

        first
            .iter()
            .filter(|area| area.area_type == AreaType::Data && area.has_flag(AreaFlag::Primary))
            .map(|parent| {
                DataArea::new(
                    AreaType::DataSdExt2,
                    parent.path.child("sdext2"),
                    UserHandle::SYSTEM,
                )
                .with_flags(parent.flags.iter().copied())
            })
            .filter(|area| ctx.gateway.exists(&area.path))
            .collect()
    }
}
