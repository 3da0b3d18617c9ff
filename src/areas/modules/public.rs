// Public storage areas: sdcard roots and the Android/{data,media,obb} trees.

use super::{AreaModule, DiscoveryContext};
use crate::areas::{AreaFlag, AreaType, DataArea};
use tracing::debug;

/// Sdcard roots from the storage environment. No elevation needed.
pub struct SdcardModule;

impl AreaModule for SdcardModule {
    fn name(&self) -> &'static str {
        "Sdcard"
    }

    fn first_pass(&self, ctx: &DiscoveryContext<'_>) -> Vec<DataArea> {
        ctx.environment
            .sdcard_roots
            .iter()
            .enumerate()
            .filter(|(_, root)| {
                let exists = ctx.gateway.exists(root);
                if !exists {
                    debug!("Sdcard root missing: {}", root);
                }
                exists
            })
            .map(|(index, root)| {
                let flag = if index == 0 { AreaFlag::Primary } else { AreaFlag::Secondary };
                DataArea::new(AreaType::Sdcard, root.clone(), ctx.environment.current_user)
                    .with_flags([flag])
            })
            .collect()
    }
}

fn derive_android_subdir(
    ctx: &DiscoveryContext<'_>,
    first: &[DataArea],
    subdir: &str,
    area_type: AreaType,
) -> Vec<DataArea> {
    first
        .iter()
        .filter(|area| area.area_type == AreaType::Sdcard)
        .map(|parent| {
            DataArea::new(area_type, parent.path.child(subdir), parent.user_handle)
                .with_flags(parent.flags.iter().copied())
        })
        .filter(|area| ctx.gateway.exists(&area.path))
        .collect()
}

/// `<sdcard>/Android/data`
pub struct PublicDataModule;

impl AreaModule for PublicDataModule {
    fn name(&self) -> &'static str {
        "PublicData"
    }

    fn second_pass(&self, ctx: &DiscoveryContext<'_>, first: &[DataArea]) -> Vec<DataArea> {
        derive_android_subdir(ctx, first, "Android/data", AreaType::PublicData)
    }
}

/// `<sdcard>/Android/media`
pub struct PublicMediaModule;

impl AreaModule for PublicMediaModule {
    fn name(&self) -> &'static str {
        "PublicMedia"
    }

    fn second_pass(&self, ctx: &DiscoveryContext<'_>, first: &[DataArea]) -> Vec<DataArea> {
        derive_android_subdir(ctx, first, "Android/media", AreaType::PublicMedia)
    }
}

/// `<sdcard>/Android/obb`
pub struct PublicObbModule;

impl AreaModule for PublicObbModule {
    fn name(&self) -> &'static str {
        "PublicObb"
    }

    fn second_pass(&self, ctx: &DiscoveryContext<'_>, first: &[DataArea]) -> Vec<DataArea> {
        derive_android_subdir(ctx, first, "Android/obb", AreaType::PublicObb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::modules::StorageEnvironment;
    use crate::files::LocalGateway;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_public_data_derived_from_sdcard() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("storage/emulated/0/Android/data")).unwrap();
        let gateway = LocalGateway::rooted_at(dir.path().to_path_buf(), false);
        let env = StorageEnvironment::default();
        let ctx = DiscoveryContext {
            gateway: &gateway,
            environment: &env,
        };

        let first = SdcardModule.first_pass(&ctx);
        assert_eq!(first.len(), 1);
        assert!(first[0].has_flag(AreaFlag::Primary));

        let public = PublicDataModule.second_pass(&ctx, &first);
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].area_type, AreaType::PublicData);
        assert_eq!(public[0].path.raw(), "/storage/emulated/0/Android/data");

        // obb dir was never created
        assert!(PublicObbModule.second_pass(&ctx, &first).is_empty());
    }
}
