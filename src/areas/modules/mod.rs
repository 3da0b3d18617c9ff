//! Two-pass area discovery modules.
//!
//! Each module derives areas from either the raw environment (`first_pass`)
//! or from areas another module already found (`second_pass`). Modules that
//! need elevated access check the gateway capability themselves and return
//! an empty set when it is missing; that is a degradation, never an error.

mod dalvik;
mod privdata;
mod public;
mod system;

pub use dalvik::{DalvikCacheModule, DalvikProfileModule};
pub use privdata::{AppSourcePrivateModule, DataModule, DataSdExt2Module};
pub use public::{PublicDataModule, PublicMediaModule, PublicObbModule, SdcardModule};
pub use system::{ApexModule, DownloadCacheModule};

use super::{DataArea, UserHandle};
use crate::files::{FileGateway, VirtualPath};

/// Mount points and user info the first pass starts from.
#[derive(Debug, Clone)]
pub struct StorageEnvironment {
    pub data_dir: VirtualPath,
    pub download_cache_dir: VirtualPath,
    pub apex_dir: VirtualPath,
    pub sdcard_roots: Vec<VirtualPath>,
    pub current_user: UserHandle,
}

impl Default for StorageEnvironment {
    fn default() -> Self {
        Self {
            data_dir: VirtualPath::local("/data"),
            download_cache_dir: VirtualPath::local("/cache"),
            apex_dir: VirtualPath::local("/apex"),
            sdcard_roots: vec![VirtualPath::local("/storage/emulated/0")],
            current_user: UserHandle::SYSTEM,
        }
    }
}

/// Everything a module may consult during discovery.
pub struct DiscoveryContext<'a> {
    pub gateway: &'a dyn FileGateway,
    pub environment: &'a StorageEnvironment,
}

/// A single discovery unit.
///
/// First-pass results of all modules are unioned before any second pass
/// runs; second passes see the full union and run in no guaranteed order.
pub trait AreaModule: Send + Sync {
    fn name(&self) -> &'static str;

    fn first_pass(&self, _ctx: &DiscoveryContext<'_>) -> Vec<DataArea> {
        Vec::new()
    }

    fn second_pass(&self, _ctx: &DiscoveryContext<'_>, _first: &[DataArea]) -> Vec<DataArea> {
        Vec::new()
    }
}

/// The default module set, in declaration order.
pub fn default_modules() -> Vec<Box<dyn AreaModule>> {
    vec![
        Box::new(DataModule),
        Box::new(DownloadCacheModule),
        Box::new(SdcardModule),
        Box::new(ApexModule),
        Box::new(PublicDataModule),
        Box::new(PublicMediaModule),
        Box::new(PublicObbModule),
        Box::new(AppSourcePrivateModule),
        Box::new(DalvikCacheModule),
        Box::new(DalvikProfileModule),
        Box::new(DataSdExt2Module),
    ]
}
