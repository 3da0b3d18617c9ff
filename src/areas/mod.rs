//! Data area model and discovery.
//!
//! A data area is a classified root location on device storage, e.g. the
//! per-user private data root or the public `Android/data` tree. Areas are
//! discovered from scratch on every reload and published as an immutable
//! snapshot; nothing downstream ever mutates one.

pub mod manager;
pub mod modules;

pub use manager::{AreaSnapshot, DataAreaManager};

use crate::files::VirtualPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Classified root location kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaType {
    /// `/data`
    Data,
    /// `<sdcard>/Android/data`
    PublicData,
    /// `<sdcard>/Android/media`
    PublicMedia,
    /// `<sdcard>/Android/obb`
    PublicObb,
    /// `/data/app-private`
    AppAppPrivate,
    /// `/data/dalvik-cache/<arch>`
    DalvikCache,
    /// `/data/dalvik-cache/profiles`
    DalvikProfile,
    /// `/apex` (canonical-resolved)
    Apex,
    /// `/data/sdext2`
    DataSdExt2,
    /// `/cache`
    DownloadCache,
    /// `/storage/emulated/<user>` and friends
    Sdcard,
}

impl AreaType {
    /// Public/sdcard areas live on FAT-heritage storage where file names
    /// are case-preserving but not case-distinct.
    pub fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            AreaType::PublicData | AreaType::PublicMedia | AreaType::PublicObb | AreaType::Sdcard
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AreaType::Data => "DATA",
            AreaType::PublicData => "PUBLIC_DATA",
            AreaType::PublicMedia => "PUBLIC_MEDIA",
            AreaType::PublicObb => "PUBLIC_OBB",
            AreaType::AppAppPrivate => "APP_APP_PRIVATE",
            AreaType::DalvikCache => "DALVIK_CACHE",
            AreaType::DalvikProfile => "DALVIK_PROFILE",
            AreaType::Apex => "APEX",
            AreaType::DataSdExt2 => "DATA_SDEXT2",
            AreaType::DownloadCache => "DOWNLOAD_CACHE",
            AreaType::Sdcard => "SDCARD",
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Android user profile handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct UserHandle(pub u32);

impl UserHandle {
    pub const SYSTEM: UserHandle = UserHandle(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaFlag {
    /// The primary instance of this area type (e.g. the primary user's data dir).
    Primary,
    Secondary,
}

/// A discovered storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataArea {
    pub area_type: AreaType,
    pub path: VirtualPath,
    pub user_handle: UserHandle,
    pub flags: BTreeSet<AreaFlag>,
}

impl DataArea {
    pub fn new(area_type: AreaType, path: VirtualPath, user_handle: UserHandle) -> Self {
        Self {
            area_type,
            path,
            user_handle,
            flags: BTreeSet::new(),
        }
    }

    pub fn with_flags(mut self, flags: impl IntoIterator<Item = AreaFlag>) -> Self {
        self.flags = flags.into_iter().collect();
        self
    }

    pub fn has_flag(&self, flag: AreaFlag) -> bool {
        self.flags.contains(&flag)
    }
}

impl fmt::Display for DataArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, user={})", self.area_type, self.path, self.user_handle.0)
    }
}
