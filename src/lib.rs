//! junkhound - Forensic file ownership and junk classification for Android storage
//!
//! This library resolves which installed package owns a given on-device path
//! and decides which app-owned content is safely expendable.
//!
//! # Architecture
//!
//! The scan pipeline consists of:
//! 1. **Area Discovery** - Map the device's storage into typed data areas
//! 2. **Attribution** - Place a path in its area and resolve owning packages
//! 3. **Sieving** - Classify owned content as expendable via filter chains
//! 4. **Post-Processing** - De-dup, apply exclusions, enforce thresholds

pub mod areas;
pub mod clutter;
pub mod config;
pub mod exclusion;
pub mod expendables;
pub mod files;
pub mod forensics;
pub mod pkgs;
pub mod scanner;

pub use areas::{AreaType, DataArea, DataAreaManager};
pub use clutter::ClutterRepo;
pub use config::ScanSettings;
pub use exclusion::{Exclusion, ExclusionManager};
pub use expendables::ExpendablesFilter;
pub use files::{FileGateway, LocalGateway, Segments, VirtualPath};
pub use forensics::{FileForensics, OwnerInfo};
pub use pkgs::{PkgId, PkgRepo, StaticPkgRepo};
pub use scanner::{AppJunk, AppScanner, CancelFlag};
