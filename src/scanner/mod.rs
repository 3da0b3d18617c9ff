//! Scan orchestration: walk scannable areas, attribute content, sieve it.

mod postprocess;

pub use postprocess::{postprocess, HIDDEN_Q_PKGS};

use crate::areas::{AreaType, DataArea, DataAreaManager};
use crate::config::ScanSettings;
use crate::exclusion::ExclusionManager;
use crate::expendables::{
    DefaultCachesFilter, ExpendablesFilter, RecycleBinsFilter, SieveError,
};
use crate::files::{FileGateway, FileType, GatewayError, PathLookup, Segments, VirtualPath};
use crate::forensics::FileForensics;
use crate::pkgs::PkgId;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan was cancelled")]
    Cancelled,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Sieve(#[from] SieveError),
}

/// One expendable path, kept with the context its classification needs.
#[derive(Debug, Clone)]
pub struct JunkItem {
    pub lookup: PathLookup,
    pub area_type: AreaType,
    /// Area-relative path, first segment being the package directory.
    pub segments: Segments,
}

/// Classified junk for one package, merged across areas.
#[derive(Debug, Clone)]
pub struct AppJunk {
    pub pkg: PkgId,
    /// Expendable content keyed by the filter that claimed it.
    pub expendables: BTreeMap<&'static str, Vec<JunkItem>>,
    /// The private cache dir exists but cannot be read with the current
    /// access level.
    pub inaccessible_cache: Option<VirtualPath>,
}

impl AppJunk {
    pub fn new(pkg: PkgId) -> Self {
        Self {
            pkg,
            expendables: BTreeMap::new(),
            inaccessible_cache: None,
        }
    }

    pub fn size(&self) -> u64 {
        self.expendables
            .values()
            .flatten()
            .map(|item| item.lookup.size)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.expendables.values().all(Vec::is_empty) && self.inaccessible_cache.is_none()
    }

    fn merge(&mut self, other: AppJunk) {
        for (filter, items) in other.expendables {
            self.expendables.entry(filter).or_default().extend(items);
        }
        if self.inaccessible_cache.is_none() {
            self.inaccessible_cache = other.inaccessible_cache;
        }
    }
}

/// Cooperative cancellation, checked per walked entry.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Advisory status sink; scanning never blocks on it.
pub trait ProgressObserver: Send + Sync {
    fn update(&self, primary: &str, secondary: &str);
}

struct ProgressSink {
    observer: Option<Arc<dyn ProgressObserver>>,
    last: Mutex<Instant>,
    min_interval: Duration,
}

impl ProgressSink {
    fn detached() -> Self {
        Self {
            observer: None,
            last: Mutex::new(Instant::now()),
            min_interval: Duration::from_millis(250),
        }
    }

    /// Coalesced: updates inside the rate window are dropped, not queued.
    fn publish(&self, primary: &str, secondary: &str) {
        let Some(observer) = &self.observer else {
            return;
        };
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if last.elapsed() < self.min_interval {
            return;
        }
        *last = Instant::now();
        observer.update(primary, secondary);
    }
}

const SCAN_AREAS: &[AreaType] = &[AreaType::Data, AreaType::PublicData];

/// Per-app junk scanner over the current area snapshot.
pub struct AppScanner {
    gateway: Arc<dyn FileGateway>,
    areas: Arc<DataAreaManager>,
    forensics: Arc<FileForensics>,
    exclusions: Arc<ExclusionManager>,
    filters: Vec<Box<dyn ExpendablesFilter>>,
    settings: ScanSettings,
    progress: ProgressSink,
    // One scan at a time per scanner instance.
    scan_lock: Mutex<()>,
}

impl AppScanner {
    pub fn new(
        gateway: Arc<dyn FileGateway>,
        areas: Arc<DataAreaManager>,
        forensics: Arc<FileForensics>,
        exclusions: Arc<ExclusionManager>,
        settings: ScanSettings,
    ) -> Result<Self, SieveError> {
        let mut filters: Vec<Box<dyn ExpendablesFilter>> = Vec::new();
        if settings.filter.default_caches {
            filters.push(Box::new(DefaultCachesFilter::new()?));
        }
        if settings.filter.recycle_bins {
            filters.push(Box::new(RecycleBinsFilter::new()));
        }
        for filter in &filters {
            filter.initialize()?;
        }
        Ok(Self {
            gateway,
            areas,
            forensics,
            exclusions,
            filters,
            settings,
            progress: ProgressSink::detached(),
            scan_lock: Mutex::new(()),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress.observer = Some(observer);
        self
    }

    /// Walk all scannable areas and return post-processed per-package junk.
    pub fn scan(&self, cancel: &CancelFlag) -> Result<Vec<AppJunk>, ScanError> {
        let _guard = match self.scan_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.progress.publish("Searching", "");

        let snapshot = self.areas.current_areas();
        let mut per_pkg: HashMap<PkgId, AppJunk> = HashMap::new();

        for area in snapshot
            .areas
            .iter()
            .filter(|area| SCAN_AREAS.contains(&area.area_type))
        {
            let pkg_dirs = match self.gateway.list(&area.path) {
                Ok(entries) => entries,
                Err(GatewayError::NotFound(_)) => continue,
                Err(err) => return Err(err.into()),
            };

            let scanned = pkg_dirs
                .par_iter()
                .map(|entry| self.scan_pkg_dir(area, entry, cancel))
                .collect::<Result<Vec<_>, ScanError>>()?;

            for junk in scanned.into_iter().flatten() {
                match per_pkg.get_mut(&junk.pkg) {
                    Some(existing) => existing.merge(junk),
                    None => {
                        per_pkg.insert(junk.pkg.clone(), junk);
                    }
                }
            }
        }

        debug!("Raw scan results for {} packages", per_pkg.len());
        let exclusions = self.exclusions.current_exclusions();
        Ok(postprocess(
            per_pkg.into_values().collect(),
            &exclusions,
            &self.settings,
        ))
    }

    fn scan_pkg_dir(
        &self,
        area: &DataArea,
        entry: &PathLookup,
        cancel: &CancelFlag,
    ) -> Result<Option<AppJunk>, ScanError> {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        if entry.file_type != FileType::Directory {
            return Ok(None);
        }

        // Unattributed directories are corpse territory, not app junk.
        let Some(owner_info) = self.forensics.find_owners(&entry.path) else {
            return Ok(None);
        };
        let Some(owner) = owner_info.owners.iter().next() else {
            return Ok(None);
        };
        let pkg = owner.pkg_id.clone();
        self.progress.publish("Scanning", pkg.name());

        let mut junk = AppJunk::new(pkg.clone());

        if area.area_type == AreaType::Data {
            let cache_dir = entry.path.child("cache");
            if self.gateway.exists(&cache_dir) && !self.gateway.can_read(&cache_dir) {
                junk.inaccessible_cache = Some(cache_dir);
            }
        }

        let contents = match self.gateway.walk(&entry.path) {
            Ok(contents) => contents,
            Err(err) => {
                // Unreadable app dirs are expected without elevation; the
                // rest of the batch continues.
                warn!("Cannot walk {}: {err}", entry.path);
                return Ok(Some(junk));
            }
        };

        for lookup in contents {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            let Some(segments) = lookup.path.remove_prefix(&area.path) else {
                continue;
            };
            for filter in &self.filters {
                if filter.is_expendable(&pkg, &lookup, area.area_type, &segments) {
                    junk.expendables
                        .entry(filter.name())
                        .or_default()
                        .push(JunkItem {
                            lookup,
                            area_type: area.area_type,
                            segments,
                        });
                    break;
                }
            }
        }

        Ok(Some(junk))
    }
}
