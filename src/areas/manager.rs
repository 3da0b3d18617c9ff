//! Area registry: rebuilds the full area set on reload and publishes it as
//! an atomic, immutable snapshot. Readers never observe a partial rebuild.

use super::modules::{AreaModule, DiscoveryContext, StorageEnvironment};
use super::DataArea;
use crate::files::FileGateway;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Published result of one discovery run.
#[derive(Debug, Default)]
pub struct AreaSnapshot {
    pub areas: Vec<DataArea>,
    /// Monotonic reload counter, 0 until the first reload.
    pub generation: u64,
}

pub struct DataAreaManager {
    gateway: Arc<dyn FileGateway>,
    environment: StorageEnvironment,
    modules: Vec<Box<dyn AreaModule>>,
    snapshot: RwLock<Arc<AreaSnapshot>>,
}

impl DataAreaManager {
    pub fn new(
        gateway: Arc<dyn FileGateway>,
        environment: StorageEnvironment,
        modules: Vec<Box<dyn AreaModule>>,
    ) -> Self {
        Self {
            gateway,
            environment,
            modules,
            snapshot: RwLock::new(Arc::new(AreaSnapshot::default())),
        }
    }

    pub fn with_default_modules(gateway: Arc<dyn FileGateway>, environment: StorageEnvironment) -> Self {
        Self::new(gateway, environment, super::modules::default_modules())
    }

    /// Latest published snapshot; cheap, never blocks on discovery.
    pub fn current_areas(&self) -> Arc<AreaSnapshot> {
        self.snapshot
            .read()
            .expect("area snapshot lock poisoned")
            .clone()
    }

    /// Discover the full area set from scratch and swap the snapshot.
    pub fn reload(&self) -> Arc<AreaSnapshot> {
        let ctx = DiscoveryContext {
            gateway: self.gateway.as_ref(),
            environment: &self.environment,
        };

        let mut union: Vec<DataArea> = Vec::new();
        let mut seen: HashSet<DataArea> = HashSet::new();

        for module in &self.modules {
            let found = module.first_pass(&ctx);
            debug!("firstPass({}): {} areas", module.name(), found.len());
            for area in found {
                if seen.insert(area.clone()) {
                    union.push(area);
                }
            }
        }

        // All second passes see the complete first-pass union; their mutual
        // order carries no meaning.
        let first_pass_result = union.clone();
        for module in &self.modules {
            let found = module.second_pass(&ctx, &first_pass_result);
            debug!("secondPass({}): {} areas", module.name(), found.len());
            for area in found {
                if seen.insert(area.clone()) {
                    union.push(area);
                }
            }
        }

        let areas: Vec<DataArea> = union
            .into_iter()
            .filter(|area| {
                let readable = self.gateway.can_read(&area.path);
                if !readable {
                    warn!("Dropping unreadable area: {}", area);
                }
                readable
            })
            .collect();

        let mut guard = self.snapshot.write().expect("area snapshot lock poisoned");
        let next = Arc::new(AreaSnapshot {
            areas,
            generation: guard.generation + 1,
        });
        *guard = next.clone();
        drop(guard);

        info!(
            "Area reload complete: {} areas (generation {})",
            next.areas.len(),
            next.generation
        );
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::{AreaType, UserHandle};
    use crate::files::{LocalGateway, VirtualPath};
    use std::fs;
    use tempfile::TempDir;

    struct FixedModule(Vec<DataArea>);

    impl AreaModule for FixedModule {
        fn name(&self) -> &'static str {
            "Fixed"
        }
        fn first_pass(&self, _ctx: &DiscoveryContext<'_>) -> Vec<DataArea> {
            self.0.clone()
        }
    }

    struct DerivingModule;

    impl AreaModule for DerivingModule {
        fn name(&self) -> &'static str {
            "Deriving"
        }
        fn second_pass(&self, _ctx: &DiscoveryContext<'_>, first: &[DataArea]) -> Vec<DataArea> {
            first
                .iter()
                .filter(|a| a.area_type == AreaType::Data)
                .map(|a| {
                    DataArea::new(AreaType::DataSdExt2, a.path.child("sdext2"), a.user_handle)
                })
                .collect()
        }
    }

    #[test]
    fn test_reload_unions_and_probes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("data/sdext2")).unwrap();
        let gateway = Arc::new(LocalGateway::rooted_at(dir.path().to_path_buf(), true));

        let data = DataArea::new(AreaType::Data, VirtualPath::local("/data"), UserHandle::SYSTEM);
        let ghost = DataArea::new(
            AreaType::DownloadCache,
            VirtualPath::local("/cache"),
            UserHandle::SYSTEM,
        );

        let manager = DataAreaManager::new(
            gateway,
            StorageEnvironment::default(),
            vec![
                Box::new(FixedModule(vec![data, ghost])),
                Box::new(DerivingModule),
            ],
        );

        assert_eq!(manager.current_areas().generation, 0);
        let snapshot = manager.reload();
        assert_eq!(snapshot.generation, 1);

        // the ghost /cache area fails the read probe and is gone
        let types: Vec<AreaType> = snapshot.areas.iter().map(|a| a.area_type).collect();
        assert_eq!(types, vec![AreaType::Data, AreaType::DataSdExt2]);

        // snapshot is replaced wholesale on the next reload
        let again = manager.reload();
        assert_eq!(again.generation, 2);
        assert_eq!(again.areas, snapshot.areas);
    }
}
