//! An in-memory `HypervisorAdapter` for tests.
//!
//! Backs the scenario and concurrency tests in `spec.md` §8: it tracks a
//! `State` behind a mutex and can be configured to fail specific
//! `(kind, name)` operations, so tests can rig "the middle create fails"
//! scenarios deterministically without touching a real hypervisor.

use super::HypervisorAdapter;
use crate::errors::HypervisorError;
use crate::state::{Domain, DomainState, Network, Pool, ResourceKind, State, Volume};
use camino::Utf8Path;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A single rigged failure: the next matching operation on `(kind, name)`
/// returns this error instead of succeeding.
#[derive(Debug, Clone)]
pub struct RiggedFailure {
    pub kind: ResourceKind,
    pub name: String,
    pub error: HypervisorError,
}

#[derive(Debug, Default)]
struct MockInner {
    state: State,
    failures: Vec<RiggedFailure>,
    /// One-shot failures for `list_*` calls, keyed by kind.
    list_failures: HashMap<ResourceKind, HypervisorError>,
    /// Names for which `create_domain` was called along with a cloud-init ISO path.
    domain_creates_with_iso: HashSet<String>,
}

/// In-memory mock of the Hypervisor Adapter.
#[derive(Debug, Default)]
pub struct MockAdapter {
    inner: Mutex<MockInner>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the mock with an initial "current" state.
    pub fn with_state(state: State) -> Self {
        Self {
            inner: Mutex::new(MockInner {
                state,
                ..Default::default()
            }),
        }
    }

    /// Rig the next operation on `(kind, name)` to fail with `error`.
    pub fn rig_failure(&self, kind: ResourceKind, name: &str, error: HypervisorError) {
        self.inner.lock().unwrap().failures.push(RiggedFailure {
            kind,
            name: name.to_string(),
            error,
        });
    }

    /// Rig the next `list_*` call for `kind` to fail with `error`.
    pub fn rig_list_failure(&self, kind: ResourceKind, error: HypervisorError) {
        self.inner.lock().unwrap().list_failures.insert(kind, error);
    }

    /// Snapshot the mock's current state, e.g. to assert post-execution
    /// convergence in scenario tests.
    pub fn snapshot(&self) -> State {
        self.inner.lock().unwrap().state.clone()
    }

    pub fn domain_created_with_iso(&self, name: &str) -> bool {
        self.inner.lock().unwrap().domain_creates_with_iso.contains(name)
    }

    fn take_rigged(&self, kind: ResourceKind, name: &str) -> Option<HypervisorError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(pos) = inner
            .failures
            .iter()
            .position(|f| f.kind == kind && f.name == name)
        {
            Some(inner.failures.remove(pos).error)
        } else {
            None
        }
    }
}

impl MockAdapter {
    fn take_list_failure(&self, kind: ResourceKind) -> Option<HypervisorError> {
        self.inner.lock().unwrap().list_failures.remove(&kind)
    }
}

impl HypervisorAdapter for MockAdapter {
    fn list_networks(&self) -> Result<Vec<Network>, HypervisorError> {
        if let Some(e) = self.take_list_failure(ResourceKind::Network) {
            return Err(e);
        }
        Ok(self.inner.lock().unwrap().state.networks.clone())
    }

    fn list_pools(&self) -> Result<Vec<Pool>, HypervisorError> {
        if let Some(e) = self.take_list_failure(ResourceKind::Pool) {
            return Err(e);
        }
        Ok(self.inner.lock().unwrap().state.pools.clone())
    }

    fn list_domains(&self) -> Result<Vec<Domain>, HypervisorError> {
        if let Some(e) = self.take_list_failure(ResourceKind::Domain) {
            return Err(e);
        }
        Ok(self.inner.lock().unwrap().state.domains.clone())
    }

    fn list_volumes(&self, pool: &str) -> Result<Vec<Volume>, HypervisorError> {
        if let Some(e) = self.take_list_failure(ResourceKind::Volume) {
            return Err(e);
        }
        Ok(self
            .inner
            .lock()
            .unwrap()
            .state
            .volumes
            .iter()
            .filter(|v| v.pool == pool)
            .cloned()
            .collect())
    }

    fn create_network(&self, net: &Network) -> Result<(), HypervisorError> {
        if let Some(e) = self.take_rigged(ResourceKind::Network, &net.name) {
            return Err(e);
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.state.network(&net.name).is_some() {
            return Err(HypervisorError::ResourceExists {
                kind: ResourceKind::Network,
                name: net.name.clone(),
            });
        }
        let mut net = net.clone();
        net.active = true;
        inner.state.networks.push(net);
        Ok(())
    }

    fn create_pool(&self, pool: &Pool) -> Result<(), HypervisorError> {
        if let Some(e) = self.take_rigged(ResourceKind::Pool, &pool.name) {
            return Err(e);
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.state.pool(&pool.name).is_some() {
            return Err(HypervisorError::ResourceExists {
                kind: ResourceKind::Pool,
                name: pool.name.clone(),
            });
        }
        let mut pool = pool.clone();
        pool.active = true;
        inner.state.pools.push(pool);
        Ok(())
    }

    fn create_volume(&self, vol: &Volume) -> Result<(), HypervisorError> {
        if let Some(e) = self.take_rigged(ResourceKind::Volume, &vol.name) {
            return Err(e);
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.state.volume(&vol.name).is_some() {
            return Err(HypervisorError::ResourceExists {
                kind: ResourceKind::Volume,
                name: vol.name.clone(),
            });
        }
        inner.state.volumes.push(vol.clone());
        Ok(())
    }

    fn create_domain(
        &self,
        dom: &Domain,
        cloudinit_iso: Option<&Utf8Path>,
    ) -> Result<(), HypervisorError> {
        if let Some(e) = self.take_rigged(ResourceKind::Domain, &dom.name) {
            return Err(e);
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.state.domain(&dom.name).is_some() {
            return Err(HypervisorError::ResourceExists {
                kind: ResourceKind::Domain,
                name: dom.name.clone(),
            });
        }
        let mut dom = dom.clone();
        dom.state = DomainState::Running;
        inner.state.domains.push(dom);
        if cloudinit_iso.is_some() {
            let name = inner.state.domains.last().unwrap().name.clone();
            inner.domain_creates_with_iso.insert(name);
        }
        Ok(())
    }

    fn delete_network(&self, name: &str) -> Result<(), HypervisorError> {
        if let Some(e) = self.take_rigged(ResourceKind::Network, name) {
            return Err(e);
        }
        let mut inner = self.inner.lock().unwrap();
        let before = inner.state.networks.len();
        inner.state.networks.retain(|n| n.name != name);
        if inner.state.networks.len() == before {
            return Err(HypervisorError::ResourceNotFound {
                kind: ResourceKind::Network,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn delete_pool(&self, name: &str) -> Result<(), HypervisorError> {
        if let Some(e) = self.take_rigged(ResourceKind::Pool, name) {
            return Err(e);
        }
        let mut inner = self.inner.lock().unwrap();
        let before = inner.state.pools.len();
        inner.state.pools.retain(|p| p.name != name);
        if inner.state.pools.len() == before {
            return Err(HypervisorError::ResourceNotFound {
                kind: ResourceKind::Pool,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn delete_volume(&self, _pool: &str, name: &str) -> Result<(), HypervisorError> {
        if let Some(e) = self.take_rigged(ResourceKind::Volume, name) {
            return Err(e);
        }
        let mut inner = self.inner.lock().unwrap();
        let before = inner.state.volumes.len();
        inner.state.volumes.retain(|v| v.name != name);
        if inner.state.volumes.len() == before {
            return Err(HypervisorError::ResourceNotFound {
                kind: ResourceKind::Volume,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn delete_domain(&self, name: &str) -> Result<(), HypervisorError> {
        if let Some(e) = self.take_rigged(ResourceKind::Domain, name) {
            return Err(e);
        }
        let mut inner = self.inner.lock().unwrap();
        let before = inner.state.domains.len();
        inner.state.domains.retain(|d| d.name != name);
        if inner.state.domains.len() == before {
            return Err(HypervisorError::ResourceNotFound {
                kind: ResourceKind::Domain,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn exists(&self, kind: ResourceKind, name: &str) -> Result<bool, HypervisorError> {
        let inner = self.inner.lock().unwrap();
        Ok(match kind {
            ResourceKind::Network => inner.state.network(name).is_some(),
            ResourceKind::Pool => inner.state.pool(name).is_some(),
            ResourceKind::Volume => inner.state.volume(name).is_some(),
            ResourceKind::Domain => inner.state.domain(name).is_some(),
        })
    }

    fn domain_info(&self, name: &str) -> Result<HashMap<String, String>, HypervisorError> {
        let inner = self.inner.lock().unwrap();
        let dom = inner
            .state
            .domain(name)
            .ok_or_else(|| HypervisorError::ResourceNotFound {
                kind: ResourceKind::Domain,
                name: name.to_string(),
            })?;
        let mut map = HashMap::new();
        map.insert("Name".to_string(), dom.name.clone());
        map.insert("State".to_string(), format!("{:?}", dom.state));
        Ok(map)
    }
}
