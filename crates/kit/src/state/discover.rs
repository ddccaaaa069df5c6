//! Populate a `State` snapshot from the Hypervisor Adapter.

use super::model::State;
use crate::adapter::HypervisorAdapter;
use crate::errors::StateError;
use tracing::instrument;

/// Calls the Adapter for all four resource kinds, sequentially,
/// short-circuiting on the first failure.
pub struct Discoverer<'a> {
    adapter: &'a dyn HypervisorAdapter,
}

impl<'a> Discoverer<'a> {
    pub fn new(adapter: &'a dyn HypervisorAdapter) -> Self {
        Self { adapter }
    }

    #[instrument(skip(self))]
    pub fn discover(&self) -> Result<State, StateError> {
        let networks = self
            .adapter
            .list_networks()
            .map_err(|source| StateError::DiscoveryFailed { source })?;
        let pools = self
            .adapter
            .list_pools()
            .map_err(|source| StateError::DiscoveryFailed { source })?;

        let mut volumes = Vec::new();
        for pool in &pools {
            let vols = self
                .adapter
                .list_volumes(&pool.name)
                .map_err(|source| StateError::DiscoveryFailed { source })?;
            volumes.extend(vols);
        }

        let domains = self
            .adapter
            .list_domains()
            .map_err(|source| StateError::DiscoveryFailed { source })?;

        Ok(State {
            networks,
            pools,
            volumes,
            domains,
            discovered_at: Some(chrono::Utc::now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockAdapter;
    use crate::errors::HypervisorError;
    use crate::state::{Pool, PoolType, ResourceKind};

    #[test]
    fn discover_populates_all_kinds() {
        let mut seed = State::empty();
        seed.pools.push(Pool {
            name: "p".into(),
            pool_type: PoolType::Dir,
            path: "/var/lib/romulus/p".into(),
            active: true,
        });
        let mock = MockAdapter::with_state(seed);
        let discovered = Discoverer::new(&mock).discover().unwrap();
        assert_eq!(discovered.pools.len(), 1);
        assert!(discovered.discovered_at.is_some());
    }

    #[test]
    fn discover_short_circuits_on_first_failure() {
        let mock = MockAdapter::new();
        mock.rig_list_failure(
            ResourceKind::Network,
            HypervisorError::ConnectionFailed {
                detail: "refused".into(),
            },
        );
        let err = Discoverer::new(&mock).discover().unwrap_err();
        assert!(matches!(err, StateError::DiscoveryFailed { .. }));
    }
}
