//! `romulus`: a declarative libvirt/KVM reconciliation engine.
//!
//! Discovers the current state of a libvirt connection, synthesizes the
//! desired state from a config document, diffs the two into an ordered
//! plan, and drives the plan to completion through a pluggable
//! Hypervisor Adapter. See `SPEC_FULL.md` for the full component
//! breakdown; this crate root only wires the pieces together.

pub mod adapter;
pub mod cloudinit;
pub mod config;
pub mod errors;
pub mod exec;
pub mod plan;
pub mod state;
pub mod synth;

pub use errors::ReconcileError;

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Runs one full reconciliation: discover, synthesize, plan, execute.
///
/// This is the library-level equivalent of what the `romulus` binary's
/// `apply` subcommand drives; exposed here so embedders don't have to
/// reimplement the control flow from `spec.md` §2.
pub struct Reconciler<'a> {
    adapter: &'a (dyn adapter::HypervisorAdapter + Sync),
    cloudinit: &'a (dyn cloudinit::CloudInitGenerator + Sync),
}

impl<'a> Reconciler<'a> {
    pub fn new(
        adapter: &'a (dyn adapter::HypervisorAdapter + Sync),
        cloudinit: &'a (dyn cloudinit::CloudInitGenerator + Sync),
    ) -> Self {
        Self { adapter, cloudinit }
    }

    /// Discovers current state, synthesizes desired state from `config`,
    /// and returns the validated plan without executing it.
    pub fn plan(&self, config: &config::RomulusConfig) -> Result<Vec<plan::Action>> {
        let current = state::Discoverer::new(self.adapter).discover()?;
        current.validate()?;

        let desired = synth::synthesize(config);
        desired.validate()?;

        let actions = plan::optimize_plan(plan::plan(&current, &desired));
        plan::validate_plan(&actions)?;
        Ok(actions)
    }

    /// Plans, then drives the plan to completion under `mode`.
    pub fn reconcile(
        &self,
        config: &config::RomulusConfig,
        mode: &exec::ExecutionMode,
        rollback_on_failure: bool,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<exec::RunSummary> {
        let actions = self.plan(config)?;
        let executor = exec::Executor::new(rollback_on_failure);
        Ok(executor.run(&actions, mode, self.adapter, self.cloudinit, config, cancel))
    }

    /// Plans against an empty desired state (scenario 4 of `spec.md` §8:
    /// destroy everything), then drives that plan to completion.
    pub fn destroy_all(
        &self,
        config: &config::RomulusConfig,
        mode: &exec::ExecutionMode,
        rollback_on_failure: bool,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<exec::RunSummary> {
        let current = state::Discoverer::new(self.adapter).discover()?;
        current.validate()?;
        let actions = plan::optimize_plan(plan::plan(&current, &state::State::empty()));
        plan::validate_plan(&actions)?;
        let executor = exec::Executor::new(rollback_on_failure);
        Ok(executor.run(&actions, mode, self.adapter, self.cloudinit, config, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudinit::MockCloudInitGenerator;
    use crate::config::{
        BaseImageConfig, ClusterConfig, NetworkConfig, NodesConfig, RoleConfig, RomulusConfig,
        SshConfig, StorageConfig,
    };
    use adapter::MockAdapter;

    fn sample_config() -> RomulusConfig {
        RomulusConfig {
            cluster: ClusterConfig {
                name: "demo".into(),
                domain: "demo.local".into(),
            },
            network: NetworkConfig {
                name: "demo-net".into(),
                mode: "nat".into(),
                cidr: "10.10.0.0/24".into(),
                dhcp: true,
                dns: true,
            },
            storage: StorageConfig {
                pool_name: "demo-pool".into(),
                pool_path: None,
                base_image: BaseImageConfig {
                    name: "demo-base".into(),
                    url: "https://example.com/base.qcow2".into(),
                    format: "qcow2".into(),
                },
            },
            nodes: NodesConfig {
                masters: RoleConfig {
                    count: Some(1),
                    memory: 2048,
                    vcpus: 1,
                    disk_size: 1024,
                    ip_prefix: "10.10.0.1".into(),
                },
                workers: RoleConfig {
                    count: Some(0),
                    memory: 2048,
                    vcpus: 1,
                    disk_size: 1024,
                    ip_prefix: "10.10.0.2".into(),
                },
            },
            ssh: SshConfig {
                public_key_path: None,
                private_key_path: None,
                user: "core".into(),
            },
            kubernetes: None,
            bootstrap: None,
        }
    }

    #[test]
    fn bootstrap_plan_creates_everything_from_empty() {
        let adapter = MockAdapter::new();
        let cloudinit = MockCloudInitGenerator::new();
        let reconciler = Reconciler::new(&adapter, &cloudinit);
        let actions = reconciler.plan(&sample_config()).unwrap();
        assert!(!actions.is_empty());
        assert!(actions.iter().all(|a| a.kind == plan::ActionKind::Create));
    }

    #[test]
    fn reapplying_an_already_converged_state_yields_no_changes() {
        let adapter = MockAdapter::new();
        let cloudinit = MockCloudInitGenerator::new();
        let reconciler = Reconciler::new(&adapter, &cloudinit);
        let config = sample_config();

        let cancel = tokio_util::sync::CancellationToken::new();
        reconciler
            .reconcile(&config, &exec::ExecutionMode::Serial { continue_on_error: false }, false, &cancel)
            .unwrap();

        let actions = reconciler.plan(&config).unwrap();
        assert!(actions.is_empty());
    }
}
