//! End-to-end reconciliation scenarios against an in-memory hypervisor,
//! covering the seed scenarios of `spec.md` §8.

use romulus::adapter::MockAdapter;
use romulus::cloudinit::MockCloudInitGenerator;
use romulus::config::{
    BaseImageConfig, ClusterConfig, NetworkConfig, NodesConfig, RoleConfig, RomulusConfig,
    SshConfig, StorageConfig,
};
use romulus::exec::ExecutionMode;
use romulus::plan::ActionKind;
use romulus::state::ResourceKind;
use romulus::Reconciler;
use tokio_util::sync::CancellationToken;

fn config_with_workers(worker_count: u32) -> RomulusConfig {
    RomulusConfig {
        cluster: ClusterConfig {
            name: "romcluster".into(),
            domain: "romcluster.local".into(),
        },
        network: NetworkConfig {
            name: "romcluster-net".into(),
            mode: "nat".into(),
            cidr: "192.168.100.0/24".into(),
            dhcp: true,
            dns: true,
        },
        storage: StorageConfig {
            pool_name: "romcluster-pool".into(),
            pool_path: None,
            base_image: BaseImageConfig {
                name: "romcluster-base".into(),
                url: "https://example.com/base.qcow2".into(),
                format: "qcow2".into(),
            },
        },
        nodes: NodesConfig {
            masters: RoleConfig {
                count: Some(1),
                memory: 4096,
                vcpus: 2,
                disk_size: 20_480,
                ip_prefix: "192.168.100.1".into(),
            },
            workers: RoleConfig {
                count: Some(worker_count),
                memory: 2048,
                vcpus: 1,
                disk_size: 10_240,
                ip_prefix: "192.168.100.2".into(),
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
fn scenario_bootstrap_from_empty_creates_everything_and_converges() {
    let adapter = MockAdapter::new();
    let cloudinit = MockCloudInitGenerator::new();
    let reconciler = Reconciler::new(&adapter, &cloudinit);
    let config = config_with_workers(0);
    let cancel = CancellationToken::new();

    let summary = reconciler
        .reconcile(
            &config,
            &ExecutionMode::Serial { continue_on_error: false },
            false,
            &cancel,
        )
        .unwrap();
    assert_eq!(summary.failed, 0);
    assert!(summary.successful > 0);

    let actions = reconciler.plan(&config).unwrap();
    assert!(actions.is_empty(), "a converged run should plan no further changes");

    let snapshot = adapter.snapshot();
    assert_eq!(snapshot.pools.len(), 1);
    assert_eq!(snapshot.networks.len(), 1);
    assert_eq!(snapshot.domains.len(), 1);
    assert!(adapter.domain_created_with_iso("romcluster-master-1"));
}

#[test]
fn scenario_adding_one_worker_only_creates_the_new_worker_resources() {
    let adapter = MockAdapter::new();
    let cloudinit = MockCloudInitGenerator::new();
    let reconciler = Reconciler::new(&adapter, &cloudinit);
    let cancel = CancellationToken::new();

    reconciler
        .reconcile(
            &config_with_workers(0),
            &ExecutionMode::Serial { continue_on_error: false },
            false,
            &cancel,
        )
        .unwrap();

    let grown = config_with_workers(1);
    let actions = reconciler.plan(&grown).unwrap();
    assert!(actions.iter().all(|a| a.kind == ActionKind::Create));
    assert!(actions
        .iter()
        .any(|a| a.resource_kind == ResourceKind::Domain && a.resource.name() == "romcluster-worker-1"));
    // The base image, pool, and network already converged; only the new
    // worker's volumes/domain should appear.
    assert!(!actions
        .iter()
        .any(|a| a.resource_kind == ResourceKind::Pool || a.resource_kind == ResourceKind::Network));

    let summary = reconciler
        .reconcile(
            &grown,
            &ExecutionMode::Serial { continue_on_error: false },
            false,
            &cancel,
        )
        .unwrap();
    assert_eq!(summary.failed, 0);
    assert_eq!(reconciler.plan(&grown).unwrap().len(), 0);
}

#[test]
fn scenario_reapplying_converged_config_is_a_no_op() {
    let adapter = MockAdapter::new();
    let cloudinit = MockCloudInitGenerator::new();
    let reconciler = Reconciler::new(&adapter, &cloudinit);
    let config = config_with_workers(2);
    let cancel = CancellationToken::new();

    reconciler
        .reconcile(
            &config,
            &ExecutionMode::Serial { continue_on_error: false },
            false,
            &cancel,
        )
        .unwrap();

    let second_run = reconciler
        .reconcile(
            &config,
            &ExecutionMode::Serial { continue_on_error: false },
            false,
            &cancel,
        )
        .unwrap();
    assert_eq!(second_run.total, 0);
}

#[test]
fn scenario_destroy_everything_leaves_an_empty_discovered_state() {
    let adapter = MockAdapter::new();
    let cloudinit = MockCloudInitGenerator::new();
    let reconciler = Reconciler::new(&adapter, &cloudinit);
    let config = config_with_workers(1);
    let cancel = CancellationToken::new();

    reconciler
        .reconcile(
            &config,
            &ExecutionMode::Serial { continue_on_error: false },
            false,
            &cancel,
        )
        .unwrap();
    assert!(!adapter.snapshot().domains.is_empty());

    let summary = reconciler
        .destroy_all(
            &config,
            &ExecutionMode::Serial { continue_on_error: false },
            false,
            &cancel,
        )
        .unwrap();
    assert_eq!(summary.failed, 0);

    let snapshot = adapter.snapshot();
    assert!(snapshot.domains.is_empty());
    assert!(snapshot.volumes.is_empty());
    assert!(snapshot.networks.is_empty());
    assert!(snapshot.pools.is_empty());
}

#[test]
fn scenario_rollback_undoes_partial_progress_on_mid_run_failure() {
    use romulus::errors::HypervisorError;

    let adapter = MockAdapter::new();
    let cloudinit = MockCloudInitGenerator::new();
    // Fail the domain create so the pool/network/volumes that already
    // landed must be rolled back.
    adapter.rig_failure(
        ResourceKind::Domain,
        "romcluster-master-1",
        HypervisorError::CommandFailed {
            command: "virsh define".into(),
            exit_code: Some(1),
            output: "injected failure".into(),
        },
    );

    let reconciler = Reconciler::new(&adapter, &cloudinit);
    let cancel = CancellationToken::new();
    let summary = reconciler
        .reconcile(
            &config_with_workers(0),
            &ExecutionMode::Serial { continue_on_error: false },
            true,
            &cancel,
        )
        .unwrap();

    assert!(summary.failed > 0);
    assert!(summary.rollback_errors.is_empty());
    let snapshot = adapter.snapshot();
    assert!(
        snapshot.pools.is_empty() && snapshot.networks.is_empty() && snapshot.volumes.is_empty(),
        "rollback should have undone every resource created before the failure"
    );
}

#[test]
fn scenario_parallel_apply_converges_to_the_same_state_as_serial() {
    let adapter = MockAdapter::new();
    let cloudinit = MockCloudInitGenerator::new();
    let reconciler = Reconciler::new(&adapter, &cloudinit);
    let config = config_with_workers(2);
    let cancel = CancellationToken::new();

    let summary = reconciler
        .reconcile(&config, &ExecutionMode::Parallel, false, &cancel)
        .unwrap();
    assert_eq!(summary.failed, 0);
    assert!(reconciler.plan(&config).unwrap().is_empty());
}

#[test]
fn scenario_parallel_apply_halts_before_later_levels_on_a_level_failure() {
    use romulus::errors::HypervisorError;
    use romulus::state::ResourceKind;

    let adapter = MockAdapter::new();
    // The pool level (the first level Parallel mode dispatches) fails;
    // the network/volume/domain levels that depend on it must never run.
    adapter.rig_failure(
        ResourceKind::Pool,
        "romcluster-pool",
        HypervisorError::ConnectionFailed { detail: "injected failure".into() },
    );
    let cloudinit = MockCloudInitGenerator::new();
    let reconciler = Reconciler::new(&adapter, &cloudinit);
    let cancel = CancellationToken::new();

    let summary = reconciler
        .reconcile(&config_with_workers(0), &ExecutionMode::Parallel, false, &cancel)
        .unwrap();
    assert!(summary.failed > 0);

    let snapshot = adapter.snapshot();
    assert!(snapshot.pools.is_empty());
    assert!(snapshot.networks.is_empty(), "network level must not dispatch after the pool level failed");
    assert!(snapshot.volumes.is_empty(), "volume level must not dispatch after the pool level failed");
    assert!(snapshot.domains.is_empty(), "domain level must not dispatch after the pool level failed");
}
