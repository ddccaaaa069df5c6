//! Executor: drive a plan to a terminal state under one of three
//! scheduling modes, per `spec.md` §4.6.

mod ledger;

pub use ledger::{CompletedAction, RunLedger};

use crate::adapter::HypervisorAdapter;
use crate::cloudinit::CloudInitGenerator;
use crate::config::RomulusConfig;
use crate::errors::ExecutionError;
use crate::plan::{Action, ActionKind};
use crate::state::{Resource, ResourceKind};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// How a plan is driven to completion.
#[derive(Debug, Clone)]
pub enum ExecutionMode {
    Serial { continue_on_error: bool },
    Parallel,
    DryRun,
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    PartialSuccess,
    DryRunComplete,
    Cancelled,
    Failed,
}

/// Total/successful/failed/skipped counts, elapsed time, and the errors
/// encountered, per `spec.md` §4.6.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: ExecutionOutcome,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed: Duration,
    pub errors: Vec<ExecutionError>,
    pub rollback_errors: Vec<String>,
}

/// Drives a [`crate::plan::Action`] list to completion. Holds no
/// run-scoped mutable state beyond a per-call [`RunLedger`], so multiple
/// calls run disjointly with no shared mutation (`spec.md` §4.6's
/// 6-concurrent-executor property).
#[derive(Debug, Default)]
pub struct Executor {
    pub rollback_on_failure: bool,
}

impl Executor {
    pub fn new(rollback_on_failure: bool) -> Self {
        Self { rollback_on_failure }
    }

    /// Rejects a plan containing an Action with an unrecognized
    /// type/kind combination before any side effect, per `spec.md` §4.6.
    fn validate_preconditions(actions: &[Action]) -> Result<(), ExecutionError> {
        for action in actions {
            let resource_matches_kind = matches!(
                (&action.resource, action.resource_kind),
                (Resource::Pool(_), ResourceKind::Pool)
                    | (Resource::Network(_), ResourceKind::Network)
                    | (Resource::Volume(_), ResourceKind::Volume)
                    | (Resource::Domain(_), ResourceKind::Domain)
            );
            if !resource_matches_kind {
                return Err(ExecutionError::PreconditionFailed {
                    kind: action.resource_kind,
                    name: action.resource.name().to_string(),
                    detail: "action resource does not match its declared kind".into(),
                });
            }
        }
        Ok(())
    }

    /// Drives `plan` to completion under `mode`. Every Adapter call is
    /// synchronous, blocking I/O (a subprocess with its own timeout); the
    /// caller-supplied `cancel` token is only ever checked between
    /// actions/levels, never used to interrupt an in-flight call, per
    /// `spec.md` §5's "never forcibly kill an in-flight mutation" policy.
    #[instrument(skip_all)]
    pub fn run(
        &self,
        plan: &[Action],
        mode: &ExecutionMode,
        adapter: &(dyn HypervisorAdapter + Sync),
        cloudinit: &(dyn CloudInitGenerator + Sync),
        config: &RomulusConfig,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let start = Instant::now();

        if let Err(e) = Self::validate_preconditions(plan) {
            return RunSummary {
                outcome: ExecutionOutcome::Failed,
                total: plan.len(),
                successful: 0,
                failed: plan.len(),
                skipped: 0,
                elapsed: start.elapsed(),
                errors: vec![e],
                rollback_errors: vec![],
            };
        }

        match mode {
            ExecutionMode::DryRun => self.run_dry(plan, start),
            ExecutionMode::Serial { continue_on_error } => {
                self.run_serial(plan, *continue_on_error, adapter, cloudinit, config, cancel, start)
            }
            ExecutionMode::Parallel => self.run_parallel(plan, adapter, cloudinit, config, cancel, start),
        }
    }

    fn run_dry(&self, plan: &[Action], start: Instant) -> RunSummary {
        for action in plan {
            info!(kind = %action.resource_kind, name = action.resource.name(), action = ?action.kind, "dry run: would apply action");
        }
        RunSummary {
            outcome: ExecutionOutcome::DryRunComplete,
            total: plan.len(),
            successful: 0,
            failed: 0,
            skipped: plan.len(),
            elapsed: start.elapsed(),
            errors: vec![],
            rollback_errors: vec![],
        }
    }

    fn run_serial(
        &self,
        plan: &[Action],
        continue_on_error: bool,
        adapter: &(dyn HypervisorAdapter + Sync),
        cloudinit: &(dyn CloudInitGenerator + Sync),
        config: &RomulusConfig,
        cancel: &CancellationToken,
        start: Instant,
    ) -> RunSummary {
        let mut ledger = RunLedger::new();
        let mut errors = Vec::new();
        let mut skipped = 0;
        let mut stopped_early = false;

        for action in plan {
            if cancel.is_cancelled() {
                stopped_early = true;
                break;
            }
            match dispatch(action, adapter, cloudinit, config) {
                Ok(DispatchOutcome::Applied) => ledger.record(CompletedAction::from_action(action)),
                Ok(DispatchOutcome::Skipped) => skipped += 1,
                Err(e) => {
                    errors.push(e);
                    if !continue_on_error {
                        stopped_early = true;
                        break;
                    }
                }
            }
        }

        let rollback_errors = if !errors.is_empty() && self.rollback_on_failure {
            rollback(&ledger, adapter)
        } else {
            vec![]
        };

        let outcome = if cancel.is_cancelled() && stopped_early && errors.is_empty() {
            ExecutionOutcome::Cancelled
        } else if errors.is_empty() {
            ExecutionOutcome::Success
        } else if continue_on_error {
            ExecutionOutcome::PartialSuccess
        } else {
            ExecutionOutcome::Failed
        };

        RunSummary {
            outcome,
            total: plan.len(),
            successful: ledger.len(),
            failed: errors.len(),
            skipped,
            elapsed: start.elapsed(),
            errors,
            rollback_errors,
        }
    }

    /// Groups the plan into dependency levels and fans out one OS thread
    /// per action within a level via `std::thread::scope` (safely
    /// borrowing the non-`'static` Adapter/generator references, unlike
    /// a `tokio::task` spawn which would require `'static` bounds). A
    /// failure within a level waits for in-flight siblings, then stops;
    /// later levels never start.
    fn run_parallel(
        &self,
        plan: &[Action],
        adapter: &(dyn HypervisorAdapter + Sync),
        cloudinit: &(dyn CloudInitGenerator + Sync),
        config: &RomulusConfig,
        cancel: &CancellationToken,
        start: Instant,
    ) -> RunSummary {
        let levels = group_into_levels(plan);
        let mut ledger = RunLedger::new();
        let mut errors = Vec::new();
        let mut skipped = 0;
        let mut cancelled = false;

        for level in &levels {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let results: Mutex<Vec<(Action, Result<DispatchOutcome, ExecutionError>)>> =
                Mutex::new(Vec::with_capacity(level.len()));

            std::thread::scope(|scope| {
                for action in level {
                    scope.spawn(|| {
                        let outcome = dispatch(action, adapter, cloudinit, config);
                        results.lock().unwrap().push((action.clone(), outcome));
                    });
                }
            });

            let mut level_failed = false;
            for (action, result) in results.into_inner().unwrap() {
                match result {
                    Ok(DispatchOutcome::Applied) => ledger.record(CompletedAction::from_action(&action)),
                    Ok(DispatchOutcome::Skipped) => skipped += 1,
                    Err(e) => {
                        errors.push(e);
                        level_failed = true;
                    }
                }
            }

            if level_failed {
                break;
            }
        }

        let rollback_errors = if !errors.is_empty() && self.rollback_on_failure {
            rollback(&ledger, adapter)
        } else {
            vec![]
        };

        let outcome = if cancelled && errors.is_empty() {
            ExecutionOutcome::Cancelled
        } else if errors.is_empty() {
            ExecutionOutcome::Success
        } else {
            ExecutionOutcome::Failed
        };

        RunSummary {
            outcome,
            total: plan.len(),
            successful: ledger.len(),
            failed: errors.len(),
            skipped,
            elapsed: start.elapsed(),
            errors,
            rollback_errors,
        }
    }
}

/// Dependency level grouping for Parallel mode: all creates of one kind
/// share a level in pool -> network -> volume -> domain order, then all
/// destroys form one final level (`spec.md` §4.6).
fn group_into_levels(plan: &[Action]) -> Vec<Vec<Action>> {
    let kind_order = [
        ResourceKind::Pool,
        ResourceKind::Network,
        ResourceKind::Volume,
        ResourceKind::Domain,
    ];
    let mut levels: Vec<Vec<Action>> = kind_order
        .iter()
        .map(|kind| {
            plan.iter()
                .filter(|a| a.kind == ActionKind::Create && a.resource_kind == *kind)
                .cloned()
                .collect()
        })
        .collect();
    levels.retain(|level| !level.is_empty());

    let destroys: Vec<Action> = plan
        .iter()
        .filter(|a| a.kind == ActionKind::Destroy)
        .cloned()
        .collect();
    if !destroys.is_empty() {
        levels.push(destroys);
    }
    levels
}

enum DispatchOutcome {
    Applied,
    Skipped,
}

fn dispatch(
    action: &Action,
    adapter: &dyn HypervisorAdapter,
    cloudinit: &dyn CloudInitGenerator,
    config: &RomulusConfig,
) -> Result<DispatchOutcome, ExecutionError> {
    let kind = action.resource_kind;
    let name = action.resource.name().to_string();

    match (action.kind, &action.resource) {
        (ActionKind::Update, _) => {
            debug!(%kind, %name, "update action is a no-op, skipping");
            Ok(DispatchOutcome::Skipped)
        }
        (ActionKind::Create, Resource::Pool(pool)) => {
            reclassify_create(kind, &name, "create_pool", adapter, adapter.create_pool(pool))
        }
        (ActionKind::Create, Resource::Network(net)) => {
            reclassify_create(kind, &name, "create_network", adapter, adapter.create_network(net))
        }
        (ActionKind::Create, Resource::Volume(vol)) => {
            reclassify_create(kind, &name, "create_volume", adapter, adapter.create_volume(vol))
        }
        (ActionKind::Create, Resource::Domain(dom)) => {
            let req = crate::cloudinit::CloudInitRequest {
                node_type: infer_node_type(&dom.name),
                node_index: infer_node_index(&dom.name),
                hostname: dom.name.clone(),
                ip_address: dom.ip_address.clone(),
                network_cidr: config.network.cidr.clone(),
            };
            let iso_path = cloudinit.generate(&req, config).map_err(|e| ExecutionError::ActionFailed {
                kind,
                name: name.clone(),
                step: "cloudinit_generate".into(),
                source: crate::errors::HypervisorError::ConnectionFailed {
                    detail: e.to_string(),
                },
            })?;
            reclassify_create(
                kind,
                &name,
                "create_domain",
                adapter,
                adapter.create_domain(dom, Some(iso_path.as_path())),
            )
        }
        (ActionKind::Destroy, Resource::Pool(pool)) => {
            adapter
                .delete_pool(&pool.name)
                .map_err(|source| action_failed(kind, &name, "delete_pool", source))?;
            Ok(DispatchOutcome::Applied)
        }
        (ActionKind::Destroy, Resource::Network(net)) => {
            adapter
                .delete_network(&net.name)
                .map_err(|source| action_failed(kind, &name, "delete_network", source))?;
            Ok(DispatchOutcome::Applied)
        }
        (ActionKind::Destroy, Resource::Volume(vol)) => {
            adapter
                .delete_volume(&vol.pool, &vol.name)
                .map_err(|source| action_failed(kind, &name, "delete_volume", source))?;
            Ok(DispatchOutcome::Applied)
        }
        (ActionKind::Destroy, Resource::Domain(dom)) => {
            adapter
                .delete_domain(&dom.name)
                .map_err(|source| action_failed(kind, &name, "delete_domain", source))?;
            Ok(DispatchOutcome::Applied)
        }
    }
}

/// Applies `spec.md` §7's reclassification policy: a `create_*` call that
/// fails with `ResourceExists` is not necessarily a real failure — it may
/// mean a previous run already converged this resource. Confirm with a
/// follow-up `adapter.exists()` check before treating it as success.
fn reclassify_create(
    kind: ResourceKind,
    name: &str,
    step: &str,
    adapter: &dyn HypervisorAdapter,
    result: Result<(), crate::errors::HypervisorError>,
) -> Result<DispatchOutcome, ExecutionError> {
    use crate::errors::HypervisorError;

    match result {
        Ok(()) => Ok(DispatchOutcome::Applied),
        Err(HypervisorError::ResourceExists { .. }) => match adapter.exists(kind, name) {
            Ok(true) => {
                debug!(%kind, %name, "resource already exists, treating create as converged");
                Ok(DispatchOutcome::Skipped)
            }
            Ok(false) => Err(action_failed(
                kind,
                name,
                step,
                HypervisorError::ResourceExists {
                    kind,
                    name: name.to_string(),
                },
            )),
            Err(e) => Err(action_failed(kind, name, step, e)),
        },
        Err(e) => Err(action_failed(kind, name, step, e)),
    }
}

fn action_failed(
    kind: ResourceKind,
    name: &str,
    step: &str,
    source: crate::errors::HypervisorError,
) -> ExecutionError {
    ExecutionError::ActionFailed {
        kind,
        name: name.to_string(),
        step: step.to_string(),
        source,
    }
}

/// `<cluster>-<role>-<index>` -> role singular. Best-effort: falls back
/// to `"node"` if the name doesn't follow the synthesizer's convention
/// (e.g. a hand-built plan in a test).
fn infer_node_type(domain_name: &str) -> String {
    domain_name.rsplit('-').nth(1).unwrap_or("node").to_string()
}

fn infer_node_index(domain_name: &str) -> u32 {
    domain_name.rsplit('-').next().and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// Walks completed actions in reverse, issuing the inverse operation for
/// each. Rollback failures are collected and returned alongside (never
/// replacing) the primary error, per `spec.md` §4.6.
fn rollback(ledger: &RunLedger, adapter: &dyn HypervisorAdapter) -> Vec<String> {
    let mut errors = Vec::new();
    for completed in ledger.iter().rev() {
        let result = match (&completed.kind, &completed.resource) {
            (ActionKind::Create, Resource::Pool(p)) => adapter.delete_pool(&p.name),
            (ActionKind::Create, Resource::Network(n)) => adapter.delete_network(&n.name),
            (ActionKind::Create, Resource::Volume(v)) => adapter.delete_volume(&v.pool, &v.name),
            (ActionKind::Create, Resource::Domain(d)) => adapter.delete_domain(&d.name),
            (ActionKind::Destroy, Resource::Pool(p)) => adapter.create_pool(p),
            (ActionKind::Destroy, Resource::Network(n)) => adapter.create_network(n),
            (ActionKind::Destroy, Resource::Volume(v)) => adapter.create_volume(v),
            (ActionKind::Destroy, Resource::Domain(d)) => adapter.create_domain(d, None),
            (ActionKind::Update, _) => continue,
        };
        if let Err(e) = result {
            warn!(name = completed.resource.name(), error = %e, "rollback step failed");
            errors.push(format!("{}: {e}", completed.resource.name()));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockAdapter;
    use crate::cloudinit::MockCloudInitGenerator;
    use crate::config::{
        BaseImageConfig, ClusterConfig, NetworkConfig, NodesConfig, RoleConfig, SshConfig, StorageConfig,
    };
    use crate::state::{Pool, PoolType};

    fn sample_config() -> RomulusConfig {
        RomulusConfig {
            cluster: ClusterConfig {
                name: "c".into(),
                domain: "c.local".into(),
            },
            network: NetworkConfig {
                name: "c-net".into(),
                mode: "nat".into(),
                cidr: "10.0.0.0/24".into(),
                dhcp: true,
                dns: true,
            },
            storage: StorageConfig {
                pool_name: "c-pool".into(),
                pool_path: None,
                base_image: BaseImageConfig {
                    name: "c-base".into(),
                    url: "https://example.com/base.qcow2".into(),
                    format: "qcow2".into(),
                },
            },
            nodes: NodesConfig {
                masters: RoleConfig {
                    count: Some(1),
                    memory: 4096,
                    vcpus: 2,
                    disk_size: 1,
                    ip_prefix: "10.0.0.1".into(),
                },
                workers: RoleConfig {
                    count: Some(0),
                    memory: 4096,
                    vcpus: 2,
                    disk_size: 1,
                    ip_prefix: "10.0.0.2".into(),
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

    fn pool_action(kind: ActionKind, name: &str) -> Action {
        Action {
            kind,
            resource_kind: ResourceKind::Pool,
            resource: Resource::Pool(Pool {
                name: name.into(),
                pool_type: PoolType::Dir,
                path: "/tmp".into(),
                active: true,
            }),
            reason: "test".into(),
        }
    }

    #[test]
    fn dry_run_issues_no_adapter_calls() {
        let executor = Executor::new(false);
        let adapter = MockAdapter::new();
        let cloudinit = MockCloudInitGenerator::new();
        let config = sample_config();
        let cancel = CancellationToken::new();
        let actions = vec![pool_action(ActionKind::Create, "p")];

        let summary = executor.run(&actions, &ExecutionMode::DryRun, &adapter, &cloudinit, &config, &cancel);
        assert_eq!(summary.outcome, ExecutionOutcome::DryRunComplete);
        assert!(adapter.snapshot().pools.is_empty());
    }

    #[test]
    fn serial_run_applies_create_actions() {
        let executor = Executor::new(false);
        let adapter = MockAdapter::new();
        let cloudinit = MockCloudInitGenerator::new();
        let config = sample_config();
        let cancel = CancellationToken::new();
        let actions = vec![pool_action(ActionKind::Create, "p")];

        let summary = executor.run(
            &actions,
            &ExecutionMode::Serial { continue_on_error: false },
            &adapter,
            &cloudinit,
            &config,
            &cancel,
        );
        assert_eq!(summary.outcome, ExecutionOutcome::Success);
        assert_eq!(summary.successful, 1);
        assert!(adapter.snapshot().pool("p").is_some());
    }

    #[test]
    fn serial_run_stops_on_first_failure_without_continue_on_error() {
        let executor = Executor::new(false);
        let adapter = MockAdapter::new();
        adapter.rig_failure(
            ResourceKind::Pool,
            "p1",
            crate::errors::HypervisorError::ConnectionFailed { detail: "boom".into() },
        );
        let cloudinit = MockCloudInitGenerator::new();
        let config = sample_config();
        let cancel = CancellationToken::new();
        let actions = vec![
            pool_action(ActionKind::Create, "p1"),
            pool_action(ActionKind::Create, "p2"),
        ];

        let summary = executor.run(
            &actions,
            &ExecutionMode::Serial { continue_on_error: false },
            &adapter,
            &cloudinit,
            &config,
            &cancel,
        );
        assert_eq!(summary.outcome, ExecutionOutcome::Failed);
        assert_eq!(summary.failed, 1);
        assert!(adapter.snapshot().pool("p2").is_none());
    }

    #[test]
    fn serial_run_continues_on_error_yields_partial_success() {
        let executor = Executor::new(false);
        let adapter = MockAdapter::new();
        adapter.rig_failure(
            ResourceKind::Pool,
            "p1",
            crate::errors::HypervisorError::ConnectionFailed { detail: "boom".into() },
        );
        let cloudinit = MockCloudInitGenerator::new();
        let config = sample_config();
        let cancel = CancellationToken::new();
        let actions = vec![
            pool_action(ActionKind::Create, "p1"),
            pool_action(ActionKind::Create, "p2"),
        ];

        let summary = executor.run(
            &actions,
            &ExecutionMode::Serial { continue_on_error: true },
            &adapter,
            &cloudinit,
            &config,
            &cancel,
        );
        assert_eq!(summary.outcome, ExecutionOutcome::PartialSuccess);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert!(adapter.snapshot().pool("p2").is_some());
    }

    #[test]
    fn rollback_deletes_completed_creates_after_a_later_failure() {
        let executor = Executor::new(true);
        let adapter = MockAdapter::new();
        adapter.rig_failure(
            ResourceKind::Pool,
            "p2",
            crate::errors::HypervisorError::ConnectionFailed { detail: "boom".into() },
        );
        let cloudinit = MockCloudInitGenerator::new();
        let config = sample_config();
        let cancel = CancellationToken::new();
        let actions = vec![
            pool_action(ActionKind::Create, "p1"),
            pool_action(ActionKind::Create, "p2"),
        ];

        let summary = executor.run(
            &actions,
            &ExecutionMode::Serial { continue_on_error: false },
            &adapter,
            &cloudinit,
            &config,
            &cancel,
        );
        assert_eq!(summary.outcome, ExecutionOutcome::Failed);
        assert!(adapter.snapshot().pool("p1").is_none());
    }

    fn network_action(kind: ActionKind, name: &str) -> Action {
        use crate::state::{Network, NetworkMode};
        Action {
            kind,
            resource_kind: ResourceKind::Network,
            resource: Resource::Network(Network {
                name: name.into(),
                mode: NetworkMode::Nat,
                domain: "test.local".into(),
                addresses: vec!["10.0.0.0/24".into()],
                dhcp: true,
                dns: true,
                active: false,
            }),
            reason: "test".into(),
        }
    }

    #[test]
    fn parallel_run_stops_before_later_levels_on_a_level_failure() {
        let executor = Executor::new(false);
        let adapter = MockAdapter::new();
        adapter.rig_failure(
            ResourceKind::Pool,
            "p1",
            crate::errors::HypervisorError::ConnectionFailed { detail: "boom".into() },
        );
        let cloudinit = MockCloudInitGenerator::new();
        let config = sample_config();
        let cancel = CancellationToken::new();
        // Pool and Network land in separate levels (pool before network);
        // the pool level's failure must stop the run before network ever
        // dispatches.
        let actions = vec![
            pool_action(ActionKind::Create, "p1"),
            network_action(ActionKind::Create, "n1"),
        ];

        let summary = executor.run(&actions, &ExecutionMode::Parallel, &adapter, &cloudinit, &config, &cancel);
        assert_eq!(summary.outcome, ExecutionOutcome::Failed);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.successful, 0);
        assert!(adapter.snapshot().network("n1").is_none());
    }

    #[test]
    fn parallel_run_applies_all_creates_in_a_level() {
        let executor = Executor::new(false);
        let adapter = MockAdapter::new();
        let cloudinit = MockCloudInitGenerator::new();
        let config = sample_config();
        let cancel = CancellationToken::new();
        let actions = vec![
            pool_action(ActionKind::Create, "p1"),
            pool_action(ActionKind::Create, "p2"),
            pool_action(ActionKind::Create, "p3"),
        ];

        let summary = executor.run(&actions, &ExecutionMode::Parallel, &adapter, &cloudinit, &config, &cancel);
        assert_eq!(summary.outcome, ExecutionOutcome::Success);
        assert_eq!(summary.successful, 3);
        let snapshot = adapter.snapshot();
        assert!(snapshot.pool("p1").is_some());
        assert!(snapshot.pool("p2").is_some());
        assert!(snapshot.pool("p3").is_some());
    }

    #[test]
    fn six_concurrent_executors_on_the_same_dry_run_plan_all_succeed() {
        let config = sample_config();
        let actions = vec![pool_action(ActionKind::Create, "p")];

        std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for _ in 0..6 {
                let actions = actions.clone();
                let config = config.clone();
                handles.push(scope.spawn(|| {
                    let executor = Executor::new(false);
                    let adapter = MockAdapter::new();
                    let cloudinit = MockCloudInitGenerator::new();
                    let cancel = CancellationToken::new();
                    executor.run(&actions, &ExecutionMode::DryRun, &adapter, &cloudinit, &config, &cancel)
                }));
            }
            for handle in handles {
                let summary = handle.join().unwrap();
                assert_eq!(summary.outcome, ExecutionOutcome::DryRunComplete);
            }
        });
    }
}
