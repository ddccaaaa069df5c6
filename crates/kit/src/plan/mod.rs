//! Diff current vs. desired state into an ordered, validated plan, per
//! `spec.md` §4.5. Pure: no I/O, only `PlanningError`.

mod stats;

pub use stats::PlanStats;

use crate::errors::PlanningError;
use crate::state::{Resource, ResourceKind, State};

/// `Update` is reserved for future use and is never emitted by [`plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Create,
    Update,
    Destroy,
}

/// One atomic plan step: a (kind, resource-kind, resource, reason) tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub resource_kind: ResourceKind,
    pub resource: Resource,
    pub reason: String,
}

impl Action {
    fn name(&self) -> &str {
        self.resource.name()
    }
}

/// Kind order within creates: dependencies before dependents.
fn create_rank(kind: ResourceKind) -> u8 {
    match kind {
        ResourceKind::Pool => 0,
        ResourceKind::Network => 1,
        ResourceKind::Volume => 2,
        ResourceKind::Domain => 3,
    }
}

/// Kind order within destroys: reverse-dependency order, per the
/// destroy-ordering resolution in `SPEC_FULL.md`'s Design Notes.
fn destroy_rank(kind: ResourceKind) -> u8 {
    match kind {
        ResourceKind::Domain => 0,
        ResourceKind::Volume => 1,
        ResourceKind::Network => 2,
        ResourceKind::Pool => 3,
    }
}

/// Diffs `current` against `desired` per kind and emits a create/destroy
/// plan, sorted per `spec.md` §4.5: creates before destroys, pool before
/// network before volume before domain within creates, and domain before
/// volume before network before pool within destroys.
pub fn plan(current: &State, desired: &State) -> Vec<Action> {
    let diff = current.diff(desired);
    let mut actions = Vec::new();

    for name in &diff.pools.added {
        let pool = desired.pool(name).expect("name came from desired diff");
        actions.push(Action {
            kind: ActionKind::Create,
            resource_kind: ResourceKind::Pool,
            resource: Resource::Pool(pool.clone()),
            reason: format!("pool '{name}' present in desired state, absent in current"),
        });
    }
    for name in &diff.pools.removed {
        let pool = current.pool(name).expect("name came from current diff");
        actions.push(Action {
            kind: ActionKind::Destroy,
            resource_kind: ResourceKind::Pool,
            resource: Resource::Pool(pool.clone()),
            reason: format!("pool '{name}' present in current state, absent in desired"),
        });
    }

    for name in &diff.networks.added {
        let net = desired.network(name).expect("name came from desired diff");
        actions.push(Action {
            kind: ActionKind::Create,
            resource_kind: ResourceKind::Network,
            resource: Resource::Network(net.clone()),
            reason: format!("network '{name}' present in desired state, absent in current"),
        });
    }
    for name in &diff.networks.removed {
        let net = current.network(name).expect("name came from current diff");
        actions.push(Action {
            kind: ActionKind::Destroy,
            resource_kind: ResourceKind::Network,
            resource: Resource::Network(net.clone()),
            reason: format!("network '{name}' present in current state, absent in desired"),
        });
    }

    for name in &diff.volumes.added {
        let vol = desired.volume(name).expect("name came from desired diff");
        actions.push(Action {
            kind: ActionKind::Create,
            resource_kind: ResourceKind::Volume,
            resource: Resource::Volume(vol.clone()),
            reason: format!("volume '{name}' present in desired state, absent in current"),
        });
    }
    for name in &diff.volumes.removed {
        let vol = current.volume(name).expect("name came from current diff");
        actions.push(Action {
            kind: ActionKind::Destroy,
            resource_kind: ResourceKind::Volume,
            resource: Resource::Volume(vol.clone()),
            reason: format!("volume '{name}' present in current state, absent in desired"),
        });
    }

    for name in &diff.domains.added {
        let dom = desired.domain(name).expect("name came from desired diff");
        actions.push(Action {
            kind: ActionKind::Create,
            resource_kind: ResourceKind::Domain,
            resource: Resource::Domain(dom.clone()),
            reason: format!("domain '{name}' present in desired state, absent in current"),
        });
    }
    for name in &diff.domains.removed {
        let dom = current.domain(name).expect("name came from current diff");
        actions.push(Action {
            kind: ActionKind::Destroy,
            resource_kind: ResourceKind::Domain,
            resource: Resource::Domain(dom.clone()),
            reason: format!("domain '{name}' present in current state, absent in desired"),
        });
    }

    sort_actions(&mut actions);
    actions
}

fn sort_actions(actions: &mut [Action]) {
    actions.sort_by_key(|a| match a.kind {
        ActionKind::Create => (0u8, create_rank(a.resource_kind)),
        ActionKind::Update => (1u8, 0),
        ActionKind::Destroy => (2u8, destroy_rank(a.resource_kind)),
    });
}

/// Drops `create`/`destroy` pairs that target the same `(kind, name)`,
/// then re-sorts the remainder per the ordering rules above.
pub fn optimize_plan(actions: Vec<Action>) -> Vec<Action> {
    let mut creates: Vec<Action> = Vec::new();
    let mut destroys: Vec<Action> = Vec::new();
    for action in actions {
        match action.kind {
            ActionKind::Create => creates.push(action),
            ActionKind::Destroy => destroys.push(action),
            ActionKind::Update => creates.push(action),
        }
    }

    let mut fused_destroy_idx = Vec::new();
    creates.retain(|create| {
        if let Some(pos) = destroys
            .iter()
            .enumerate()
            .position(|(i, d)| !fused_destroy_idx.contains(&i) && d.resource_kind == create.resource_kind && d.name() == create.name())
        {
            fused_destroy_idx.push(pos);
            false
        } else {
            true
        }
    });
    let mut remaining_destroys = Vec::new();
    for (i, d) in destroys.into_iter().enumerate() {
        if !fused_destroy_idx.contains(&i) {
            remaining_destroys.push(d);
        }
    }

    let mut result = creates;
    result.extend(remaining_destroys);
    sort_actions(&mut result);
    result
}

/// Rejects plans where a dependency's create doesn't precede its
/// dependent's create: any `create volume` before its pool's `create
/// pool` (when that pool is itself being created), or any `create
/// domain` before any `create volume`.
pub fn validate_plan(actions: &[Action]) -> Result<(), PlanningError> {
    use std::collections::HashSet;

    let pools_in_plan: HashSet<&str> = actions
        .iter()
        .filter(|a| a.kind == ActionKind::Create && a.resource_kind == ResourceKind::Pool)
        .map(Action::name)
        .collect();

    let mut created_pools: HashSet<&str> = HashSet::new();
    let mut seen_domain_create = false;

    for action in actions {
        if action.kind != ActionKind::Create {
            continue;
        }
        match action.resource_kind {
            ResourceKind::Pool => {
                created_pools.insert(action.name());
            }
            ResourceKind::Volume => {
                if let Resource::Volume(vol) = &action.resource {
                    if pools_in_plan.contains(vol.pool.as_str())
                        && !created_pools.contains(vol.pool.as_str())
                    {
                        return Err(PlanningError::DependencyViolation {
                            action: format!("create volume {}", vol.name),
                            dependency: format!("create pool {}", vol.pool),
                        });
                    }
                }
                if seen_domain_create {
                    return Err(PlanningError::DependencyViolation {
                        action: format!("create volume {}", action.name()),
                        dependency: "create domain".into(),
                    });
                }
            }
            ResourceKind::Domain => {
                seen_domain_create = true;
            }
            ResourceKind::Network => {}
        }
    }

    Ok(())
}
