//! Summary statistics over a plan: counts and an estimated wall-clock
//! duration, per `spec.md` §4.5.

use super::{Action, ActionKind};
use crate::state::ResourceKind;
use std::collections::HashMap;
use std::time::Duration;

/// Illustrative per-kind duration constants for a single action of that
/// kind, used only to produce an estimate — not a measured value.
fn per_action_estimate(kind: ResourceKind) -> Duration {
    match kind {
        ResourceKind::Pool => Duration::from_secs(60),
        ResourceKind::Network => Duration::from_secs(60),
        ResourceKind::Volume => Duration::from_secs(5 * 60),
        ResourceKind::Domain => Duration::from_secs(3 * 60),
    }
}

/// Discount applied to the serial sum to approximate the benefit of
/// parallel execution within a level.
const PARALLELISM_DISCOUNT: f64 = 0.6;

/// Total actions, counts by kind and action type, and an estimated
/// duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanStats {
    pub total: usize,
    pub creates: usize,
    pub destroys: usize,
    pub by_kind: HashMap<ResourceKind, usize>,
    pub estimated_duration: Duration,
}

impl PlanStats {
    pub fn compute(actions: &[Action]) -> Self {
        let mut stats = PlanStats {
            total: actions.len(),
            ..Default::default()
        };

        let mut serial_estimate = Duration::ZERO;
        for action in actions {
            match action.kind {
                ActionKind::Create => stats.creates += 1,
                ActionKind::Destroy => stats.destroys += 1,
                ActionKind::Update => {}
            }
            *stats.by_kind.entry(action.resource_kind).or_insert(0) += 1;
            serial_estimate += per_action_estimate(action.resource_kind);
        }

        let discounted_secs = serial_estimate.as_secs_f64() * PARALLELISM_DISCOUNT;
        let floor = Duration::from_secs(60);
        stats.estimated_duration = if actions.is_empty() {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(discounted_secs).max(floor)
        };

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Pool, PoolType, Resource};

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
    fn empty_plan_has_zero_duration() {
        let stats = PlanStats::compute(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.estimated_duration, Duration::ZERO);
    }

    #[test]
    fn single_action_hits_the_one_minute_floor() {
        let stats = PlanStats::compute(&[pool_action(ActionKind::Create, "p")]);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.creates, 1);
        assert_eq!(stats.estimated_duration, Duration::from_secs(60));
    }

    #[test]
    fn counts_by_kind_and_action_type() {
        let actions = vec![
            pool_action(ActionKind::Create, "p1"),
            pool_action(ActionKind::Create, "p2"),
            pool_action(ActionKind::Destroy, "p3"),
        ];
        let stats = PlanStats::compute(&actions);
        assert_eq!(stats.creates, 2);
        assert_eq!(stats.destroys, 1);
        assert_eq!(stats.by_kind[&ResourceKind::Pool], 3);
    }
}
