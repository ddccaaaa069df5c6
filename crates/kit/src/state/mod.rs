//! Canonical in-memory cluster state: the four resource kinds, their
//! invariants, and the discovery step that populates a snapshot from the
//! hypervisor.

mod discover;
mod model;

pub use discover::Discoverer;
pub use model::{
    Domain, DomainState, NameDiff, Network, NetworkMode, Pool, PoolType, Resource, ResourceKind,
    State, StateDiff, Volume, VolumeFormat, VolumeProvenance,
};
