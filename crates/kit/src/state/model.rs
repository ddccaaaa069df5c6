//! Canonical in-memory representation of the four resource kinds and their
//! referential invariants.
//!
//! Resources are stored in name-keyed, insertion-ordered maps (an
//! `IndexMap`-shaped discipline implemented here with a small `Vec` plus
//! linear name lookup, since the collections this engine deals with are
//! small per run and the insertion order itself is part of the plan's
//! output contract — see `crate::plan`).

use serde::{Deserialize, Serialize};

/// The four resource kinds this engine reconciles. Cloud-init ISO
/// generation is a side effect of a domain create, not a planned resource
/// kind of its own (see `spec.md` §9's design note), so it has no variant
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Pool,
    Network,
    Volume,
    Domain,
}

/// libvirt network forwarding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    Nat,
    Route,
    Bridge,
    Isolated,
}

/// A libvirt network, current or desired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub mode: NetworkMode,
    /// DNS suffix served to guests.
    pub domain: String,
    /// At least one CIDR; enforced by `State::validate`.
    pub addresses: Vec<String>,
    pub dhcp: bool,
    pub dns: bool,
    /// Observed only; desired-state networks are always considered active.
    pub active: bool,
}

/// libvirt storage pool type. Only `Dir` exists today; modeled as an enum
/// (rather than a bare string) so future pool types are a variant away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
    Dir,
}

/// A libvirt storage pool, current or desired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    pub pool_type: PoolType,
    pub path: String,
    pub active: bool,
}

/// Disk image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeFormat {
    Qcow2,
    Raw,
}

/// A volume's provenance is mutually exclusive by construction: a tagged
/// union rather than a bag of optional fields, per `spec.md` §9's design
/// note ("Do not collapse this into a bag of optional fields").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VolumeProvenance {
    /// Fresh allocation of the given size.
    Fresh { size_bytes: u64 },
    /// Clone of an existing volume in the same pool.
    Clone { base_volume: String },
    /// Downloaded from a URL.
    Download { source: String },
    /// Generated cloud-init ISO for one node.
    CloudInit { node_type: String, node_index: u32 },
}

/// A libvirt storage volume, current or desired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub pool: String,
    pub format: VolumeFormat,
    pub provenance: VolumeProvenance,
}

/// Observed domain power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainState {
    Running,
    Stopped,
    Paused,
    Unknown,
}

/// A libvirt domain (virtual machine), current or desired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub memory_mib: u64,
    pub vcpu: u32,
    pub pool: String,
    pub network: String,
    pub disk_volume: String,
    pub ip_address: Option<String>,
    /// Observed only; desired-state domains don't predict a state.
    pub state: DomainState,
}

/// Any one of the four resource kinds, used in Planner/Executor `Action`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resource {
    Pool(Pool),
    Network(Network),
    Volume(Volume),
    Domain(Domain),
}

impl Resource {
    pub fn name(&self) -> &str {
        match self {
            Resource::Pool(p) => &p.name,
            Resource::Network(n) => &n.name,
            Resource::Volume(v) => &v.name,
            Resource::Domain(d) => &d.name,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Pool(_) => ResourceKind::Pool,
            Resource::Network(_) => ResourceKind::Network,
            Resource::Volume(_) => ResourceKind::Volume,
            Resource::Domain(_) => ResourceKind::Domain,
        }
    }
}

/// The four ordered resource collections plus a discovery timestamp.
///
/// Collections preserve insertion order: the Synthesizer's output order is
/// part of its contract (`spec.md` §4.4), and tests compare plans
/// structurally after normalization, not after an incidental re-sort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub networks: Vec<Network>,
    pub pools: Vec<Pool>,
    pub volumes: Vec<Volume>,
    pub domains: Vec<Domain>,
    pub discovered_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl State {
    /// All four collections empty, no discovery timestamp.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn network(&self, name: &str) -> Option<&Network> {
        self.networks.iter().find(|n| n.name == name)
    }

    pub fn pool(&self, name: &str) -> Option<&Pool> {
        self.pools.iter().find(|p| p.name == name)
    }

    pub fn volume(&self, name: &str) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.name == name)
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Total resources of `kind`.
    pub fn total_of(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Network => self.networks.len(),
            ResourceKind::Pool => self.pools.len(),
            ResourceKind::Volume => self.volumes.len(),
            ResourceKind::Domain => self.domains.len(),
        }
    }

    /// "Active" resources of `kind`: Network/Pool by `active`, Domain by
    /// `state == running`. Volumes have no notion of active/inactive.
    pub fn active_of(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Network => self.networks.iter().filter(|n| n.active).count(),
            ResourceKind::Pool => self.pools.iter().filter(|p| p.active).count(),
            ResourceKind::Domain => self
                .domains
                .iter()
                .filter(|d| d.state == DomainState::Running)
                .count(),
            ResourceKind::Volume => 0,
        }
    }

    /// Enforce the referential and structural invariants of `spec.md` §3,
    /// returning the *first* violation found.
    pub fn validate(&self) -> Result<(), crate::errors::StateError> {
        use crate::errors::StateError;
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        for n in &self.networks {
            if !seen.insert(&n.name) {
                return Err(StateError::ValidationFailed {
                    kind: ResourceKind::Network,
                    name: n.name.clone(),
                    detail: "duplicate network name".into(),
                });
            }
            if n.addresses.is_empty() {
                return Err(StateError::ValidationFailed {
                    kind: ResourceKind::Network,
                    name: n.name.clone(),
                    detail: "network has no addresses".into(),
                });
            }
        }

        seen.clear();
        for p in &self.pools {
            if !seen.insert(&p.name) {
                return Err(StateError::ValidationFailed {
                    kind: ResourceKind::Pool,
                    name: p.name.clone(),
                    detail: "duplicate pool name".into(),
                });
            }
        }

        seen.clear();
        for v in &self.volumes {
            if !seen.insert(&v.name) {
                return Err(StateError::ValidationFailed {
                    kind: ResourceKind::Volume,
                    name: v.name.clone(),
                    detail: "duplicate volume name".into(),
                });
            }
            if self.pool(&v.pool).is_none() {
                return Err(StateError::ValidationFailed {
                    kind: ResourceKind::Volume,
                    name: v.name.clone(),
                    detail: format!("references unknown pool '{}'", v.pool),
                });
            }
            if let VolumeProvenance::Clone { base_volume } = &v.provenance {
                match self.volume(base_volume) {
                    None => {
                        return Err(StateError::ValidationFailed {
                            kind: ResourceKind::Volume,
                            name: v.name.clone(),
                            detail: format!("base_volume '{base_volume}' does not exist"),
                        });
                    }
                    Some(base) => {
                        if base.pool != v.pool {
                            return Err(StateError::ValidationFailed {
                                kind: ResourceKind::Volume,
                                name: v.name.clone(),
                                detail: format!(
                                    "base_volume '{base_volume}' is in a different pool"
                                ),
                            });
                        }
                        if matches!(base.provenance, VolumeProvenance::Clone { .. }) {
                            return Err(StateError::ValidationFailed {
                                kind: ResourceKind::Volume,
                                name: v.name.clone(),
                                detail: format!(
                                    "base_volume '{base_volume}' is itself a clone; base images must be terminal"
                                ),
                            });
                        }
                    }
                }
            }
        }

        seen.clear();
        for d in &self.domains {
            if !seen.insert(&d.name) {
                return Err(StateError::ValidationFailed {
                    kind: ResourceKind::Domain,
                    name: d.name.clone(),
                    detail: "duplicate domain name".into(),
                });
            }
            if self.network(&d.network).is_none() {
                return Err(StateError::ValidationFailed {
                    kind: ResourceKind::Domain,
                    name: d.name.clone(),
                    detail: format!("references unknown network '{}'", d.network),
                });
            }
            if self.pool(&d.pool).is_none() {
                return Err(StateError::ValidationFailed {
                    kind: ResourceKind::Domain,
                    name: d.name.clone(),
                    detail: format!("references unknown pool '{}'", d.pool),
                });
            }
            if self.volume(&d.disk_volume).is_none() {
                return Err(StateError::ValidationFailed {
                    kind: ResourceKind::Domain,
                    name: d.name.clone(),
                    detail: format!("references unknown disk volume '{}'", d.disk_volume),
                });
            }
        }

        Ok(())
    }

    /// Per-kind diffs between `self` (current) and `other` (desired).
    pub fn diff(&self, other: &State) -> StateDiff {
        StateDiff {
            networks: diff_names(
                self.networks.iter().map(|n| n.name.as_str()),
                other.networks.iter().map(|n| n.name.as_str()),
            ),
            pools: diff_names(
                self.pools.iter().map(|p| p.name.as_str()),
                other.pools.iter().map(|p| p.name.as_str()),
            ),
            volumes: diff_names(
                self.volumes.iter().map(|v| v.name.as_str()),
                other.volumes.iter().map(|v| v.name.as_str()),
            ),
            domains: diff_names(
                self.domains.iter().map(|d| d.name.as_str()),
                other.domains.iter().map(|d| d.name.as_str()),
            ),
        }
    }
}

/// Name-set diff for a single resource kind: `added` exist only in the
/// second set, `removed` only in the first, `common` in both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub common: Vec<String>,
}

impl NameDiff {
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.common.len()
    }
}

fn diff_names<'a>(
    current: impl Iterator<Item = &'a str>,
    desired: impl Iterator<Item = &'a str>,
) -> NameDiff {
    use std::collections::BTreeSet;
    let current: BTreeSet<&str> = current.collect();
    let desired: BTreeSet<&str> = desired.collect();

    NameDiff {
        added: desired.difference(&current).map(|s| s.to_string()).collect(),
        removed: current.difference(&desired).map(|s| s.to_string()).collect(),
        common: current
            .intersection(&desired)
            .map(|s| s.to_string())
            .collect(),
    }
}

/// Per-kind name diffs between two states, per `spec.md` §4.3.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiff {
    pub networks: NameDiff,
    pub pools: NameDiff,
    pub volumes: NameDiff,
    pub domains: NameDiff,
}

impl StateDiff {
    /// `true` if no resource of any kind was added, removed, or held in
    /// common — i.e. both input states were empty.
    pub fn is_empty(&self) -> bool {
        self.networks.total() == 0
            && self.pools.total() == 0
            && self.volumes.total() == 0
            && self.domains.total() == 0
    }

    /// `true` if nothing changed: no additions or removals in any kind.
    pub fn has_changes(&self) -> bool {
        !self.networks.added.is_empty()
            || !self.networks.removed.is_empty()
            || !self.pools.added.is_empty()
            || !self.pools.removed.is_empty()
            || !self.volumes.added.is_empty()
            || !self.volumes.removed.is_empty()
            || !self.domains.added.is_empty()
            || !self.domains.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(name: &str) -> Pool {
        Pool {
            name: name.to_string(),
            pool_type: PoolType::Dir,
            path: format!("/var/lib/romulus/{name}"),
            active: true,
        }
    }

    #[test]
    fn empty_state_has_nothing() {
        let s = State::empty();
        assert_eq!(s.total_of(ResourceKind::Pool), 0);
        assert_eq!(s.total_of(ResourceKind::Domain), 0);
    }

    #[test]
    fn diff_of_empty_with_empty_is_empty() {
        let a = State::empty();
        let b = State::empty();
        let d = a.diff(&b);
        assert!(d.is_empty());
        assert!(!d.has_changes());
    }

    #[test]
    fn diff_is_reflexive() {
        let mut s = State::empty();
        s.pools.push(pool("p"));
        let d = s.diff(&s.clone());
        assert!(!d.has_changes());
        assert_eq!(d.pools.common, vec!["p".to_string()]);
    }

    #[test]
    fn validate_rejects_dangling_pool_reference() {
        let mut s = State::empty();
        s.volumes.push(Volume {
            name: "v".into(),
            pool: "missing".into(),
            format: VolumeFormat::Qcow2,
            provenance: VolumeProvenance::Fresh { size_bytes: 1024 },
        });
        let err = s.validate().unwrap_err();
        assert!(matches!(err, crate::errors::StateError::ValidationFailed { .. }));
    }

    #[test]
    fn validate_rejects_transitive_clone_chain() {
        let mut s = State::empty();
        s.pools.push(pool("p"));
        s.volumes.push(Volume {
            name: "base".into(),
            pool: "p".into(),
            format: VolumeFormat::Qcow2,
            provenance: VolumeProvenance::Clone {
                base_volume: "grandparent".into(),
            },
        });
        s.volumes.push(Volume {
            name: "grandparent".into(),
            pool: "p".into(),
            format: VolumeFormat::Qcow2,
            provenance: VolumeProvenance::Fresh { size_bytes: 1024 },
        });
        s.volumes.push(Volume {
            name: "child".into(),
            pool: "p".into(),
            format: VolumeFormat::Qcow2,
            provenance: VolumeProvenance::Clone {
                base_volume: "base".into(),
            },
        });
        let err = s.validate().unwrap_err();
        assert!(matches!(err, crate::errors::StateError::ValidationFailed { .. }));
    }
}
