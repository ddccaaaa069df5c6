//! The Hypervisor Adapter: a thin RPC-style boundary between the engine
//! and libvirt.
//!
//! Modeled as a trait so a mock implementation is substitutable in tests,
//! the way the teacher repository swaps between the `virt` crate's
//! `Connect` and direct `virsh` subprocess calls depending on context
//! (`libvirt.rs`). The default realization (`VirshAdapter`) shells out to
//! `virsh`/`genisoimage`/`wget`.

pub mod mock;
pub mod tempfiles;
pub mod virsh;
pub mod xml;

use crate::errors::HypervisorError;
use crate::state::{Domain, Network, Pool, ResourceKind, Volume};
use camino::Utf8Path;
use std::collections::HashMap;
use std::time::Duration;

pub use mock::MockAdapter;
pub use virsh::VirshAdapter;

/// Default per-call timeout for most Adapter operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for `download` volume provenance, which fetches over the network.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// The capability abstraction through which the engine talks to the
/// hypervisor. Every operation is a potential subprocess spawn bounded by
/// a timeout (`spec.md` §4.1); implementations must never silently hang.
pub trait HypervisorAdapter: Send + Sync {
    fn list_networks(&self) -> Result<Vec<Network>, HypervisorError>;
    fn list_pools(&self) -> Result<Vec<Pool>, HypervisorError>;
    fn list_domains(&self) -> Result<Vec<Domain>, HypervisorError>;
    fn list_volumes(&self, pool: &str) -> Result<Vec<Volume>, HypervisorError>;

    fn create_network(&self, net: &Network) -> Result<(), HypervisorError>;
    fn create_pool(&self, pool: &Pool) -> Result<(), HypervisorError>;
    fn create_volume(&self, vol: &Volume) -> Result<(), HypervisorError>;
    /// `cloudinit_iso` is `Some` whenever the domain's disk setup requires
    /// attaching a cloud-init ISO (i.e. always, for domains synthesized by
    /// this engine); `None` is accepted for adapters used outside that
    /// context.
    fn create_domain(
        &self,
        dom: &Domain,
        cloudinit_iso: Option<&Utf8Path>,
    ) -> Result<(), HypervisorError>;

    fn delete_network(&self, name: &str) -> Result<(), HypervisorError>;
    fn delete_pool(&self, name: &str) -> Result<(), HypervisorError>;
    fn delete_volume(&self, pool: &str, name: &str) -> Result<(), HypervisorError>;
    fn delete_domain(&self, name: &str) -> Result<(), HypervisorError>;

    fn exists(&self, kind: ResourceKind, name: &str) -> Result<bool, HypervisorError>;
    fn domain_info(&self, name: &str) -> Result<HashMap<String, String>, HypervisorError>;
}
