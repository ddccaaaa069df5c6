//! Typed shape of the `romulus.yaml` document, per `spec.md` §4.2/§6.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Root document: `cluster`, `network`, `storage`, `nodes`, `ssh`, plus
/// pass-through `kubernetes`/`bootstrap` sections this engine doesn't
/// interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomulusConfig {
    pub cluster: ClusterConfig,
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub nodes: NodesConfig,
    pub ssh: SshConfig,
    #[serde(default)]
    pub kubernetes: Option<serde_json::Value>,
    #[serde(default)]
    pub bootstrap: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: String,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub mode: String,
    pub cidr: String,
    #[serde(default)]
    pub dhcp: bool,
    #[serde(default)]
    pub dns: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseImageConfig {
    pub name: String,
    pub url: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub pool_name: String,
    pub pool_path: Option<Utf8PathBuf>,
    pub base_image: BaseImageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    #[serde(default)]
    pub count: Option<u32>,
    pub memory: u64,
    pub vcpus: u32,
    pub disk_size: u64,
    pub ip_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodesConfig {
    pub masters: RoleConfig,
    pub workers: RoleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshConfig {
    pub public_key_path: Option<Utf8PathBuf>,
    #[serde(default)]
    pub private_key_path: Option<Utf8PathBuf>,
    pub user: String,
}

impl RoleConfig {
    /// `count` of 0 or absent both mean "no nodes of this role".
    pub fn effective_count(&self) -> u32 {
        self.count.unwrap_or(0)
    }
}
