//! Config Loader: locate, parse, merge env overrides onto, and validate
//! the `romulus.yaml` desired-state document.

mod loader;
mod merge;
mod model;

pub use loader::Loader;
pub use model::{
    BaseImageConfig, ClusterConfig, NetworkConfig, NodesConfig, RoleConfig, RomulusConfig,
    SshConfig, StorageConfig,
};
