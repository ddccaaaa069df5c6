//! Desired-State Synthesizer: a pure fold from a validated [`RomulusConfig`]
//! into a [`State`], per `spec.md` §4.4.

use crate::config::{RoleConfig, RomulusConfig};
use crate::state::{
    Domain, DomainState, Network, NetworkMode, Pool, PoolType, State, Volume, VolumeFormat,
    VolumeProvenance,
};

/// A role's name and its singular form used in resource naming
/// (`masters` -> `master`, `workers` -> `worker`).
struct Role<'a> {
    singular: &'static str,
    config: &'a RoleConfig,
}

/// Expands `config` into the desired [`State`]: one Network, one Pool, the
/// base-image Volume, then per role and index a boot-disk and a cloud-init
/// Volume, then one Domain per (role, index). Deterministic: identical
/// input yields identical output, including collection order.
pub fn synthesize(config: &RomulusConfig) -> State {
    let network = synthesize_network(config);
    let pool = synthesize_pool(config);
    let base_volume_name = config.storage.base_image.name.clone();

    let roles = [
        Role {
            singular: "master",
            config: &config.nodes.masters,
        },
        Role {
            singular: "worker",
            config: &config.nodes.workers,
        },
    ];

    let mut volumes = vec![synthesize_base_volume(config)];
    let mut domains = Vec::new();

    for role in &roles {
        for i in 1..=role.config.effective_count() {
            let disk_name = format!("{}-{}-{}-disk", config.cluster.name, role.singular, i);
            let init_name = format!("{}-{}-{}-init.iso", config.cluster.name, role.singular, i);

            // `role.config.disk_size` has no home here: a boot disk is a
            // `Clone` of the base image, and `VolumeProvenance::Clone`
            // carries no size field — `virsh vol-clone` takes its size
            // from the source volume, not a caller-supplied value (see
            // DESIGN.md's synth.rs entry for the full resolution).
            volumes.push(Volume {
                name: disk_name.clone(),
                pool: config.storage.pool_name.clone(),
                format: VolumeFormat::Qcow2,
                provenance: VolumeProvenance::Clone {
                    base_volume: base_volume_name.clone(),
                },
            });
            volumes.push(Volume {
                name: init_name,
                pool: config.storage.pool_name.clone(),
                format: VolumeFormat::Raw,
                provenance: VolumeProvenance::CloudInit {
                    node_type: role.singular.to_string(),
                    node_index: i,
                },
            });

            domains.push(Domain {
                name: format!("{}-{}-{}", config.cluster.name, role.singular, i),
                memory_mib: role.config.memory,
                vcpu: role.config.vcpus,
                pool: config.storage.pool_name.clone(),
                network: network.name.clone(),
                disk_volume: disk_name,
                ip_address: Some(format!("{}{}", role.config.ip_prefix, i)),
                state: DomainState::Unknown,
            });
        }
    }

    State {
        networks: vec![network],
        pools: vec![pool],
        volumes,
        domains,
        discovered_at: None,
    }
}

fn synthesize_network(config: &RomulusConfig) -> Network {
    Network {
        name: config.network.name.clone(),
        mode: parse_network_mode(&config.network.mode),
        domain: config.cluster.domain.clone(),
        addresses: vec![config.network.cidr.clone()],
        dhcp: config.network.dhcp,
        dns: config.network.dns,
        active: true,
    }
}

fn parse_network_mode(mode: &str) -> NetworkMode {
    match mode {
        "route" => NetworkMode::Route,
        "bridge" => NetworkMode::Bridge,
        "isolated" => NetworkMode::Isolated,
        _ => NetworkMode::Nat,
    }
}

fn synthesize_pool(config: &RomulusConfig) -> Pool {
    let path = config
        .storage
        .pool_path
        .clone()
        .unwrap_or_else(|| format!("/var/lib/libvirt/images/{}", config.storage.pool_name).into());
    Pool {
        name: config.storage.pool_name.clone(),
        pool_type: PoolType::Dir,
        path: path.to_string(),
        active: true,
    }
}

fn synthesize_base_volume(config: &RomulusConfig) -> Volume {
    Volume {
        name: config.storage.base_image.name.clone(),
        pool: config.storage.pool_name.clone(),
        format: parse_volume_format(&config.storage.base_image.format),
        provenance: VolumeProvenance::Download {
            source: config.storage.base_image.url.clone(),
        },
    }
}

fn parse_volume_format(format: &str) -> VolumeFormat {
    match format {
        "raw" => VolumeFormat::Raw,
        _ => VolumeFormat::Qcow2,
    }
}
