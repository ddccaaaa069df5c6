//! Locate, parse, and validate the `romulus.yaml` desired-state document,
//! per `spec.md` §4.2: file lookup order, environment overrides, and
//! tilde expansion for path fields.

use super::merge::merge_yaml;
use super::model::RomulusConfig;
use crate::errors::ConfigError;
use camino::Utf8PathBuf;
use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

/// Environment variables recognized as scalar overrides, and the
/// dotted config path each one replaces.
const ENV_OVERRIDES: &[(&str, &[&str])] = &[
    ("CLUSTER_NAME", &["cluster", "name"]),
    ("NETWORK_CIDR", &["network", "cidr"]),
    ("MASTER_COUNT", &["nodes", "masters", "count"]),
    ("WORKER_MEMORY", &["nodes", "workers", "memory"]),
];

/// Candidate paths searched, in order, when no explicit path is given,
/// per `spec.md` §6. First hit wins.
fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    if let Some(p) = explicit {
        return vec![p.to_path_buf()];
    }
    let mut candidates = vec![
        PathBuf::from("romulus.yaml"),
        PathBuf::from("romulus.yml"),
        PathBuf::from("config/romulus.yaml"),
        PathBuf::from("config/romulus.yml"),
    ];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".romulus/config.yaml"));
        candidates.push(home.join(".romulus/config.yml"));
    }
    candidates.push(PathBuf::from("/etc/romulus/config.yaml"));
    candidates.push(PathBuf::from("/etc/romulus/config.yml"));
    candidates
}

/// Loads, merges environment overrides onto, and validates a config document.
pub struct Loader {
    explicit_path: Option<PathBuf>,
}

impl Loader {
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self { explicit_path }
    }

    #[instrument(skip(self))]
    pub fn load(&self) -> Result<RomulusConfig, ConfigError> {
        let candidates = candidate_paths(self.explicit_path.as_deref());
        let mut found = None;
        for path in &candidates {
            if path.is_file() {
                found = Some(path.clone());
                break;
            }
        }
        let path = found.ok_or_else(|| ConfigError::FileNotFound {
            searched: candidates.clone(),
        })?;

        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::ParseFailed {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        let mut value: serde_yaml::Value =
            serde_yaml::from_str(&raw).map_err(|e| ConfigError::ParseFailed {
                path: path.clone(),
                detail: e.to_string(),
            })?;

        apply_env_overrides(&mut value);

        // A structurally valid YAML document missing a required key is a
        // validation failure, not a parse failure (spec.md §6) — the
        // document parsed fine at line 71, this step only fails on
        // missing/mistyped fields.
        let mut config: RomulusConfig =
            serde_yaml::from_value(value).map_err(|e| ConfigError::ValidationFailed {
                detail: e.to_string(),
            })?;

        expand_paths(&mut config);
        validate(&config)?;
        Ok(config)
    }
}

fn apply_env_overrides(value: &mut serde_yaml::Value) {
    for (var, path) in ENV_OVERRIDES {
        let Ok(raw) = std::env::var(var) else {
            continue;
        };
        let scalar = match parse_override_scalar(&raw) {
            Some(v) => v,
            None => {
                warn!(var, raw, "env override is not valid YAML scalar, ignoring");
                continue;
            }
        };
        let overlay = nest(path, scalar);
        merge_yaml(value, overlay);
    }
}

/// Parses an override's raw string as a YAML scalar. Unparseable numeric
/// overrides (e.g. `MASTER_COUNT=abc`) are silently dropped by the caller,
/// which logs the warning.
fn parse_override_scalar(raw: &str) -> Option<serde_yaml::Value> {
    serde_yaml::from_str(raw).ok()
}

fn nest(path: &[&str], leaf: serde_yaml::Value) -> serde_yaml::Value {
    let mut value = leaf;
    for key in path.iter().rev() {
        let mut map = serde_yaml::Mapping::new();
        map.insert(serde_yaml::Value::String(key.to_string()), value);
        value = serde_yaml::Value::Mapping(map);
    }
    value
}

/// Expands a leading `~` in path-valued config fields via `dirs::home_dir()`.
fn expand_paths(config: &mut RomulusConfig) {
    if let Some(p) = &config.ssh.public_key_path {
        config.ssh.public_key_path = Some(expand_tilde(p));
    }
    if let Some(p) = &config.ssh.private_key_path {
        config.ssh.private_key_path = Some(expand_tilde(p));
    }
    if let Some(p) = &config.storage.pool_path {
        config.storage.pool_path = Some(expand_tilde(p));
    }
}

fn expand_tilde(path: &Utf8PathBuf) -> Utf8PathBuf {
    let Some(rest) = path.as_str().strip_prefix("~/") else {
        return path.clone();
    };
    match dirs::home_dir() {
        Some(home) => match Utf8PathBuf::from_path_buf(home) {
            Ok(home) => home.join(rest),
            Err(_) => path.clone(),
        },
        None => path.clone(),
    }
}

/// `a.b.c.d/prefix`, IPv4 only (this engine only ever generates IPv4
/// guest networks).
fn is_valid_cidr(cidr: &str) -> bool {
    let Some((addr, prefix)) = cidr.split_once('/') else {
        return false;
    };
    if addr.parse::<std::net::Ipv4Addr>().is_err() {
        return false;
    }
    matches!(prefix.parse::<u8>(), Ok(0..=32))
}

fn validate(config: &RomulusConfig) -> Result<(), ConfigError> {
    if config.cluster.name.trim().is_empty() {
        return Err(ConfigError::ValidationFailed {
            detail: "cluster.name must not be empty".into(),
        });
    }
    if !is_valid_cidr(&config.network.cidr) {
        return Err(ConfigError::ValidationFailed {
            detail: format!("network.cidr {:?} is not a valid CIDR", config.network.cidr),
        });
    }
    if config.nodes.masters.effective_count() == 0 {
        return Err(ConfigError::ValidationFailed {
            detail: "nodes.masters.count must be at least 1".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nest_builds_dotted_path() {
        let overlay = nest(&["a", "b", "c"], serde_yaml::Value::from(3));
        let expected: serde_yaml::Value = serde_yaml::from_str("a:\n  b:\n    c: 3\n").unwrap();
        assert_eq!(overlay, expected);
    }

    #[test]
    fn unparseable_override_returns_none() {
        assert!(parse_override_scalar("[unterminated").is_none());
    }

    #[test]
    fn cidr_validation() {
        assert!(is_valid_cidr("10.0.0.0/24"));
        assert!(!is_valid_cidr("10.0.0.0/33"));
        assert!(!is_valid_cidr("not-an-ip/24"));
        assert!(!is_valid_cidr("10.0.0.0"));
    }

    #[test]
    fn expand_tilde_replaces_prefix() {
        std::env::set_var("HOME", "/home/tester");
        let p = Utf8PathBuf::from("~/keys/id_ed25519");
        let expanded = expand_tilde(&p);
        assert!(expanded.as_str().ends_with("keys/id_ed25519"));
        assert!(!expanded.as_str().starts_with('~'));
    }
}
