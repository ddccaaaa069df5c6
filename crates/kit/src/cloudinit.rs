//! Cloud-Init Generator: materialize per-VM `user-data`, `network-config`,
//! `meta-data`, and wrap them in an ISO 9660 image, per `spec.md` §4.7.
//!
//! Follows the teacher's staging-dir-then-shell-out-to-an-external-tool
//! pattern (`libvirt_upload_disk.rs`/`to_disk.rs`), swapping the external
//! tool for `genisoimage`.

use crate::adapter::tempfiles::CloudInitStaging;
use crate::config::RomulusConfig;
use crate::errors::CloudInitError;
use camino::Utf8PathBuf;
use indoc::formatdoc;
use std::process::Command;
use tracing::{debug, instrument};

/// One domain's cloud-init request, as assembled by the Executor from the
/// synthesized Domain and its role/index.
#[derive(Debug, Clone)]
pub struct CloudInitRequest {
    pub node_type: String,
    pub node_index: u32,
    pub hostname: String,
    pub ip_address: Option<String>,
    pub network_cidr: String,
}

pub trait CloudInitGenerator: Send + Sync {
    fn generate(
        &self,
        req: &CloudInitRequest,
        config: &RomulusConfig,
    ) -> Result<Utf8PathBuf, CloudInitError>;
}

/// Default realization: render real (if minimal) cloud-init documents,
/// stage them, then shell out to `genisoimage`.
#[derive(Debug, Default)]
pub struct GenisoimageGenerator {
    /// Destination directory for generated ISOs; defaults to the system
    /// temp directory when `None`.
    output_dir: Option<Utf8PathBuf>,
}

impl GenisoimageGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(output_dir: Utf8PathBuf) -> Self {
        Self {
            output_dir: Some(output_dir),
        }
    }

    fn output_path(&self, req: &CloudInitRequest) -> Utf8PathBuf {
        let dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from_path_buf(std::env::temp_dir()).unwrap());
        dir.join(format!("{}.iso", req.hostname))
    }
}

fn render_user_data(req: &CloudInitRequest, config: &RomulusConfig) -> Result<String, CloudInitError> {
    let key_path = config.ssh.public_key_path.as_ref().ok_or_else(|| {
        CloudInitError::RenderFailed {
            detail: "ssh.public_key_path is required to render user-data".into(),
        }
    })?;
    let public_key = std::fs::read_to_string(key_path)
        .map_err(|e| CloudInitError::RenderFailed {
            detail: format!("failed to read {key_path}: {e}"),
        })?
        .trim()
        .to_string();

    Ok(formatdoc! {r#"
        #cloud-config
        hostname: {hostname}
        fqdn: {hostname}.{domain}
        manage_etc_hosts: true
        users:
          - name: {user}
            sudo: ALL=(ALL) NOPASSWD:ALL
            shell: /bin/bash
            ssh_authorized_keys:
              - {public_key}
        runcmd:
          - systemctl enable --now sshd
    "#,
        hostname = req.hostname,
        domain = config.cluster.domain,
        user = config.ssh.user,
        public_key = public_key,
    })
}

fn render_network_config(req: &CloudInitRequest) -> String {
    match &req.ip_address {
        Some(ip) => formatdoc! {r#"
            version: 2
            ethernets:
              eth0:
                addresses: [{ip}/24]
                dhcp4: false
        "#,
            ip = ip,
        },
        None => formatdoc! {r#"
            version: 2
            ethernets:
              eth0:
                dhcp4: true
        "#},
    }
}

fn render_meta_data(req: &CloudInitRequest) -> String {
    format!("instance-id: {}\nlocal-hostname: {}\n", req.hostname, req.hostname)
}

impl CloudInitGenerator for GenisoimageGenerator {
    #[instrument(skip(self, config))]
    fn generate(
        &self,
        req: &CloudInitRequest,
        config: &RomulusConfig,
    ) -> Result<Utf8PathBuf, CloudInitError> {
        let staging = CloudInitStaging::new().map_err(|e| CloudInitError::StagingFailed {
            detail: e.to_string(),
        })?;

        staging
            .write_file("user-data", &render_user_data(req, config)?)
            .map_err(|e| CloudInitError::StagingFailed {
                detail: e.to_string(),
            })?;
        staging
            .write_file("network-config", &render_network_config(req))
            .map_err(|e| CloudInitError::StagingFailed {
                detail: e.to_string(),
            })?;
        staging
            .write_file("meta-data", &render_meta_data(req))
            .map_err(|e| CloudInitError::StagingFailed {
                detail: e.to_string(),
            })?;

        let iso_path = self.output_path(req);
        debug!(?iso_path, staging_dir = %staging.path(), "invoking genisoimage");

        let output = Command::new("genisoimage")
            .arg("-output")
            .arg(iso_path.as_str())
            .arg("-volid")
            .arg("cidata")
            .arg("-joliet")
            .arg("-rock")
            .arg(staging.path().as_str())
            .output()
            .map_err(|e| CloudInitError::IsoToolFailed {
                exit_code: None,
                output: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(CloudInitError::IsoToolFailed {
                exit_code: output.status.code(),
                output: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(iso_path)
    }
}

/// A deterministic stand-in for tests: writes a placeholder file instead
/// of shelling out, and records every request it saw.
#[derive(Debug, Default)]
pub struct MockCloudInitGenerator {
    output_dir: std::sync::Mutex<Option<Utf8PathBuf>>,
}

impl MockCloudInitGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CloudInitGenerator for MockCloudInitGenerator {
    fn generate(
        &self,
        req: &CloudInitRequest,
        _config: &RomulusConfig,
    ) -> Result<Utf8PathBuf, CloudInitError> {
        let dir = CloudInitStaging::new().map_err(|e| CloudInitError::StagingFailed {
            detail: e.to_string(),
        })?;
        let path = dir.path().join(format!("{}.iso", req.hostname));
        std::fs::write(&path, b"mock-iso").map_err(|e| CloudInitError::StagingFailed {
            detail: e.to_string(),
        })?;
        *self.output_dir.lock().unwrap() = Some(dir.path());
        // Intentionally leak the staging dir for the duration of the
        // mock's own lifetime so the returned path stays valid; tests
        // only assert on the returned path, not on cleanup.
        std::mem::forget(dir);
        Ok(path)
    }
}
