//! Default Hypervisor Adapter realization: shells out to `virsh`,
//! `genisoimage`, and `wget`.
//!
//! Command construction follows `libvirt/create.rs`'s `virsh_command()`
//! helper (a `Command::new("virsh")` plus an optional `-c <uri>`); every
//! call is bounded by a timeout the way the teacher's `hostexec.rs`
//! bounds subprocess execution, logged at `debug!`/`info!`/`error!` per
//! `spec.md` §9's logging design note.

use super::tempfiles::TempXmlFile;
use super::xml::{domain_xml, network_xml, pool_xml};
use super::{HypervisorAdapter, DEFAULT_TIMEOUT, DOWNLOAD_TIMEOUT};
use crate::errors::HypervisorError;
use crate::state::{Domain, Network, NetworkMode, Pool, PoolType, ResourceKind, Volume, VolumeProvenance};
use camino::Utf8Path;
use std::collections::HashMap;
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Shells out to `virsh` against a fixed connection URI.
#[derive(Debug, Clone)]
pub struct VirshAdapter {
    connect_uri: Option<String>,
}

impl VirshAdapter {
    pub fn new(connect_uri: Option<String>) -> Self {
        Self { connect_uri }
    }

    fn virsh(&self) -> Command {
        let mut cmd = Command::new("virsh");
        if let Some(uri) = &self.connect_uri {
            cmd.args(["-c", uri]);
        }
        cmd
    }

    fn command_label(&self, args: &[&str]) -> String {
        format!("virsh {}", args.join(" "))
    }
}

/// Run `cmd`, waiting at most `timeout`. The child is never killed on
/// timeout (per `spec.md` §5: forcibly killing an in-flight hypervisor
/// mutation risks leaving it inconsistent); it is simply abandoned to
/// finish on its own while this call returns a timeout error.
fn run_with_timeout(mut cmd: Command, label: &str, timeout: Duration) -> Result<Output, HypervisorError> {
    debug!(command = %label, "invoking adapter command");
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| HypervisorError::ConnectionFailed {
        detail: format!("failed to spawn {label}: {e}"),
    })?;

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = child.wait_with_output();
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(output)) => {
            if output.status.success() {
                info!(command = %label, "adapter command succeeded");
            } else {
                error!(command = %label, code = ?output.status.code(), "adapter command failed");
            }
            Ok(output)
        }
        Ok(Err(e)) => Err(HypervisorError::ConnectionFailed {
            detail: format!("failed to run {label}: {e}"),
        }),
        Err(_) => {
            error!(command = %label, timeout_ms = timeout.as_millis() as u64, "adapter command timed out");
            Err(HypervisorError::Timeout {
                command: label.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }
}

fn require_success(output: Output, label: &str) -> Result<String, HypervisorError> {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if output.status.success() {
        return Ok(stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{stdout}{stderr}");
    Err(HypervisorError::CommandFailed {
        command: label.to_string(),
        exit_code: output.status.code(),
        output: combined,
    })
}

/// Reclassify a failed `define`/`create` as `ResourceExists` when the
/// captured output says so, so the Executor can apply the "already
/// exists is success if equivalent" policy from `spec.md` §7.
fn classify_create_error(
    result: Result<String, HypervisorError>,
    kind: ResourceKind,
    name: &str,
) -> Result<(), HypervisorError> {
    match result {
        Ok(_) => Ok(()),
        Err(HypervisorError::CommandFailed { output, .. })
            if output.to_lowercase().contains("already exists") =>
        {
            Err(HypervisorError::ResourceExists {
                kind,
                name: name.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}

impl HypervisorAdapter for VirshAdapter {
    #[instrument(skip(self))]
    fn list_networks(&self) -> Result<Vec<Network>, HypervisorError> {
        let label = self.command_label(&["net-list", "--all", "--name"]);
        let mut cmd = self.virsh();
        cmd.args(["net-list", "--all", "--name"]);
        let out = require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|name| Network {
                name: name.to_string(),
                mode: NetworkMode::Nat,
                domain: String::new(),
                addresses: vec![],
                dhcp: false,
                dns: false,
                active: true,
            })
            .collect())
    }

    #[instrument(skip(self))]
    fn list_pools(&self) -> Result<Vec<Pool>, HypervisorError> {
        let label = self.command_label(&["pool-list", "--all", "--name"]);
        let mut cmd = self.virsh();
        cmd.args(["pool-list", "--all", "--name"]);
        let out = require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|name| Pool {
                name: name.to_string(),
                pool_type: PoolType::Dir,
                path: String::new(),
                active: true,
            })
            .collect())
    }

    #[instrument(skip(self))]
    fn list_domains(&self) -> Result<Vec<Domain>, HypervisorError> {
        let label = self.command_label(&["list", "--all", "--name"]);
        let mut cmd = self.virsh();
        cmd.args(["list", "--all", "--name"]);
        let out = require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|name| Domain {
                name: name.to_string(),
                memory_mib: 0,
                vcpu: 0,
                pool: String::new(),
                network: String::new(),
                disk_volume: String::new(),
                ip_address: None,
                state: crate::state::DomainState::Unknown,
            })
            .collect())
    }

    #[instrument(skip(self))]
    fn list_volumes(&self, pool: &str) -> Result<Vec<Volume>, HypervisorError> {
        let label = self.command_label(&["vol-list", pool, "--name"]);
        let mut cmd = self.virsh();
        cmd.args(["vol-list", pool, "--name"]);
        let out = require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|name| Volume {
                name: name.to_string(),
                pool: pool.to_string(),
                format: crate::state::VolumeFormat::Qcow2,
                provenance: VolumeProvenance::Fresh { size_bytes: 0 },
            })
            .collect())
    }

    #[instrument(skip(self, net))]
    fn create_network(&self, net: &Network) -> Result<(), HypervisorError> {
        let xml = network_xml(net);
        let tmp = TempXmlFile::write(&xml)
            .map_err(|e| HypervisorError::ConnectionFailed { detail: e.to_string() })?;
        let path = tmp.path();

        let label = self.command_label(&["net-define", path.as_str()]);
        let mut cmd = self.virsh();
        cmd.args(["net-define", path.as_str()]);
        classify_create_error(
            run_with_timeout(cmd, &label, DEFAULT_TIMEOUT).and_then(|o| require_success(o, &label)),
            ResourceKind::Network,
            &net.name,
        )?;

        for args in [vec!["net-start", &net.name], vec!["net-autostart", &net.name]] {
            let label = self.command_label(&args);
            let mut cmd = self.virsh();
            cmd.args(&args);
            require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        }
        Ok(())
    }

    #[instrument(skip(self, pool))]
    fn create_pool(&self, pool: &Pool) -> Result<(), HypervisorError> {
        let xml = pool_xml(pool);
        let tmp = TempXmlFile::write(&xml)
            .map_err(|e| HypervisorError::ConnectionFailed { detail: e.to_string() })?;
        let path = tmp.path();

        let label = self.command_label(&["pool-define", path.as_str()]);
        let mut cmd = self.virsh();
        cmd.args(["pool-define", path.as_str()]);
        classify_create_error(
            run_with_timeout(cmd, &label, DEFAULT_TIMEOUT).and_then(|o| require_success(o, &label)),
            ResourceKind::Pool,
            &pool.name,
        )?;

        for args in [
            vec!["pool-build", &pool.name],
            vec!["pool-start", &pool.name],
            vec!["pool-autostart", &pool.name],
        ] {
            let label = self.command_label(&args);
            let mut cmd = self.virsh();
            cmd.args(&args);
            require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        }
        Ok(())
    }

    #[instrument(skip(self, vol))]
    fn create_volume(&self, vol: &Volume) -> Result<(), HypervisorError> {
        let fmt = match vol.format {
            crate::state::VolumeFormat::Qcow2 => "qcow2",
            crate::state::VolumeFormat::Raw => "raw",
        };
        match &vol.provenance {
            VolumeProvenance::Fresh { size_bytes } => {
                let size_arg = format!("{size_bytes}B");
                let label = self.command_label(&[
                    "vol-create-as",
                    &vol.pool,
                    &vol.name,
                    &size_arg,
                    "--format",
                    fmt,
                ]);
                let mut cmd = self.virsh();
                cmd.args(["vol-create-as", &vol.pool, &vol.name, &size_arg, "--format", fmt]);
                classify_create_error(
                    run_with_timeout(cmd, &label, DEFAULT_TIMEOUT).and_then(|o| require_success(o, &label)),
                    ResourceKind::Volume,
                    &vol.name,
                )?;
            }
            VolumeProvenance::Clone { base_volume } => {
                let label =
                    self.command_label(&["vol-clone", base_volume, &vol.name, "--pool", &vol.pool]);
                let mut cmd = self.virsh();
                cmd.args(["vol-clone", base_volume, &vol.name, "--pool", &vol.pool]);
                classify_create_error(
                    run_with_timeout(cmd, &label, DEFAULT_TIMEOUT).and_then(|o| require_success(o, &label)),
                    ResourceKind::Volume,
                    &vol.name,
                )?;
            }
            VolumeProvenance::Download { source } => {
                // Create an empty volume first, then download into its path via wget.
                let path_label = self.command_label(&["vol-path", &vol.name, "--pool", &vol.pool]);
                let mut create_cmd = self.virsh();
                create_cmd.args(["vol-create-as", &vol.pool, &vol.name, "1", "--format", fmt]);
                require_success(
                    run_with_timeout(create_cmd, &self.command_label(&["vol-create-as"]), DEFAULT_TIMEOUT)?,
                    "vol-create-as",
                )?;
                let mut path_cmd = self.virsh();
                path_cmd.args(["vol-path", &vol.name, "--pool", &vol.pool]);
                let dest = require_success(run_with_timeout(path_cmd, &path_label, DEFAULT_TIMEOUT)?, &path_label)?;
                let dest = dest.trim();

                let label = format!("wget -O {dest} {source}");
                let mut wget = Command::new("wget");
                wget.args(["-O", dest, source]);
                require_success(run_with_timeout(wget, &label, DOWNLOAD_TIMEOUT)?, &label)?;
            }
            VolumeProvenance::CloudInit { .. } => {
                // Cloud-init volumes are materialized by the Cloud-Init
                // Generator via the Executor, not the Adapter directly;
                // `spec.md` §9 treats domain-create as authoritative.
            }
        }
        Ok(())
    }

    #[instrument(skip(self, dom, cloudinit_iso))]
    fn create_domain(
        &self,
        dom: &Domain,
        cloudinit_iso: Option<&Utf8Path>,
    ) -> Result<(), HypervisorError> {
        let disk_path_label = self.command_label(&["vol-path", &dom.disk_volume, "--pool", &dom.pool]);
        let mut path_cmd = self.virsh();
        path_cmd.args(["vol-path", &dom.disk_volume, "--pool", &dom.pool]);
        let disk_path = require_success(
            run_with_timeout(path_cmd, &disk_path_label, DEFAULT_TIMEOUT)?,
            &disk_path_label,
        )?;
        let disk_path = disk_path.trim();

        let xml = domain_xml(dom, disk_path, cloudinit_iso.map(|p| p.as_str()));
        let tmp = TempXmlFile::write(&xml)
            .map_err(|e| HypervisorError::ConnectionFailed { detail: e.to_string() })?;
        let path = tmp.path();

        let label = self.command_label(&["define", path.as_str()]);
        let mut cmd = self.virsh();
        cmd.args(["define", path.as_str()]);
        classify_create_error(
            run_with_timeout(cmd, &label, DEFAULT_TIMEOUT).and_then(|o| require_success(o, &label)),
            ResourceKind::Domain,
            &dom.name,
        )?;

        let label = self.command_label(&["start", &dom.name]);
        let mut cmd = self.virsh();
        cmd.args(["start", &dom.name]);
        require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete_network(&self, name: &str) -> Result<(), HypervisorError> {
        let mut destroy = self.virsh();
        destroy.args(["net-destroy", name]);
        let _ = run_with_timeout(destroy, &self.command_label(&["net-destroy", name]), DEFAULT_TIMEOUT);

        let label = self.command_label(&["net-undefine", name]);
        let mut cmd = self.virsh();
        cmd.args(["net-undefine", name]);
        require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete_pool(&self, name: &str) -> Result<(), HypervisorError> {
        let mut destroy = self.virsh();
        destroy.args(["pool-destroy", name]);
        let _ = run_with_timeout(destroy, &self.command_label(&["pool-destroy", name]), DEFAULT_TIMEOUT);

        let label = self.command_label(&["pool-undefine", name]);
        let mut cmd = self.virsh();
        cmd.args(["pool-undefine", name]);
        require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete_volume(&self, pool: &str, name: &str) -> Result<(), HypervisorError> {
        let label = self.command_label(&["vol-delete", name, "--pool", pool]);
        let mut cmd = self.virsh();
        cmd.args(["vol-delete", name, "--pool", pool]);
        require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete_domain(&self, name: &str) -> Result<(), HypervisorError> {
        let mut destroy = self.virsh();
        destroy.args(["destroy", name]);
        let _ = run_with_timeout(destroy, &self.command_label(&["destroy", name]), DEFAULT_TIMEOUT);

        let label = self.command_label(&["undefine", name, "--remove-all-storage"]);
        let mut cmd = self.virsh();
        cmd.args(["undefine", name, "--remove-all-storage"]);
        require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn exists(&self, kind: ResourceKind, name: &str) -> Result<bool, HypervisorError> {
        let args: Vec<&str> = match kind {
            ResourceKind::Network => vec!["net-info", name],
            ResourceKind::Pool => vec!["pool-info", name],
            ResourceKind::Domain => vec!["dominfo", name],
            ResourceKind::Volume => vec!["vol-info", name],
        };
        let label = self.command_label(&args);
        let mut cmd = self.virsh();
        cmd.args(&args).stdout(Stdio::null()).stderr(Stdio::null());
        match run_with_timeout(cmd, &label, DEFAULT_TIMEOUT) {
            Ok(out) => Ok(out.status.success()),
            Err(HypervisorError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    fn domain_info(&self, name: &str) -> Result<HashMap<String, String>, HypervisorError> {
        let label = self.command_label(&["dominfo", name]);
        let mut cmd = self.virsh();
        cmd.args(["dominfo", name]);
        let out = require_success(run_with_timeout(cmd, &label, DEFAULT_TIMEOUT)?, &label)?;
        Ok(out
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect())
    }
}
