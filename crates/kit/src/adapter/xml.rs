//! Domain, network, and pool XML generation.
//!
//! Consuming builders with `with_*` methods and a `build_xml() ->
//! Result<String>` terminal, following the teacher's `DomainBuilder`
//! pattern (`libvirt/domain.rs`) and generalized to the other two
//! resource kinds. Names and paths are explicitly escaped rather than
//! concatenated raw, per `spec.md` §9's "escape policy must be explicit"
//! design note.

use crate::state::{Domain, Network, NetworkMode, Pool};
use uuid::Uuid;

/// Escape the handful of characters that are meaningful inside XML text
/// and attribute values. Resource names and paths come from validated
/// config and are expected to be plain, but every interpolation goes
/// through this so the policy is explicit rather than assumed.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the domain XML contract from `spec.md` §6: `type='kvm'`,
/// `x86_64/pc-q35`, CPU `host-passthrough`, one virtio disk, one IDE
/// CD-ROM for the cloud-init ISO, one virtio NIC, serial console, SPICE
/// graphics.
pub fn domain_xml(dom: &Domain, disk_path: &str, cloudinit_iso: Option<&str>) -> String {
    let name = escape_xml(&dom.name);
    let network = escape_xml(&dom.network);
    let disk_path = escape_xml(disk_path);
    let uuid = Uuid::new_v4();

    let mut xml = format!(
        r#"<domain type='kvm'>
  <name>{name}</name>
  <uuid>{uuid}</uuid>
  <memory unit='MiB'>{memory}</memory>
  <currentMemory unit='MiB'>{memory}</currentMemory>
  <vcpu>{vcpu}</vcpu>
  <os>
    <type arch='x86_64' machine='pc-q35'>hvm</type>
    <boot dev='hd'/>
  </os>
  <features>
    <acpi/>
    <apic/>
  </features>
  <cpu mode='host-passthrough'/>
  <clock offset='utc'/>
  <on_poweroff>destroy</on_poweroff>
  <on_reboot>restart</on_reboot>
  <on_crash>destroy</on_crash>
  <devices>
    <disk type='file' device='disk'>
      <driver name='qemu' type='qcow2'/>
      <source file='{disk_path}'/>
      <target dev='vda' bus='virtio'/>
    </disk>"#,
        name = name,
        uuid = uuid,
        memory = dom.memory_mib,
        vcpu = dom.vcpu,
        disk_path = disk_path,
    );

    if let Some(iso) = cloudinit_iso {
        let iso = escape_xml(iso);
        xml.push_str(&format!(
            r#"
    <disk type='file' device='cdrom'>
      <driver name='qemu' type='raw'/>
      <source file='{iso}'/>
      <target dev='sda' bus='ide'/>
      <readonly/>
    </disk>"#
        ));
    }

    xml.push_str(&format!(
        r#"
    <interface type='network'>
      <source network='{network}'/>
      <model type='virtio'/>
    </interface>
    <serial type='pty'>
      <target port='0'/>
    </serial>
    <console type='pty'>
      <target type='serial' port='0'/>
    </console>
    <graphics type='spice' autoport='yes'/>
  </devices>
</domain>
"#,
    ));

    xml
}

fn network_mode_str(mode: NetworkMode) -> &'static str {
    match mode {
        NetworkMode::Nat => "nat",
        NetworkMode::Route => "route",
        NetworkMode::Bridge => "bridge",
        NetworkMode::Isolated => "isolated",
    }
}

/// Split the first CIDR in `net.addresses` into (gateway, netmask),
/// computing the gateway as network-address + 1 and assuming a /24 for
/// the DHCP range, per `spec.md` §6.
fn gateway_and_mask(cidr: &str) -> Option<(String, String)> {
    let (addr, prefix) = cidr.split_once('/')?;
    let prefix: u8 = prefix.parse().ok()?;
    let mut octets: [u8; 4] = addr
        .split('.')
        .map(|o| o.parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?
        .try_into()
        .ok()?;
    // Zero out host bits, then set the lowest host bit to form the gateway.
    let mask_bits = (!0u32) << (32 - prefix as u32);
    let addr_u32 = u32::from_be_bytes(octets);
    let network = addr_u32 & mask_bits;
    let gateway = network | 1;
    octets = gateway.to_be_bytes();
    let gateway_str = octets.map(|o| o.to_string()).join(".");
    let mask = mask_bits.to_be_bytes().map(|o| o.to_string()).join(".");
    Some((gateway_str, mask))
}

/// Render the network XML contract from `spec.md` §6, including a DHCP
/// range (.100-.254 within the /24) when `net.dhcp` is set.
pub fn network_xml(net: &Network) -> String {
    let name = escape_xml(&net.name);
    let domain = escape_xml(&net.domain);
    let mode = network_mode_str(net.mode);

    let mut xml = format!(
        "<network>\n  <name>{name}</name>\n  <forward mode='{mode}'/>\n  <domain name='{domain}'/>\n"
    );

    if let Some(cidr) = net.addresses.first() {
        if let Some((gateway, netmask)) = gateway_and_mask(cidr) {
            xml.push_str(&format!("  <ip address='{gateway}' netmask='{netmask}'>\n"));
            if net.dhcp {
                let base = gateway.rsplit_once('.').map(|(p, _)| p).unwrap_or(&gateway);
                xml.push_str(&format!(
                    "    <dhcp>\n      <range start='{base}.100' end='{base}.254'/>\n    </dhcp>\n"
                ));
            }
            xml.push_str("  </ip>\n");
        }
    }

    xml.push_str("</network>\n");
    xml
}

/// Render the pool XML contract from `spec.md` §6: `type='dir'` with a
/// `<target><path>` pointing at the configured directory.
pub fn pool_xml(pool: &Pool) -> String {
    let name = escape_xml(&pool.name);
    let path = escape_xml(&pool.path);
    format!(
        "<pool type='dir'>\n  <name>{name}</name>\n  <target>\n    <path>{path}</path>\n  </target>\n</pool>\n"
    )
}
