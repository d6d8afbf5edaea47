//! The flat value container behind every tag.
//!
//! Each attribute is meaningful only when its owning [`Code`] flag is set;
//! zero is a legal value, so readers must gate on the code, never on the
//! value. Edge attributes keep a `1`-suffixed twin for the opposite endpoint.
//!
//! [`Code`]: crate::core::Code

use crate::core::side::{Role, TapSide};
use crate::core::tap_port::TapPort;
use serde::{Serialize, Serializer};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Device type of an L3 resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct DeviceType(pub u8);

impl DeviceType {
    pub const VM: DeviceType = DeviceType(1);
    pub const THIRD_PARTY: DeviceType = DeviceType(3);
    pub const VGATEWAY: DeviceType = DeviceType(5);
    pub const HOST: DeviceType = DeviceType(6);
    pub const NETWORK: DeviceType = DeviceType(7);
    pub const FLOATING_IP: DeviceType = DeviceType(8);
    pub const DHCP: DeviceType = DeviceType(9);
}

/// How the resource tags of one side were matched.
pub mod tag_source {
    pub const NONE: u8 = 0;
    /// Pod id derived from the global process id.
    pub const GPID: u8 = 1 << 0;
    /// Agent id plus pod id.
    pub const POD_ID: u8 = 1 << 1;
    pub const MAC: u8 = 1 << 2;
    pub const EPC_IP: u8 = 1 << 3;
    /// Multicast, filled from the peer.
    pub const PEER: u8 = 1 << 4;
    /// Loopback traffic matched with the agent's own address.
    pub const AGENT: u8 = 1 << 5;
    pub const PROCESS_ID: u8 = 1 << 6;
}

/// Network type of the capture point; 3 is cloud traffic, the rest IDC.
pub mod tap_type {
    pub const IDC_MIN: u8 = 1;
    pub const CLOUD: u8 = 3;
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Field {
    /// Distinguishes agent pipelines; written as `_tid`.
    #[serde(rename = "thread_id")]
    pub global_thread_id: u8,

    #[serde(serialize_with = "serialize_ip6")]
    pub ip6: Option<Vec<u8>>,
    #[serde(skip)]
    pub mac: u64,
    #[serde(rename = "ip4", serialize_with = "serialize_ip4")]
    pub ip: u32,
    pub l3_epc_id: i32,
    pub l3_device_id: u32,
    pub l3_device_type: DeviceType,
    pub region_id: u16,
    pub subnet_id: u16,
    pub host_id: u16,
    pub pod_node_id: u32,
    pub az_id: u16,
    pub pod_group_id: u32,
    pub pod_ns_id: u16,
    pub pod_id: u32,
    pub pod_cluster_id: u16,
    pub service_id: u32,
    pub auto_instance_id: u32,
    pub auto_instance_type: u8,
    pub auto_service_id: u32,
    pub auto_service_type: u8,
    #[serde(rename = "gprocess_id")]
    pub gpid: u32,

    #[serde(skip)]
    pub mac1: u64,
    #[serde(rename = "ip6_1", serialize_with = "serialize_ip6")]
    pub ip61: Option<Vec<u8>>,
    #[serde(rename = "ip4_1", serialize_with = "serialize_ip4")]
    pub ip1: u32,
    #[serde(rename = "l3_epc_id_1")]
    pub l3_epc_id1: i32,
    #[serde(rename = "l3_device_id_1")]
    pub l3_device_id1: u32,
    #[serde(rename = "l3_device_type_1")]
    pub l3_device_type1: DeviceType,
    #[serde(rename = "region_id_1")]
    pub region_id1: u16,
    #[serde(rename = "subnet_id_1")]
    pub subnet_id1: u16,
    #[serde(rename = "host_id_1")]
    pub host_id1: u16,
    #[serde(rename = "pod_node_id_1")]
    pub pod_node_id1: u32,
    #[serde(rename = "az_id_1")]
    pub az_id1: u16,
    #[serde(rename = "pod_group_id_1")]
    pub pod_group_id1: u32,
    #[serde(rename = "pod_ns_id_1")]
    pub pod_ns_id1: u16,
    #[serde(rename = "pod_id_1")]
    pub pod_id1: u32,
    #[serde(rename = "pod_cluster_id_1")]
    pub pod_cluster_id1: u16,
    #[serde(rename = "service_id_1")]
    pub service_id1: u32,
    #[serde(rename = "auto_instance_id_1")]
    pub auto_instance_id1: u32,
    #[serde(rename = "auto_instance_type_1")]
    pub auto_instance_type1: u8,
    #[serde(rename = "auto_service_id_1")]
    pub auto_service_id1: u32,
    #[serde(rename = "auto_service_type_1")]
    pub auto_service_type1: u8,
    #[serde(rename = "gprocess_id_1")]
    pub gpid1: u32,

    #[serde(skip)]
    pub acl_gid: u16,
    pub role: Role,
    pub protocol: u8,
    pub server_port: u16,
    #[serde(rename = "agent_id")]
    pub vtap_id: u16,
    /// Selects the target database only; never stored.
    pub org_id: u16,
    pub team_id: u16,
    #[serde(skip)]
    pub tap_port: TapPort,
    // split out of tap_port
    #[serde(rename = "capture_nic")]
    pub nic: u32,
    #[serde(rename = "capture_nic_type")]
    pub nic_type: u8,
    pub nat_source: u8,
    pub tunnel_type: u8,

    #[serde(skip)]
    pub tap_side: TapSide,
    /// Token of `tap_side`, empty when the composite is illegal.
    #[serde(rename = "observation_point")]
    pub tap_side_str: &'static str,
    #[serde(rename = "capture_network_type_id")]
    pub tap_type: u8,
    /// Selects between `ip`/`ip1` and `ip6`/`ip61`.
    pub is_ipv4: bool,
    #[serde(skip)]
    pub is_key_service: bool,
    pub l7_protocol: u8,
    pub app_service: String,
    pub app_instance: String,
    pub endpoint: String,
    pub biz_type: u8,
    pub signal_source: u16,

    #[serde(skip)]
    pub tag_source: u8,
    #[serde(skip)]
    pub tag_source1: u8,

    /// Tunnel distribution point; rides the server-port wire slot.
    #[serde(skip)]
    pub tunnel_ip_id: u16,
}

impl Field {
    /// Side-0 IPv6 address, if a buffer is present.
    pub fn ip6_addr(&self) -> Option<Ipv6Addr> {
        self.ip6.as_deref().and_then(to_ipv6)
    }

    /// Side-1 IPv6 address, if a buffer is present.
    pub fn ip61_addr(&self) -> Option<Ipv6Addr> {
        self.ip61.as_deref().and_then(to_ipv6)
    }

    pub fn ip4_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.ip)
    }

    pub fn ip41_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.ip1)
    }

    /// Stores an IPv6 address, reusing the existing buffer when there is one.
    pub fn set_ip6(&mut self, addr: Ipv6Addr) {
        copy_into(&mut self.ip6, &addr.octets());
    }

    pub fn set_ip61(&mut self, addr: Ipv6Addr) {
        copy_into(&mut self.ip61, &addr.octets());
    }
}

/// Copies up to 16 bytes into the slot, allocating only when it is empty.
/// Missing trailing bytes are left zero.
pub(crate) fn copy_into(slot: &mut Option<Vec<u8>>, src: &[u8]) {
    let buf = slot.get_or_insert_with(|| vec![0; 16]);
    buf.resize(16, 0);
    let n = src.len().min(16);
    buf[..n].copy_from_slice(&src[..n]);
    buf[n..].fill(0);
}

fn to_ipv6(bytes: &[u8]) -> Option<Ipv6Addr> {
    let octets: [u8; 16] = bytes.try_into().ok()?;
    Some(Ipv6Addr::from(octets))
}

pub(crate) fn format_mac(mac: u64) -> String {
    let b = mac.to_be_bytes();
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        b[2], b[3], b[4], b[5], b[6], b[7]
    )
}

fn serialize_ip4<S: Serializer>(ip: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&Ipv4Addr::from(*ip))
}

fn serialize_ip6<S: Serializer>(ip: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match ip.as_deref().and_then(to_ipv6) {
        Some(addr) => serializer.collect_str(&addr),
        None => serializer.serialize_none(),
    }
}
