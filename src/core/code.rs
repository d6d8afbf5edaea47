//! The `Code` bitmask that selects which dimensions of a tag are present.
//!
//! Bits 0..=19 hold one-sided dimensions, bits 20..=39 the two-sided (edge)
//! form of the same dimension shifted by [`PATH_OFFSET`], and bits 40..=62
//! capture, transport and tunnel attributes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Distance between a one-sided flag and its edge counterpart.
pub const PATH_OFFSET: u32 = 20;

/// Highest bit index allowed for one-sided flags.
pub const PRIMARY_MAX_BIT: u32 = 19;
/// Highest bit index allowed for edge flags.
pub const PATH_MAX_BIT: u32 = 39;
/// Highest bit index allowed for capture/transport/tunnel flags.
pub const EXTENDED_MAX_BIT: u32 = 62;

const PATH_MASK: u64 = 0xff_fff0_0000;

/// Bitmask naming the dimensions carried by a tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(u64);

impl Code {
    /// No dimension selected.
    pub const NONE: Code = Code(0);

    pub const IP: Code = Code(1 << 0);
    pub const L3_EPC_ID: Code = Code(1 << 1);
    pub const L3_DEVICE: Code = Code(1 << 2);
    pub const SUBNET_ID: Code = Code(1 << 3);
    pub const REGION_ID: Code = Code(1 << 4);
    pub const POD_NODE_ID: Code = Code(1 << 5);
    pub const HOST_ID: Code = Code(1 << 6);
    pub const AZ_ID: Code = Code(1 << 7);
    pub const POD_GROUP_ID: Code = Code(1 << 8);
    pub const POD_NS_ID: Code = Code(1 << 9);
    pub const POD_ID: Code = Code(1 << 10);
    pub const MAC: Code = Code(1 << 11);
    pub const POD_CLUSTER_ID: Code = Code(1 << 12);
    pub const SERVICE_ID: Code = Code(1 << 13);
    /// Auto instance/service resource ids and types.
    pub const RESOURCE: Code = Code(1 << 14);
    pub const GPID: Code = Code(1 << 15);

    pub const IP_PATH: Code = Self::IP.path();
    pub const L3_EPC_ID_PATH: Code = Self::L3_EPC_ID.path();
    pub const L3_DEVICE_PATH: Code = Self::L3_DEVICE.path();
    pub const SUBNET_ID_PATH: Code = Self::SUBNET_ID.path();
    pub const REGION_ID_PATH: Code = Self::REGION_ID.path();
    pub const POD_NODE_ID_PATH: Code = Self::POD_NODE_ID.path();
    pub const HOST_ID_PATH: Code = Self::HOST_ID.path();
    pub const AZ_ID_PATH: Code = Self::AZ_ID.path();
    pub const POD_GROUP_ID_PATH: Code = Self::POD_GROUP_ID.path();
    pub const POD_NS_ID_PATH: Code = Self::POD_NS_ID.path();
    pub const POD_ID_PATH: Code = Self::POD_ID.path();
    pub const MAC_PATH: Code = Self::MAC.path();
    pub const POD_CLUSTER_ID_PATH: Code = Self::POD_CLUSTER_ID.path();
    pub const SERVICE_ID_PATH: Code = Self::SERVICE_ID.path();
    pub const RESOURCE_PATH: Code = Self::RESOURCE.path();
    pub const GPID_PATH: Code = Self::GPID.path();

    /// Emitted as `role`.
    pub const DIRECTION: Code = Code(1 << 40);
    pub const ACL_GID: Code = Code(1 << 41);
    pub const PROTOCOL: Code = Code(1 << 42);
    pub const SERVER_PORT: Code = Code(1 << 43);
    // bit 44 unused
    pub const TAP_TYPE: Code = Code(1 << 45);
    // bit 46 unused
    pub const VTAP_ID: Code = Code(1 << 47);
    pub const TAP_SIDE: Code = Code(1 << 48);
    pub const TAP_PORT: Code = Code(1 << 49);
    pub const IS_KEY_SERVICE: Code = Code(1 << 50);
    /// Also carries app_service, app_instance, endpoint and biz_type.
    pub const L7_PROTOCOL: Code = Code(1 << 51);
    pub const SIGNAL_SOURCE: Code = Code(1 << 52);

    pub const TUNNEL_IP_ID: Code = Code(1 << 62);

    pub const BASE: Code = Self::AZ_ID
        .union(Self::HOST_ID)
        .union(Self::IP)
        .union(Self::L3_DEVICE)
        .union(Self::L3_EPC_ID)
        .union(Self::POD_CLUSTER_ID)
        .union(Self::POD_GROUP_ID)
        .union(Self::POD_ID)
        .union(Self::POD_NODE_ID)
        .union(Self::POD_NS_ID)
        .union(Self::REGION_ID)
        .union(Self::SUBNET_ID)
        .union(Self::TAP_TYPE)
        .union(Self::VTAP_ID)
        .union(Self::SERVICE_ID)
        .union(Self::RESOURCE)
        .union(Self::GPID)
        .union(Self::SIGNAL_SOURCE);
    pub const BASE_PATH: Code = Self::AZ_ID_PATH
        .union(Self::HOST_ID_PATH)
        .union(Self::IP_PATH)
        .union(Self::L3_DEVICE_PATH)
        .union(Self::L3_EPC_ID_PATH)
        .union(Self::POD_CLUSTER_ID_PATH)
        .union(Self::POD_GROUP_ID_PATH)
        .union(Self::POD_ID_PATH)
        .union(Self::POD_NODE_ID_PATH)
        .union(Self::POD_NS_ID_PATH)
        .union(Self::REGION_ID_PATH)
        .union(Self::SUBNET_ID_PATH)
        .union(Self::TAP_SIDE)
        .union(Self::TAP_TYPE)
        .union(Self::VTAP_ID)
        .union(Self::SERVICE_ID_PATH)
        .union(Self::RESOURCE_PATH)
        .union(Self::GPID_PATH)
        .union(Self::SIGNAL_SOURCE);
    pub const BASE_PORT: Code = Self::PROTOCOL
        .union(Self::SERVER_PORT)
        .union(Self::IS_KEY_SERVICE);

    pub const NETWORK: Code = Self::BASE.union(Self::BASE_PORT).union(Self::DIRECTION);
    pub const NETWORK_MAP: Code = Self::BASE_PATH.union(Self::BASE_PORT).union(Self::TAP_PORT);
    pub const APPLICATION: Code = Self::NETWORK.union(Self::L7_PROTOCOL);
    pub const APPLICATION_MAP: Code = Self::NETWORK_MAP.union(Self::L7_PROTOCOL);
    pub const TRAFFIC_POLICY: Code = Self::ACL_GID
        .union(Self::TUNNEL_IP_ID)
        .union(Self::VTAP_ID);

    /// Every named flag with its canonical name.
    pub const NAMED: &'static [(&'static str, Code)] = &[
        ("ip", Self::IP),
        ("l3_epc_id", Self::L3_EPC_ID),
        ("l3_device", Self::L3_DEVICE),
        ("subnet_id", Self::SUBNET_ID),
        ("region_id", Self::REGION_ID),
        ("pod_node_id", Self::POD_NODE_ID),
        ("host_id", Self::HOST_ID),
        ("az_id", Self::AZ_ID),
        ("pod_group_id", Self::POD_GROUP_ID),
        ("pod_ns_id", Self::POD_NS_ID),
        ("pod_id", Self::POD_ID),
        ("mac", Self::MAC),
        ("pod_cluster_id", Self::POD_CLUSTER_ID),
        ("service_id", Self::SERVICE_ID),
        ("resource", Self::RESOURCE),
        ("gpid", Self::GPID),
        ("ip_path", Self::IP_PATH),
        ("l3_epc_id_path", Self::L3_EPC_ID_PATH),
        ("l3_device_path", Self::L3_DEVICE_PATH),
        ("subnet_id_path", Self::SUBNET_ID_PATH),
        ("region_id_path", Self::REGION_ID_PATH),
        ("pod_node_id_path", Self::POD_NODE_ID_PATH),
        ("host_id_path", Self::HOST_ID_PATH),
        ("az_id_path", Self::AZ_ID_PATH),
        ("pod_group_id_path", Self::POD_GROUP_ID_PATH),
        ("pod_ns_id_path", Self::POD_NS_ID_PATH),
        ("pod_id_path", Self::POD_ID_PATH),
        ("mac_path", Self::MAC_PATH),
        ("pod_cluster_id_path", Self::POD_CLUSTER_ID_PATH),
        ("service_id_path", Self::SERVICE_ID_PATH),
        ("resource_path", Self::RESOURCE_PATH),
        ("gpid_path", Self::GPID_PATH),
        ("direction", Self::DIRECTION),
        ("acl_gid", Self::ACL_GID),
        ("protocol", Self::PROTOCOL),
        ("server_port", Self::SERVER_PORT),
        ("tap_type", Self::TAP_TYPE),
        ("vtap_id", Self::VTAP_ID),
        ("tap_side", Self::TAP_SIDE),
        ("tap_port", Self::TAP_PORT),
        ("is_key_service", Self::IS_KEY_SERVICE),
        ("l7_protocol", Self::L7_PROTOCOL),
        ("signal_source", Self::SIGNAL_SOURCE),
        ("tunnel_ip_id", Self::TUNNEL_IP_ID),
    ];

    /// Wraps raw bits without validation.
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Code(bits)
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn union(self, other: Code) -> Code {
        Code(self.0 | other.0)
    }

    /// Clears every bit of `other`.
    #[inline]
    pub const fn without(self, other: Code) -> Code {
        Code(self.0 & !other.0)
    }

    /// True when any bit of `other` is set in `self`.
    #[inline]
    pub const fn has(self, other: Code) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True iff any edge (bits 20..=39) flag is set.
    #[inline]
    pub const fn has_edge_tag_field(self) -> bool {
        self.0 & PATH_MASK != 0
    }

    /// The edge counterpart of a one-sided flag.
    const fn path(self) -> Code {
        Code(self.0 << PATH_OFFSET)
    }

    /// The code with the decode-only MAC flags removed, as used for table routing.
    #[inline]
    pub const fn without_mac(self) -> Code {
        self.without(Self::MAC.union(Self::MAC_PATH))
    }

    /// Canonical name of a single named flag.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED.iter().find(|(_, c)| *c == self).map(|(n, _)| *n)
    }

    /// Text keys gated by this code, in ascending key order.
    ///
    /// The text encoder and the column generator both walk this sequence,
    /// so keys and columns always come out in the same order.
    pub fn keys(self) -> impl Iterator<Item = &'static str> {
        TAG_KEYS
            .iter()
            .filter(move |(_, owner)| self.has(*owner))
            .map(|(key, _)| *key)
    }
}

/// Every text key with the flag that gates it, sorted by key name.
///
/// A flag owning several keys (`L7_PROTOCOL`, `RESOURCE`, `VTAP_ID`) gates
/// all of them at once; they land at their own sorted positions. The MAC
/// flags own no key.
pub(crate) const TAG_KEYS: [(&str, Code); 75] = [
    ("acl_gid", Code::ACL_GID),
    ("agent_id", Code::VTAP_ID),
    ("app_instance", Code::L7_PROTOCOL),
    ("app_service", Code::L7_PROTOCOL),
    ("auto_instance_id", Code::RESOURCE),
    ("auto_instance_id_0", Code::RESOURCE_PATH),
    ("auto_instance_id_1", Code::RESOURCE_PATH),
    ("auto_instance_type", Code::RESOURCE),
    ("auto_instance_type_0", Code::RESOURCE_PATH),
    ("auto_instance_type_1", Code::RESOURCE_PATH),
    ("auto_service_id", Code::RESOURCE),
    ("auto_service_id_0", Code::RESOURCE_PATH),
    ("auto_service_id_1", Code::RESOURCE_PATH),
    ("auto_service_type", Code::RESOURCE),
    ("auto_service_type_0", Code::RESOURCE_PATH),
    ("auto_service_type_1", Code::RESOURCE_PATH),
    ("az_id", Code::AZ_ID),
    ("az_id_0", Code::AZ_ID_PATH),
    ("az_id_1", Code::AZ_ID_PATH),
    ("biz_type", Code::L7_PROTOCOL),
    ("capture_network_type_id", Code::TAP_TYPE),
    ("capture_nic", Code::TAP_PORT),
    ("endpoint", Code::L7_PROTOCOL),
    ("gprocess_id", Code::GPID),
    ("gprocess_id_0", Code::GPID_PATH),
    ("gprocess_id_1", Code::GPID_PATH),
    ("host_id", Code::HOST_ID),
    ("host_id_0", Code::HOST_ID_PATH),
    ("host_id_1", Code::HOST_ID_PATH),
    ("ip", Code::IP),
    ("ip_0", Code::IP_PATH),
    ("ip_1", Code::IP_PATH),
    // shared by both shapes, written once
    ("ip_version", Code::IP.union(Code::IP_PATH)),
    ("is_key_service", Code::IS_KEY_SERVICE),
    ("l3_device_id", Code::L3_DEVICE),
    ("l3_device_id_0", Code::L3_DEVICE_PATH),
    ("l3_device_id_1", Code::L3_DEVICE_PATH),
    ("l3_device_type", Code::L3_DEVICE),
    ("l3_device_type_0", Code::L3_DEVICE_PATH),
    ("l3_device_type_1", Code::L3_DEVICE_PATH),
    ("l3_epc_id", Code::L3_EPC_ID),
    ("l3_epc_id_0", Code::L3_EPC_ID_PATH),
    ("l3_epc_id_1", Code::L3_EPC_ID_PATH),
    ("l7_protocol", Code::L7_PROTOCOL),
    ("observation_point", Code::TAP_SIDE),
    ("pod_cluster_id", Code::POD_CLUSTER_ID),
    ("pod_cluster_id_0", Code::POD_CLUSTER_ID_PATH),
    ("pod_cluster_id_1", Code::POD_CLUSTER_ID_PATH),
    ("pod_group_id", Code::POD_GROUP_ID),
    ("pod_group_id_0", Code::POD_GROUP_ID_PATH),
    ("pod_group_id_1", Code::POD_GROUP_ID_PATH),
    ("pod_id", Code::POD_ID),
    ("pod_id_0", Code::POD_ID_PATH),
    ("pod_id_1", Code::POD_ID_PATH),
    ("pod_node_id", Code::POD_NODE_ID),
    ("pod_node_id_0", Code::POD_NODE_ID_PATH),
    ("pod_node_id_1", Code::POD_NODE_ID_PATH),
    ("pod_ns_id", Code::POD_NS_ID),
    ("pod_ns_id_0", Code::POD_NS_ID_PATH),
    ("pod_ns_id_1", Code::POD_NS_ID_PATH),
    ("protocol", Code::PROTOCOL),
    ("region_id", Code::REGION_ID),
    ("region_id_0", Code::REGION_ID_PATH),
    ("region_id_1", Code::REGION_ID_PATH),
    ("role", Code::DIRECTION),
    ("server_port", Code::SERVER_PORT),
    ("service_id", Code::SERVICE_ID),
    ("service_id_0", Code::SERVICE_ID_PATH),
    ("service_id_1", Code::SERVICE_ID_PATH),
    ("signal_source", Code::SIGNAL_SOURCE),
    ("subnet_id", Code::SUBNET_ID),
    ("subnet_id_0", Code::SUBNET_ID_PATH),
    ("subnet_id_1", Code::SUBNET_ID_PATH),
    ("team_id", Code::VTAP_ID),
    ("tunnel_ip_id", Code::TUNNEL_IP_ID),
];

/// Byte-wise `a < b`.
const fn key_lt(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut i = 0;
    while i < a.len() && i < b.len() {
        if a[i] != b[i] {
            return a[i] < b[i];
        }
        i += 1;
    }
    a.len() < b.len()
}

const fn bit_index(code: Code) -> u32 {
    code.0.trailing_zeros()
}

// Every named flag is a single bit, no two share a position, each range
// respects its ceiling, and the key table is sorted and covers every
// named flag except MAC.
const _: () = {
    let named = Code::NAMED;
    let mut seen = 0u64;
    let mut i = 0;
    while i < named.len() {
        let code = named[i].1;
        assert!(code.0.count_ones() == 1, "flag must be a single bit");
        assert!(seen & code.0 == 0, "two flags share a bit");
        seen |= code.0;
        let bit = bit_index(code);
        assert!(bit <= EXTENDED_MAX_BIT, "flag above bit 62");
        if bit < PATH_OFFSET {
            assert!(bit <= PRIMARY_MAX_BIT);
        } else if bit < 40 {
            assert!(bit <= PATH_MAX_BIT);
        }
        i += 1;
    }

    let mut owners = 0u64;
    let mut j = 0;
    while j < TAG_KEYS.len() {
        if j > 0 {
            assert!(key_lt(TAG_KEYS[j - 1].0, TAG_KEYS[j].0), "keys must ascend");
        }
        let owner = TAG_KEYS[j].1;
        owners |= owner.0;
        j += 1;
    }
    let mac = Code::MAC.0 | Code::MAC_PATH.0;
    assert!(owners == seen & !mac, "every non-MAC flag owns a key");
};

impl BitOr for Code {
    type Output = Code;

    #[inline]
    fn bitor(self, rhs: Code) -> Code {
        self.union(rhs)
    }
}

impl BitOrAssign for Code {
    #[inline]
    fn bitor_assign(&mut self, rhs: Code) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Code {
    type Output = Code;

    #[inline]
    fn bitand(self, rhs: Code) -> Code {
        Code(self.0 & rhs.0)
    }
}

impl Not for Code {
    type Output = Code;

    #[inline]
    fn not(self) -> Code {
        Code(!self.0)
    }
}

impl From<u64> for Code {
    fn from(bits: u64) -> Self {
        Code(bits)
    }
}

impl From<Code> for u64 {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code(0x{:016x})", self.0)
    }
}

impl fmt::LowerHex for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
