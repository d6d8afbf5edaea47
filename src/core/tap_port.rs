use serde::{Deserialize, Serialize};
use std::fmt;

// 64    60         48          40            32                              0
// +-----+----------+-----------+-------------+-------------------------------+
// | nic | reserved | nat       | tunnel type | nic id (ip / id / mac low 32) |
// | type|          | source    |             |                               |
// +-----+----------+-----------+-------------+-------------------------------+
const TUNNEL_TYPE_OFFSET: u32 = 32;
const NAT_SOURCE_OFFSET: u32 = 40;
const NIC_TYPE_OFFSET: u32 = 60;

/// Composite capture identifier: NIC id plus its type, NAT source and tunnel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TapPort(pub u64);

impl TapPort {
    pub const NIC_TYPE_MAC: u8 = 0;
    pub const NIC_TYPE_IPV4: u8 = 1;
    pub const NIC_TYPE_IPV6: u8 = 2;
    pub const NIC_TYPE_ID: u8 = 3;
    pub const NIC_TYPE_NETFLOW: u8 = 4;
    pub const NIC_TYPE_SFLOW: u8 = 5;

    pub const NAT_SOURCE_NONE: u8 = 0;
    pub const NAT_SOURCE_VIP: u8 = 1;
    pub const NAT_SOURCE_TOA: u8 = 2;

    pub fn from_parts(nic: u32, nic_type: u8, nat_source: u8, tunnel_type: u8) -> Self {
        TapPort(
            u64::from(nic)
                | (u64::from(tunnel_type) << TUNNEL_TYPE_OFFSET)
                | (u64::from(nat_source) << NAT_SOURCE_OFFSET)
                | (u64::from(nic_type & 0xf) << NIC_TYPE_OFFSET),
        )
    }

    /// Splits into `(nic, nic_type, nat_source, tunnel_type)`.
    pub fn split(self) -> (u32, u8, u8, u8) {
        (
            self.0 as u32,
            (self.0 >> NIC_TYPE_OFFSET) as u8,
            (self.0 >> NAT_SOURCE_OFFSET) as u8,
            (self.0 >> TUNNEL_TYPE_OFFSET) as u8,
        )
    }
}

/// Low 32 bits as eight lowercase hex digits, the `capture_nic` text form.
impl fmt::Display for TapPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split() {
        let port = TapPort::from_parts(0xdead_beef, TapPort::NIC_TYPE_IPV4, TapPort::NAT_SOURCE_TOA, 3);
        assert_eq!(port.split(), (0xdead_beef, 1, 2, 3));
        assert_eq!(TapPort::default().split(), (0, 0, 0, 0));
    }

    #[test]
    fn test_text_form_is_padded_low_word() {
        assert_eq!(TapPort(0x1a).to_string(), "0000001a");
        let port = TapPort::from_parts(0x0102_0304, TapPort::NIC_TYPE_ID, 0, 1);
        assert_eq!(port.to_string(), "01020304");
    }
}
