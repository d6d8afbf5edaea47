//! Flow direction, capture-side composites and the observation-point tokens.
//!
//! A composite byte keeps the direction in its low three bits and the
//! architectural layer (`SideType`) in the upper five.

use crate::core::error::{FlowTagError, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

const CLIENT_SERVER_MASK: u8 = 0x7;
const SIDE_TYPE_MASK: u8 = 0xf8;

/// Architectural layer a record was captured at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SideType {
    Plain = 0,
    Node = 1 << 3,
    Hypervisor = 2 << 3,
    GatewayHypervisor = 3 << 3,
    Gateway = 4 << 3,
    Process = 5 << 3,
    App = 6 << 3,
}

impl SideType {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits & SIDE_TYPE_MASK {
            0 => Some(Self::Plain),
            0x08 => Some(Self::Node),
            0x10 => Some(Self::Hypervisor),
            0x18 => Some(Self::GatewayHypervisor),
            0x20 => Some(Self::Gateway),
            0x28 => Some(Self::Process),
            0x30 => Some(Self::App),
            _ => None,
        }
    }
}

/// Raw direction byte as sent by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Direction(pub u8);

impl Direction {
    pub const CLIENT_TO_SERVER: u8 = 1;
    pub const SERVER_TO_CLIENT: u8 = 2;
    pub const LOCAL_TO_LOCAL: u8 = 4;

    /// Combines a direction with the layer it was observed at.
    pub const fn with_side(direction: u8, side: SideType) -> Self {
        Direction(direction | side as u8)
    }

    pub fn is_client_to_server(self) -> bool {
        self.0 & CLIENT_SERVER_MASK == Self::CLIENT_TO_SERVER
    }

    pub fn is_server_to_client(self) -> bool {
        self.0 & CLIENT_SERVER_MASK == Self::SERVER_TO_CLIENT
    }

    pub fn side_type(self) -> Option<SideType> {
        SideType::from_bits(self.0)
    }

    pub fn is_gateway(self) -> bool {
        matches!(
            self.side_type(),
            Some(SideType::Gateway | SideType::GatewayHypervisor)
        )
    }

    pub fn to_role(self) -> Role {
        match self.0 & CLIENT_SERVER_MASK {
            Self::CLIENT_TO_SERVER => Role::Client,
            Self::SERVER_TO_CLIENT => Role::Server,
            Self::LOCAL_TO_LOCAL => Role::Local,
            _ => Role::Rest,
        }
    }

    /// The same bits read as an observation point.
    pub fn to_tap_side(self) -> TapSide {
        TapSide(self.0)
    }
}

/// Which end of the flow the metric describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Role {
    #[default]
    Client = 0,
    Server = 1,
    Local = 2,
    Rest = 3,
}

impl Role {
    /// Text form written into the `role` key.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "c2s",
            Role::Server => "s2c",
            Role::Local => "local",
            Role::Rest => "rest",
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Observation point: direction and capture layer in one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TapSide(pub u8);

impl TapSide {
    pub const REST: TapSide = TapSide(0);
    pub const CLIENT: TapSide = TapSide(1);
    pub const SERVER: TapSide = TapSide(2);
    pub const LOCAL: TapSide = TapSide(4);
    pub const CLIENT_NODE: TapSide = Self::compose(1, SideType::Node);
    pub const SERVER_NODE: TapSide = Self::compose(2, SideType::Node);
    pub const CLIENT_HYPERVISOR: TapSide = Self::compose(1, SideType::Hypervisor);
    pub const SERVER_HYPERVISOR: TapSide = Self::compose(2, SideType::Hypervisor);
    pub const CLIENT_GATEWAY_HYPERVISOR: TapSide = Self::compose(1, SideType::GatewayHypervisor);
    pub const SERVER_GATEWAY_HYPERVISOR: TapSide = Self::compose(2, SideType::GatewayHypervisor);
    pub const CLIENT_GATEWAY: TapSide = Self::compose(1, SideType::Gateway);
    pub const SERVER_GATEWAY: TapSide = Self::compose(2, SideType::Gateway);
    pub const CLIENT_PROCESS: TapSide = Self::compose(1, SideType::Process);
    pub const SERVER_PROCESS: TapSide = Self::compose(2, SideType::Process);
    pub const CLIENT_APP: TapSide = Self::compose(1, SideType::App);
    pub const SERVER_APP: TapSide = Self::compose(2, SideType::App);
    pub const APP: TapSide = Self::compose(0, SideType::App);

    const fn compose(direction: u8, side: SideType) -> TapSide {
        TapSide(direction | side as u8)
    }

    /// Every legal composite and its token.
    pub const ALL: [(TapSide, &'static str); 17] = [
        (Self::REST, "rest"),
        (Self::CLIENT, "c"),
        (Self::SERVER, "s"),
        (Self::LOCAL, "local"),
        (Self::CLIENT_NODE, "c-nd"),
        (Self::SERVER_NODE, "s-nd"),
        (Self::CLIENT_HYPERVISOR, "c-hv"),
        (Self::SERVER_HYPERVISOR, "s-hv"),
        (Self::CLIENT_GATEWAY_HYPERVISOR, "c-gw-hv"),
        (Self::SERVER_GATEWAY_HYPERVISOR, "s-gw-hv"),
        (Self::CLIENT_GATEWAY, "c-gw"),
        (Self::SERVER_GATEWAY, "s-gw"),
        (Self::CLIENT_PROCESS, "c-p"),
        (Self::SERVER_PROCESS, "s-p"),
        (Self::CLIENT_APP, "c-app"),
        (Self::SERVER_APP, "s-app"),
        (Self::APP, "app"),
    ];

    /// Token for a legal composite, `None` for any other byte.
    pub fn as_str(self) -> Option<&'static str> {
        Self::ALL
            .iter()
            .find(|(side, _)| *side == self)
            .map(|(_, token)| *token)
    }

    /// Like [`TapSide::as_str`] but reports illegal composites as an error.
    pub fn try_as_str(self) -> Result<&'static str> {
        self.as_str().ok_or(FlowTagError::UnknownTapSide(self.0))
    }

    pub fn is_legal(self) -> bool {
        self.as_str().is_some()
    }
}

impl fmt::Display for TapSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(token) => f.write_str(token),
            None => write!(f, "unknown(0x{:02x})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_values() {
        assert_eq!(TapSide::CLIENT_NODE.0, 9);
        assert_eq!(TapSide::SERVER_GATEWAY_HYPERVISOR.0, 26);
        assert_eq!(TapSide::APP.0, 48);
        assert_eq!(TapSide::SERVER_APP.0, 50);
    }

    #[test]
    fn test_token_table_matches_lookup() {
        for (side, token) in TapSide::ALL {
            assert_eq!(side.as_str(), Some(token));
        }
        let legal = (0..=u8::MAX).filter(|b| TapSide(*b).is_legal()).count();
        assert_eq!(legal, TapSide::ALL.len());
    }

    #[test]
    fn test_illegal_composite_is_reported() {
        assert_eq!(TapSide(3).as_str(), None);
        assert!(matches!(
            TapSide(0xff).try_as_str(),
            Err(FlowTagError::UnknownTapSide(0xff))
        ));
        assert_eq!(TapSide(3).to_string(), "unknown(0x03)");
    }

    #[test]
    fn test_direction_to_role() {
        assert_eq!(Direction(1).to_role(), Role::Client);
        assert_eq!(Direction::with_side(2, SideType::Hypervisor).to_role(), Role::Server);
        assert_eq!(Direction(4).to_role(), Role::Local);
        assert_eq!(Direction(0).to_role(), Role::Rest);
        assert_eq!(Direction(3).to_role(), Role::Rest);
    }

    #[test]
    fn test_direction_predicates() {
        let d = Direction::with_side(Direction::SERVER_TO_CLIENT, SideType::Gateway);
        assert!(d.is_server_to_client());
        assert!(!d.is_client_to_server());
        assert!(d.is_gateway());
        assert!(!Direction::with_side(1, SideType::Process).is_gateway());
        assert_eq!(d.to_tap_side(), TapSide::SERVER_GATEWAY);
    }
}
