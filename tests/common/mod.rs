//! Common test utilities and fixtures.

#![allow(dead_code)]

use flowtag::codec::KvSink;
use flowtag::core::{Role, TapPort, TapSide};
use flowtag::{Code, Field, MiniField, MiniTag};
use std::fmt;
use std::net::Ipv4Addr;

pub fn ipv4(s: &str) -> u32 {
    u32::from(s.parse::<Ipv4Addr>().unwrap())
}

/// Sink that only records keys, for comparing against column names.
#[derive(Debug, Default)]
pub struct KeyCollector {
    pub keys: Vec<String>,
}

impl KvSink for KeyCollector {
    fn put(&mut self, key: &str, _value: fmt::Arguments<'_>) {
        self.keys.push(key.to_string());
    }
}

/// A field with every one-sided and edge attribute set to something
/// non-zero, so every key a code selects produces output.
pub fn populated_field() -> Field {
    let mut field = Field {
        global_thread_id: 2,
        is_ipv4: true,
        ip: ipv4("10.0.0.1"),
        ip1: ipv4("10.0.0.2"),
        l3_epc_id: 5,
        l3_epc_id1: -2,
        region_id: 1,
        region_id1: 1,
        az_id: 3,
        az_id1: 4,
        host_id: 6,
        host_id1: 7,
        pod_id: 100,
        pod_id1: 101,
        gpid: 900,
        gpid1: 901,
        role: Role::Server,
        protocol: 6,
        server_port: 443,
        vtap_id: 12,
        team_id: 1,
        tap_port: TapPort::from_parts(0xdead, TapPort::NIC_TYPE_MAC, 0, 0),
        tap_side: TapSide::CLIENT_NODE,
        tap_type: 3,
        l7_protocol: 1,
        app_service: "checkout".to_string(),
        app_instance: "checkout-0".to_string(),
        endpoint: "/pay".to_string(),
        signal_source: 1,
        tunnel_ip_id: 8,
        ..Default::default()
    };
    field.tap_side_str = "c-nd";
    field
}

pub fn mini_record(code: Code, field: MiniField) -> MiniTag {
    MiniTag {
        field: Some(field),
        code: code.bits(),
    }
}
