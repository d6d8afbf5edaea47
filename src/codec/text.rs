//! Line-protocol text encoding of a tag.
//!
//! A tag is written as a run of `,key=value` segments in strictly ascending
//! key order ([`Code::keys`](crate::core::Code::keys), with `_tid` first when non-zero), so equal
//! tags always produce byte-identical text.

use crate::codec::special_id::marshal_i32_with_special_id;
use crate::core::{Field, Tag};
use std::fmt::{self, Write};
use std::net::Ipv6Addr;

/// Upper bound on the encoded size of any tag.
pub const MAX_STRING_LENGTH: usize = 8192;

/// Longest application string (service, instance, endpoint) written out.
/// Longer values are cut at a character boundary, so the text of such a tag
/// differs from the full value.
pub const MAX_APP_FIELD_LEN: usize = 1024;

/// Receives the key/value stream of a tag in emission order.
pub trait KvSink {
    fn put(&mut self, key: &str, value: fmt::Arguments<'_>);
}

/// Writes `,key=value` segments into a caller-supplied buffer.
///
/// Running past the end of the buffer panics; callers size the buffer with
/// [`MAX_STRING_LENGTH`].
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Write for SliceSink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

impl KvSink for SliceSink<'_> {
    fn put(&mut self, key: &str, value: fmt::Arguments<'_>) {
        // write_str never fails
        let _ = write!(self, ",{}={}", key, value);
    }
}

impl KvSink for String {
    fn put(&mut self, key: &str, value: fmt::Arguments<'_>) {
        let _ = write!(self, ",{}={}", key, value);
    }
}

impl Tag {
    /// Writes the tag's `,key=value` fragment into `buf` and returns the
    /// number of bytes written.
    pub fn marshal_to(&self, buf: &mut [u8; MAX_STRING_LENGTH]) -> usize {
        let mut sink = SliceSink::new(buf);
        encode_tag(self, &mut sink);
        sink.len()
    }

    pub fn to_kv_string(&self) -> String {
        let mut out = String::with_capacity(256);
        encode_tag(self, &mut out);
        out
    }
}

/// Feeds every present key of `tag` to `sink` in ascending key order.
pub fn encode_tag<S: KvSink>(tag: &Tag, sink: &mut S) {
    if tag.field.global_thread_id != 0 {
        sink.put("_tid", format_args!("{}", tag.field.global_thread_id));
    }
    for key in tag.code.keys() {
        encode_key(key, &tag.field, sink);
    }
}

macro_rules! put {
    ($sink:ident, $key:ident, $value:expr) => {
        $sink.put($key, format_args!("{}", $value))
    };
}

/// Emits a single key of [`Code::keys`](crate::core::Code::keys). Unknown keys and an
/// observation point missing from the token table emit nothing.
pub fn encode_key<S: KvSink>(key: &'static str, f: &Field, sink: &mut S) {
    match key {
        "acl_gid" => put!(sink, key, f.acl_gid),
        "agent_id" => put!(sink, key, f.vtap_id),
        "app_instance" => put!(sink, key, bounded(&f.app_instance)),
        "app_service" => put!(sink, key, bounded(&f.app_service)),
        "auto_instance_id" | "auto_instance_id_0" => put!(sink, key, f.auto_instance_id),
        "auto_instance_id_1" => put!(sink, key, f.auto_instance_id1),
        "auto_instance_type" | "auto_instance_type_0" => put!(sink, key, f.auto_instance_type),
        "auto_instance_type_1" => put!(sink, key, f.auto_instance_type1),
        "auto_service_id" | "auto_service_id_0" => put!(sink, key, f.auto_service_id),
        "auto_service_id_1" => put!(sink, key, f.auto_service_id1),
        "auto_service_type" | "auto_service_type_0" => put!(sink, key, f.auto_service_type),
        "auto_service_type_1" => put!(sink, key, f.auto_service_type1),
        "az_id" | "az_id_0" => put!(sink, key, f.az_id),
        "az_id_1" => put!(sink, key, f.az_id1),
        "biz_type" => put!(sink, key, f.biz_type),
        "capture_network_type_id" => put!(sink, key, f.tap_type),
        "capture_nic" => put!(sink, key, f.tap_port),
        "endpoint" => put!(sink, key, bounded(&f.endpoint)),
        "gprocess_id" | "gprocess_id_0" => put!(sink, key, f.gpid),
        "gprocess_id_1" => put!(sink, key, f.gpid1),
        "host_id" | "host_id_0" => put!(sink, key, f.host_id),
        "host_id_1" => put!(sink, key, f.host_id1),
        "ip" | "ip_0" => {
            if f.is_ipv4 {
                put!(sink, key, f.ip4_addr())
            } else {
                put!(sink, key, ipv6_or_unspecified(f.ip6_addr()))
            }
        }
        "ip_1" => {
            if f.is_ipv4 {
                put!(sink, key, f.ip41_addr())
            } else {
                put!(sink, key, ipv6_or_unspecified(f.ip61_addr()))
            }
        }
        "ip_version" => put!(sink, key, if f.is_ipv4 { 4 } else { 6 }),
        "is_key_service" => put!(sink, key, u8::from(f.is_key_service)),
        "l3_device_id" | "l3_device_id_0" => put!(sink, key, f.l3_device_id),
        "l3_device_id_1" => put!(sink, key, f.l3_device_id1),
        "l3_device_type" | "l3_device_type_0" => put!(sink, key, f.l3_device_type.0),
        "l3_device_type_1" => put!(sink, key, f.l3_device_type1.0),
        "l3_epc_id" | "l3_epc_id_0" => put!(sink, key, marshal_i32_with_special_id(f.l3_epc_id)),
        "l3_epc_id_1" => put!(sink, key, marshal_i32_with_special_id(f.l3_epc_id1)),
        "l7_protocol" => put!(sink, key, f.l7_protocol),
        "observation_point" => {
            if let Some(token) = f.tap_side.as_str() {
                put!(sink, key, token)
            }
        }
        "pod_cluster_id" | "pod_cluster_id_0" => put!(sink, key, f.pod_cluster_id),
        "pod_cluster_id_1" => put!(sink, key, f.pod_cluster_id1),
        "pod_group_id" | "pod_group_id_0" => put!(sink, key, f.pod_group_id),
        "pod_group_id_1" => put!(sink, key, f.pod_group_id1),
        "pod_id" | "pod_id_0" => put!(sink, key, f.pod_id),
        "pod_id_1" => put!(sink, key, f.pod_id1),
        "pod_node_id" | "pod_node_id_0" => put!(sink, key, f.pod_node_id),
        "pod_node_id_1" => put!(sink, key, f.pod_node_id1),
        "pod_ns_id" | "pod_ns_id_0" => put!(sink, key, f.pod_ns_id),
        "pod_ns_id_1" => put!(sink, key, f.pod_ns_id1),
        "protocol" => put!(sink, key, f.protocol),
        "region_id" | "region_id_0" => put!(sink, key, f.region_id),
        "region_id_1" => put!(sink, key, f.region_id1),
        "role" => put!(sink, key, f.role.as_str()),
        "server_port" => put!(sink, key, f.server_port),
        "service_id" | "service_id_0" => put!(sink, key, f.service_id),
        "service_id_1" => put!(sink, key, f.service_id1),
        "signal_source" => put!(sink, key, f.signal_source),
        "subnet_id" | "subnet_id_0" => put!(sink, key, f.subnet_id),
        "subnet_id_1" => put!(sink, key, f.subnet_id1),
        "team_id" => put!(sink, key, f.team_id),
        "tunnel_ip_id" => put!(sink, key, f.tunnel_ip_id),
        _ => {}
    }
}

fn ipv6_or_unspecified(addr: Option<Ipv6Addr>) -> Ipv6Addr {
    addr.unwrap_or(Ipv6Addr::UNSPECIFIED)
}

/// Cuts `s` to at most [`MAX_APP_FIELD_LEN`] bytes without splitting a char.
fn bounded(s: &str) -> &str {
    if s.len() <= MAX_APP_FIELD_LEN {
        return s;
    }
    let mut end = MAX_APP_FIELD_LEN;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
