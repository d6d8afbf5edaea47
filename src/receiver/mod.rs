//! Wire decoder: builds a [`Tag`] from an agent's protobuf record.
//!
//! Decoding never fails on missing sub-fields; older agents omit them and
//! the zero value is the right default. Only malformed protobuf bytes are an
//! error.

pub mod pb;

use crate::codec::marshal_i32_with_special_id;
use crate::core::field::copy_into;
use crate::core::{Code, Direction, Result, Role, Tag, TapPort, TapSide};
use crate::pool::{acquire_tag, release_tag};
use bytes::Buf;
use pb::{MiniField, MiniTag};
use prost::Message;

impl Tag {
    /// Overwrites this tag from an inbound record.
    ///
    /// Expects a zero-valued tag, e.g. one fresh from the pool: side-0/1 pod
    /// ids are only written when the record carries one.
    pub fn read_from_pb(&mut self, p: &MiniTag) {
        let empty = MiniField::default();
        let f = p.field.as_ref().unwrap_or(&empty);

        self.code = Code::from(p.code);
        self.global_thread_id = f.global_thread_id as u8;
        self.is_ipv4 = f.is_ipv6 == 0;
        let is_path = self.code.has(Code::IP_PATH);
        if self.is_ipv4 {
            self.ip = be_u32(&f.ip);
            if is_path {
                self.ip1 = be_u32(&f.ip1);
            }
        } else {
            copy_into(&mut self.field.ip6, &f.ip);
            if is_path {
                copy_into(&mut self.field.ip61, &f.ip1);
            }
        }

        self.mac = f.mac;
        self.mac1 = f.mac1;
        // out-of-range negatives fold back into the 16-bit id space
        self.l3_epc_id = marshal_i32_with_special_id(f.l3_epc_id);
        self.l3_epc_id1 = marshal_i32_with_special_id(f.l3_epc_id1);
        self.role = Direction(f.direction as u8).to_role();

        self.tap_side = TapSide(f.tap_side as u8);
        self.tap_side_str = match self.tap_side.as_str() {
            Some(token) => token,
            None => {
                tracing::debug!(
                    "Unknown observation point 0x{:02x} in record with code 0x{:x}",
                    f.tap_side,
                    self.code
                );
                ""
            }
        };

        self.protocol = f.protocol as u8;
        self.acl_gid = f.acl_gid as u16;
        self.server_port = f.server_port as u16;
        self.vtap_id = f.vtap_id as u16;
        self.tap_port = TapPort(f.tap_port);
        let (nic, nic_type, nat_source, tunnel_type) = self.tap_port.split();
        self.nic = nic;
        self.nic_type = nic_type;
        self.nat_source = nat_source;
        self.tunnel_type = tunnel_type;
        self.tap_type = f.tap_type as u8;
        self.l7_protocol = f.l7_protocol as u8;
        self.app_service.clone_from(&f.app_service);
        self.app_instance.clone_from(&f.app_instance);
        self.endpoint.clone_from(&f.endpoint);
        self.biz_type = f.biz_type as u8;

        // records from agents predating the process and signal dimensions
        if is_path {
            self.code |= Code::GPID_PATH | Code::SIGNAL_SOURCE;
        } else if self.code != Code::TRAFFIC_POLICY {
            self.code |= Code::GPID | Code::SIGNAL_SOURCE;
        }
        self.gpid = f.gpid;
        self.gpid1 = f.gpid1;

        if f.pod_id != 0 {
            if is_path && self.role == Role::Server {
                self.pod_id1 = f.pod_id;
            } else {
                self.pod_id = f.pod_id;
            }
        }
        self.signal_source = f.signal_source as u16;

        // policy tags carry the distribution point in the server port slot
        if self.code.has(Code::TUNNEL_IP_ID) {
            self.tunnel_ip_id = f.server_port as u16;
        }
    }
}

/// Decodes one encoded `MiniTag` into a pooled tag.
pub fn decode_tag<B: Buf>(buf: B) -> Result<Box<Tag>> {
    let record = MiniTag::decode(buf)?;
    let mut tag = acquire_tag();
    tag.read_from_pb(&record);
    Ok(tag)
}

/// Decodes a batch of length-delimited `MiniTag`s, releasing everything
/// already decoded if one of them is malformed.
pub fn decode_tags<B: Buf>(mut buf: B) -> Result<Vec<Box<Tag>>> {
    let mut tags = Vec::new();
    while buf.has_remaining() {
        match MiniTag::decode_length_delimited(&mut buf) {
            Ok(record) => {
                let mut tag = acquire_tag();
                tag.read_from_pb(&record);
                tags.push(tag);
            }
            Err(e) => {
                for tag in tags {
                    release_tag(Some(tag));
                }
                return Err(e.into());
            }
        }
    }
    Ok(tags)
}

/// Big-endian IPv4 from up to the first four bytes; short input is
/// zero-padded on the right.
fn be_u32(bytes: &[u8]) -> u32 {
    let mut octets = [0u8; 4];
    let n = bytes.len().min(4);
    octets[..n].copy_from_slice(&bytes[..n]);
    u32::from_be_bytes(octets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn record(code: Code, field: MiniField) -> MiniTag {
        MiniTag {
            field: Some(field),
            code: code.bits(),
        }
    }

    fn decode(p: &MiniTag) -> Tag {
        let mut tag = Tag::default();
        tag.read_from_pb(p);
        tag
    }

    #[test]
    fn test_ipv4_worked_example() {
        let p = record(
            Code::IP | Code::SERVER_PORT,
            MiniField {
                ip: vec![192, 0, 2, 1],
                server_port: 8080,
                ..Default::default()
            },
        );
        let tag = decode(&p);
        assert!(tag.is_ipv4);
        assert_eq!(tag.ip4_addr().to_string(), "192.0.2.1");
        assert!(tag.ip6.is_none());
        assert_eq!(tag.code, Code::IP | Code::SERVER_PORT | Code::GPID | Code::SIGNAL_SOURCE);
        assert_eq!(
            tag.to_kv_string(),
            ",gprocess_id=0,ip=192.0.2.1,ip_version=4,server_port=8080,signal_source=0"
        );
    }

    #[test]
    fn test_ipv6_path_reuses_buffers() {
        let a: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let b: Ipv6Addr = "2001:db8::2".parse().unwrap();
        let p = record(
            Code::IP_PATH,
            MiniField {
                is_ipv6: 1,
                ip: a.octets().to_vec(),
                ip1: b.octets().to_vec(),
                ..Default::default()
            },
        );

        let mut tag = Tag::default();
        tag.set_ip6(Ipv6Addr::UNSPECIFIED);
        let ptr = tag.ip6.as_ref().unwrap().as_ptr();
        tag.read_from_pb(&p);

        assert!(!tag.is_ipv4);
        assert_eq!(tag.ip6.as_ref().unwrap().as_ptr(), ptr);
        assert_eq!(tag.ip6_addr(), Some(a));
        assert_eq!(tag.ip61_addr(), Some(b));
    }

    #[test]
    fn test_short_ip_bytes_do_not_panic() {
        let p = record(
            Code::IP_PATH,
            MiniField {
                ip: vec![10, 1],
                is_ipv6: 0,
                ..Default::default()
            },
        );
        let tag = decode(&p);
        assert_eq!(tag.ip, 0x0a01_0000);
        assert_eq!(tag.ip1, 0);
    }

    #[test]
    fn test_missing_field_uses_defaults() {
        let p = MiniTag {
            field: None,
            code: Code::NETWORK.bits(),
        };
        let tag = decode(&p);
        assert!(tag.is_ipv4);
        assert_eq!(tag.ip, 0);
        assert_eq!(tag.tap_side_str, "rest");
        assert_eq!(tag.role, Role::Rest);
    }

    #[test]
    fn test_compat_bits() {
        let tag = decode(&record(Code::NETWORK_MAP, MiniField::default()));
        assert!(tag.code.has(Code::GPID_PATH));
        assert!(!tag.code.has(Code::GPID));

        let tag = decode(&record(Code::TRAFFIC_POLICY, MiniField::default()));
        assert_eq!(tag.code, Code::TRAFFIC_POLICY);
    }

    #[test]
    fn test_edge_pod_role() {
        let server = MiniField {
            pod_id: 42,
            direction: u32::from(Direction::SERVER_TO_CLIENT),
            ..Default::default()
        };
        let tag = decode(&record(Code::NETWORK_MAP, server.clone()));
        assert_eq!(tag.role, Role::Server);
        assert_eq!(tag.pod_id1, 42);
        assert_eq!(tag.pod_id, 0);

        // one-sided records always use side 0
        let tag = decode(&record(Code::NETWORK, server));
        assert_eq!(tag.pod_id, 42);
        assert_eq!(tag.pod_id1, 0);
    }

    #[test]
    fn test_epc_and_tap_fields() {
        let p = record(
            Code::NETWORK_MAP,
            MiniField {
                l3_epc_id: -2,
                l3_epc_id1: -3,
                tap_side: u32::from(TapSide::SERVER_PROCESS.0),
                tap_port: TapPort::from_parts(0x1234, 1, 2, 3).0,
                app_service: "svc".to_string(),
                ..Default::default()
            },
        );
        let tag = decode(&p);
        assert_eq!(tag.l3_epc_id, -2);
        assert_eq!(tag.l3_epc_id1, 65533);
        assert_eq!(tag.tap_side_str, "s-p");
        assert_eq!((tag.nic, tag.nic_type, tag.nat_source, tag.tunnel_type), (0x1234, 1, 2, 3));
        assert_eq!(tag.app_service, "svc");
    }

    #[test]
    fn test_illegal_tap_side_is_empty() {
        let p = record(
            Code::NETWORK_MAP,
            MiniField {
                tap_side: 0x07,
                ..Default::default()
            },
        );
        let tag = decode(&p);
        assert_eq!(tag.tap_side, TapSide(0x07));
        assert_eq!(tag.tap_side_str, "");
        assert!(!tag.to_kv_string().contains("observation_point"));
    }

    #[test]
    fn test_tunnel_ip_id_aliases_server_port() {
        let field = MiniField {
            server_port: 17,
            ..Default::default()
        };
        let tag = decode(&record(Code::TRAFFIC_POLICY, field.clone()));
        assert_eq!(tag.tunnel_ip_id, 17);
        assert_eq!(tag.server_port, 17);

        let tag = decode(&record(Code::NETWORK, field));
        assert_eq!(tag.tunnel_ip_id, 0);
    }

    #[test]
    fn test_decode_from_bytes() {
        let p = record(
            Code::NETWORK,
            MiniField {
                vtap_id: 9,
                ..Default::default()
            },
        );
        let tag = decode_tag(p.encode_to_vec().as_slice()).unwrap();
        assert_eq!(tag.vtap_id, 9);
        release_tag(Some(tag));

        assert!(decode_tag(&[0xff, 0xff, 0xff][..]).is_err());
    }

    #[test]
    fn test_decode_batch() {
        let mut buf = Vec::new();
        for vtap_id in 1..=3 {
            record(
                Code::NETWORK,
                MiniField {
                    vtap_id,
                    ..Default::default()
                },
            )
            .encode_length_delimited(&mut buf)
            .unwrap();
        }
        let tags = decode_tags(buf.as_slice()).unwrap();
        let ids: Vec<_> = tags.iter().map(|t| t.vtap_id).collect();
        assert_eq!(ids, [1, 2, 3]);

        buf.push(0x05);
        assert!(decode_tags(buf.as_slice()).is_err());
    }
}
