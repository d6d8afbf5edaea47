//! Encoder and schema agreement: for every table, the text keys and the tag
//! columns come from the same ordered key table, so they match in presence
//! and in order.

mod common;

use common::{populated_field, KeyCollector};
use flowtag::codec::{encode_key, encode_tag};
use flowtag::schema::{gen_order_keys, gen_tag_columns, key_columns, Column};
use flowtag::{get_metrics_tables, Code, MetricsTableId, Tag};
use pretty_assertions::assert_eq;

/// IP keys carry the address as text; the columns split it by family.
const TEXT_ONLY_KEYS: [&str; 4] = ["ip", "ip_0", "ip_1", "ip_version"];

fn emitted_keys(code: Code) -> Vec<String> {
    let mut sink = KeyCollector::default();
    encode_tag(&Tag::new(populated_field(), code), &mut sink);
    sink.keys
}

fn column_names(code: Code) -> Vec<&'static str> {
    gen_tag_columns(code).iter().map(|c| c.name).collect()
}

fn codes_under_test() -> Vec<(String, Code)> {
    let mut codes: Vec<(String, Code)> = MetricsTableId::MINUTE
        .iter()
        .map(|id| (id.to_string(), id.table_code()))
        .collect();
    codes.extend(Code::NAMED.iter().map(|(name, flag)| (name.to_string(), *flag)));
    codes
}

#[test]
fn test_encoder_emits_exactly_the_gated_keys() {
    for (name, code) in codes_under_test() {
        let mut expected = vec!["_tid".to_string()];
        expected.extend(code.keys().map(str::to_string));
        assert_eq!(emitted_keys(code), expected, "{}", name);
    }
}

#[test]
fn test_columns_follow_key_order() {
    for (name, code) in codes_under_test() {
        let mut expected = vec!["time", "_tid"];
        for key in code.keys() {
            let mut columns: Vec<Column> = Vec::new();
            key_columns(key, &mut columns);
            assert!(!columns.is_empty(), "{}: key {} has no column", name, key);
            expected.extend(columns.iter().map(|c| c.name));
        }
        assert_eq!(column_names(code), expected, "{}", name);
    }
}

#[test]
fn test_keys_are_an_ordered_subsequence_of_columns() {
    for (name, code) in codes_under_test() {
        let columns = column_names(code);
        let mut rest = columns.iter();
        for key in emitted_keys(code)
            .iter()
            .filter(|k| !TEXT_ONLY_KEYS.contains(&k.as_str()))
        {
            assert!(
                rest.any(|column| *column == key.as_str()),
                "{}: key {} missing or out of order in {:?}",
                name,
                key,
                columns
            );
        }
    }
}

#[test]
fn test_mac_flags_produce_neither() {
    let code = Code::MAC | Code::MAC_PATH;
    assert_eq!(emitted_keys(code), vec!["_tid".to_string()]);
    assert_eq!(column_names(code), vec!["time", "_tid"]);

    let mut sink = KeyCollector::default();
    encode_key("mac", &populated_field(), &mut sink);
    assert!(sink.keys.is_empty());
}

#[test]
fn test_order_keys_are_columns() {
    for table in get_metrics_tables(&Default::default()) {
        let names: Vec<&str> = table.column_names().collect();
        for key in &table.order_keys {
            assert!(names.contains(key), "{} order key {} is not a column", table.id, key);
        }
    }
}

#[test]
fn test_network_column_order() {
    assert_eq!(
        column_names(Code::NETWORK),
        vec![
            "time",
            "_tid",
            "agent_id",
            "auto_instance_id",
            "auto_instance_type",
            "auto_service_id",
            "auto_service_type",
            "az_id",
            "capture_network_type_id",
            "gprocess_id",
            "host_id",
            "ip4",
            "ip6",
            "tag_source",
            "is_ipv4",
            "is_key_service",
            "l3_device_id",
            "l3_device_type",
            "l3_epc_id",
            "pod_cluster_id",
            "pod_group_id",
            "pod_id",
            "pod_node_id",
            "pod_ns_id",
            "protocol",
            "region_id",
            "role",
            "server_port",
            "service_id",
            "signal_source",
            "subnet_id",
            "team_id",
        ]
    );
}

#[test]
fn test_acl_selects_policy_ordering_key() {
    let (keys, aggr) = gen_order_keys(Code::ACL_GID);
    assert_eq!(keys.as_slice(), &["time", "acl_gid"]);
    assert!(!aggr);
}
