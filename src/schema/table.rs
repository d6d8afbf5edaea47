//! Metrics table identities and their generated definitions.
//!
//! Columns are produced by walking [`Code::keys`], the same sequence the
//! text encoder walks, so a table's tag columns line up with the keys of
//! every tag routed to it.

use crate::core::{Code, SchemaConfig};
use crate::schema::column::{Column, ColumnType, IndexType};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;

/// Database holding every metrics table.
pub const METRICS_DB: &str = "flow_metrics";
/// Suffix of the per-shard local table.
pub const LOCAL_SUFFIX: &str = "_local";
pub const TIME_KEY: &str = "time";

/// Identity of a metrics table. `Max` is the not-found sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum MetricsTableId {
    Network1m = 0,
    NetworkMap1m = 1,
    Application1m = 2,
    ApplicationMap1m = 3,
    TrafficPolicy1m = 4,
    Network1s = 5,
    NetworkMap1s = 6,
    Application1s = 7,
    ApplicationMap1s = 8,
    Max = 9,
}

impl MetricsTableId {
    /// Every real table, minute tables first.
    pub const ALL: [MetricsTableId; 9] = [
        Self::Network1m,
        Self::NetworkMap1m,
        Self::Application1m,
        Self::ApplicationMap1m,
        Self::TrafficPolicy1m,
        Self::Network1s,
        Self::NetworkMap1s,
        Self::Application1s,
        Self::ApplicationMap1s,
    ];

    pub const MINUTE: [MetricsTableId; 5] = [
        Self::Network1m,
        Self::NetworkMap1m,
        Self::Application1m,
        Self::ApplicationMap1m,
        Self::TrafficPolicy1m,
    ];

    /// Offset from a minute table to its second counterpart.
    pub const SECOND_OFFSET: u8 = Self::Network1s as u8;

    /// Out-of-range ids map to `Max`.
    pub fn from_u8(id: u8) -> Self {
        Self::ALL.get(usize::from(id)).copied().unwrap_or(Self::Max)
    }

    /// Unknown names map to `Max`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.table_name() == name)
            .unwrap_or(Self::Max)
    }

    /// Table name as referenced by queries; empty for `Max`.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Network1m => "network.1m",
            Self::NetworkMap1m => "network_map.1m",
            Self::Application1m => "application.1m",
            Self::ApplicationMap1m => "application_map.1m",
            Self::TrafficPolicy1m => "traffic_policy.1m",
            Self::Network1s => "network.1s",
            Self::NetworkMap1s => "network_map.1s",
            Self::Application1s => "application.1s",
            Self::ApplicationMap1s => "application_map.1s",
            Self::Max => "",
        }
    }

    /// Tag code routed to this table; empty for `Max`.
    pub fn table_code(self) -> Code {
        match self {
            Self::Network1m | Self::Network1s => Code::NETWORK,
            Self::NetworkMap1m | Self::NetworkMap1s => Code::NETWORK_MAP,
            Self::Application1m | Self::Application1s => Code::APPLICATION,
            Self::ApplicationMap1m | Self::ApplicationMap1s => Code::APPLICATION_MAP,
            Self::TrafficPolicy1m => Code::TRAFFIC_POLICY,
            Self::Max => Code::NONE,
        }
    }

    pub fn is_second(self) -> bool {
        (Self::SECOND_OFFSET..Self::Max as u8).contains(&(self as u8))
    }

    /// The second-resolution counterpart of a minute table.
    pub fn second(self) -> Option<MetricsTableId> {
        match self {
            Self::Network1m
            | Self::NetworkMap1m
            | Self::Application1m
            | Self::ApplicationMap1m => Some(Self::from_u8(self as u8 + Self::SECOND_OFFSET)),
            _ => None,
        }
    }
}

impl fmt::Display for MetricsTableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max => f.write_str("<unknown table>"),
            id => f.write_str(id.table_name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineType {
    #[default]
    MergeTree,
    ReplicatedMergeTree,
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineType::MergeTree => f.write_str("MergeTree"),
            EngineType::ReplicatedMergeTree => f.write_str("ReplicatedMergeTree"),
        }
    }
}

/// Partition granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartitionFunc {
    TwelveHour,
    FourHour,
}

impl PartitionFunc {
    pub fn expr(self, time_key: &str) -> String {
        let hours = match self {
            PartitionFunc::TwelveHour => 12,
            PartitionFunc::FourHour => 4,
        };
        format!("toStartOfInterval({}, INTERVAL {} hour)", time_key, hours)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColdStorageKind {
    Disk,
    Volume,
}

/// Moves parts older than `ttl` to a slower disk or volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColdStorage {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub kind: ColdStorageKind,
    pub name: String,
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

fn enabled_by_default() -> bool {
    true
}

/// Full definition of one metrics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub version: String,
    pub id: MetricsTableId,
    pub database: &'static str,
    pub db_type: String,
    pub local_name: String,
    pub global_name: String,
    pub columns: Vec<Column>,
    pub time_key: &'static str,
    pub ttl_hours: u64,
    pub partition_func: PartitionFunc,
    pub engine: EngineType,
    pub cluster: String,
    pub storage_policy: String,
    pub cold_storage: Option<ColdStorage>,
    pub order_keys: SmallVec<[&'static str; 8]>,
    pub primary_key_count: usize,
    /// Whether 1h/1d rollups are built from this table.
    pub aggr_1h_1d: bool,
}

/// Builds all nine tables, minute tables first.
pub fn get_metrics_tables(config: &SchemaConfig) -> Vec<Table> {
    let mut tables: Vec<Table> = MetricsTableId::MINUTE
        .iter()
        .map(|id| new_minute_table(*id, config))
        .collect();

    let seconds: Vec<Table> = tables
        .iter()
        .filter_map(|minute| {
            minute
                .id
                .second()
                .map(|id| new_second_table(minute, id, config))
        })
        .collect();
    tables.extend(seconds);

    tracing::info!(
        "Generated {} metrics tables in database {}",
        tables.len(),
        METRICS_DB
    );
    tables
}

fn new_minute_table(id: MetricsTableId, config: &SchemaConfig) -> Table {
    let code = id.table_code();
    let (order_keys, aggr_1h_1d) = gen_order_keys(code);

    Table {
        version: config.version.clone(),
        id,
        database: METRICS_DB,
        db_type: config.db_type.clone(),
        local_name: format!("{}{}", id.table_name(), LOCAL_SUFFIX),
        global_name: id.table_name().to_string(),
        columns: gen_tag_columns(code),
        time_key: TIME_KEY,
        ttl_hours: config.ttl_hours(id),
        partition_func: PartitionFunc::TwelveHour,
        engine: config.engine,
        cluster: config.cluster.clone(),
        storage_policy: config.storage_policy.clone(),
        cold_storage: config.cold_storage(id).cloned(),
        primary_key_count: order_keys.len(),
        order_keys,
        aggr_1h_1d,
    }
}

/// Derives a second table from its minute table.
fn new_second_table(minute: &Table, id: MetricsTableId, config: &SchemaConfig) -> Table {
    Table {
        id,
        local_name: format!("{}{}", id.table_name(), LOCAL_SUFFIX),
        global_name: id.table_name().to_string(),
        ttl_hours: config.ttl_hours(id),
        cold_storage: config.cold_storage(id).cloned(),
        partition_func: PartitionFunc::FourHour,
        // second data is never replicated
        engine: EngineType::MergeTree,
        aggr_1h_1d: false,
        ..minute.clone()
    }
}

/// Ordering key for a table code and whether rollups may be built from it.
pub fn gen_order_keys(code: Code) -> (SmallVec<[&'static str; 8]>, bool) {
    let mut keys: SmallVec<[&'static str; 8]> = SmallVec::new();
    keys.push(TIME_KEY);
    let mut aggr_1h_1d = true;

    if code.has(Code::L3_EPC_ID) {
        keys.extend_from_slice(&["l3_epc_id", "ip4", "ip6"]);
    } else if code.has(Code::L3_EPC_ID_PATH) {
        keys.extend_from_slice(&["l3_epc_id_1", "ip4_1", "ip6_1", "l3_epc_id_0", "ip4_0", "ip6_0"]);
    } else if code.has(Code::ACL_GID) {
        keys.push("acl_gid");
        aggr_1h_1d = false;
    }
    if code.has(Code::SERVER_PORT) {
        keys.push("server_port");
    }
    (keys, aggr_1h_1d)
}

/// Tag columns for a code: `time` and `_tid`, then the columns of each key.
pub fn gen_tag_columns(code: Code) -> Vec<Column> {
    let mut columns = vec![
        Column::with_group_by("time", ColumnType::DateTime),
        Column::new("_tid", ColumnType::UInt8)
            .comment("distinguishes the agent pipelines")
            .index(IndexType::None),
    ];
    for key in code.keys() {
        key_columns(key, &mut columns);
    }
    columns
}

const RESOURCE_TYPE_COMMENT: &str = "resource type, 0: IP address (no resource), 0-100: device type (10: pod, 14: pod node), 101-200: derived resources (101: pod group, 102: service), 201-255: other";

/// Appends the columns storing one text key of [`Code::keys`]. A key may map
/// to several columns (`ip` is stored as `ip4`/`ip6`, `capture_nic` carries
/// the split capture identifier) or, like `ip_version`, to one of another
/// name.
pub fn key_columns(key: &'static str, columns: &mut Vec<Column>) {
    use ColumnType::*;

    let col = Column::with_group_by;
    match key {
        "acl_gid" => columns.push(col(key, UInt16).comment("ACL group ID")),
        "agent_id" => columns.push(col(key, UInt16).comment("agent ID")),
        "app_instance" => columns.push(col(key, LowCardinalityString)),
        "app_service" => columns.push(col(key, LowCardinalityString)),
        "auto_instance_id" => columns.push(
            col(key, UInt32).comment("pod-first resource ID of ip: pod_id -> pod_node_id -> l3_device_id"),
        ),
        "auto_instance_id_0" => columns.push(
            col(key, UInt32).comment("pod-first resource ID of ip0: pod_id -> pod_node_id -> l3_device_id"),
        ),
        "auto_instance_id_1" => columns.push(
            col(key, UInt32).comment("pod-first resource ID of ip1: pod_id -> pod_node_id -> l3_device_id"),
        ),
        "auto_service_id" => columns.push(col(key, UInt32).comment(
            "service-first resource ID of ip: service_id -> pod_node_id -> l3_device_id",
        )),
        "auto_service_id_0" => columns.push(col(key, UInt32).comment(
            "service-first resource ID of ip0: service_id -> pod_node_id -> l3_device_id",
        )),
        "auto_service_id_1" => columns.push(col(key, UInt32).comment(
            "service-first resource ID of ip1: service_id -> pod_node_id -> l3_device_id",
        )),
        "auto_instance_type" | "auto_instance_type_0" | "auto_instance_type_1"
        | "auto_service_type" | "auto_service_type_0" | "auto_service_type_1" => {
            columns.push(col(key, UInt8).comment(RESOURCE_TYPE_COMMENT))
        }
        "az_id" => columns.push(col(key, UInt16).comment("availability zone ID")),
        "az_id_0" => columns.push(col(key, UInt16).comment("availability zone ID of ip4/6_0")),
        "az_id_1" => columns.push(col(key, UInt16).comment("availability zone ID of ip4/6_1")),
        "biz_type" => columns.push(col(key, UInt8).comment("Business Type")),
        "capture_network_type_id" => columns.push(col(key, UInt8).comment(
            "capture network type (1-2, 4-255: access network traffic, 3: cloud traffic)",
        )),
        "capture_nic" => columns.extend([
            col(key, UInt32).index(IndexType::None).comment(
                "capture nic; for cloud traffic the low 4 bytes of the virtual interface MAC",
            ),
            col("capture_nic_type", UInt8).index(IndexType::None).comment(
                "capture nic type 0: MAC, 1: IPv4, 2: IPv6, 3: ID, 4: NetFlow, 5: SFlow",
            ),
            col("nat_source", UInt8).comment("0: NONE, 1: VIP, 2: TOA"),
            col("tunnel_type", UInt8)
                .index(IndexType::None)
                .comment("tunnel type 0: --, 1: VXLAN, 2: IPIP, 3: GRE"),
        ]),
        "endpoint" => columns.push(col(key, String)),
        "gprocess_id" => columns.push(col(key, UInt32).comment("global process ID")),
        "gprocess_id_0" => columns.push(col(key, UInt32).comment("global process ID of ip0")),
        "gprocess_id_1" => columns.push(col(key, UInt32).comment("global process ID of ip1")),
        "host_id" => columns.push(col(key, UInt16).comment("host ID")),
        "host_id_0" => columns.push(col(key, UInt16).comment("host ID of ip4/6_0")),
        "host_id_1" => columns.push(col(key, UInt16).comment("host ID of ip4/6_1")),
        "ip" => columns.extend([
            col("ip4", IPv4).comment("IPv4 address"),
            col("ip6", IPv6).comment("IPv6 address"),
            col("tag_source", UInt8).comment("tag source"),
        ]),
        "ip_0" => columns.extend([
            col("ip4_0", IPv4),
            col("ip6_0", IPv6),
            col("tag_source_0", UInt8).comment("tag source of ip_0"),
        ]),
        "ip_1" => columns.extend([
            col("ip4_1", IPv4),
            col("ip6_1", IPv6),
            col("tag_source_1", UInt8).comment("tag source of ip_1"),
        ]),
        "ip_version" => columns.push(
            col("is_ipv4", UInt8)
                .index(IndexType::Minmax)
                .comment("0: ip6 is valid, 1: ip4 is valid"),
        ),
        "is_key_service" => columns.push(
            col(key, UInt8)
                .comment("key service, 0: no, 1: yes")
                .index(IndexType::Minmax),
        ),
        "l3_device_id" => columns.push(col(key, UInt32).comment("resource ID of ip")),
        "l3_device_id_0" => columns.push(col(key, UInt32).comment("resource ID of ip4/6_0")),
        "l3_device_id_1" => columns.push(col(key, UInt32).comment("resource ID of ip4/6_1")),
        "l3_device_type" => columns.push(col(key, UInt8).comment("resource type of ip")),
        "l3_device_type_0" => columns.push(col(key, UInt8).comment("resource type of ip4/6_0")),
        "l3_device_type_1" => columns.push(col(key, UInt8).comment("resource type of ip4/6_1")),
        "l3_epc_id" => columns.push(col(key, Int32).comment("EPC ID of ip")),
        "l3_epc_id_0" => columns.push(col(key, Int32).comment("EPC ID of ip4/6_0")),
        "l3_epc_id_1" => columns.push(col(key, Int32).comment("EPC ID of ip4/6_1")),
        "l7_protocol" => columns.push(col(key, UInt8).comment(
            "application protocol 0: unknown, 1: http, 2: dns, 3: mysql, 4: redis, 5: dubbo, 6: kafka",
        )),
        "observation_point" => columns.push(col(key, LowCardinalityString).comment(
            "observation point (c: captured at the client (side 0), s: captured at the server (side 1))",
        )),
        "pod_cluster_id" => columns.push(col(key, UInt16).comment("pod cluster ID of ip")),
        "pod_cluster_id_0" => columns.push(col(key, UInt16).comment("pod cluster ID of ip4/6_0")),
        "pod_cluster_id_1" => columns.push(col(key, UInt16).comment("pod cluster ID of ip4/6_1")),
        "pod_group_id" => {
            columns.push(col(key, UInt32).comment("pod group (workload) ID of ip"))
        }
        "pod_group_id_0" => {
            columns.push(col(key, UInt32).comment("pod group (workload) ID of ip4/6_0"))
        }
        "pod_group_id_1" => {
            columns.push(col(key, UInt32).comment("pod group (workload) ID of ip4/6_1"))
        }
        "pod_id" => columns.push(col(key, UInt32).comment("pod ID of ip")),
        "pod_id_0" => columns.push(col(key, UInt32).comment("pod ID of ip4/6_0")),
        "pod_id_1" => columns.push(col(key, UInt32).comment("pod ID of ip4/6_1")),
        "pod_node_id" => columns.push(col(key, UInt32).comment("pod node ID of ip")),
        "pod_node_id_0" => columns.push(col(key, UInt32).comment("pod node ID of ip4/6_0")),
        "pod_node_id_1" => columns.push(col(key, UInt32).comment("pod node ID of ip4/6_1")),
        "pod_ns_id" => columns.push(col(key, UInt16).comment("pod namespace ID of ip")),
        "pod_ns_id_0" => columns.push(col(key, UInt16).comment("pod namespace ID of ip4/6_0")),
        "pod_ns_id_1" => columns.push(col(key, UInt16).comment("pod namespace ID of ip4/6_1")),
        "protocol" => columns.push(
            col(key, UInt8)
                .comment("0: non-IP packet, 1-255: IP protocol number (1: icmp, 6: tcp, 17: udp)"),
        ),
        "region_id" => columns.push(col(key, UInt16).comment("cloud region ID of ip")),
        "region_id_0" => columns.push(col(key, UInt16).comment("cloud region ID of ip4/6_0")),
        "region_id_1" => columns.push(col(key, UInt16).comment("cloud region ID of ip4/6_1")),
        "role" => columns.push(col(key, UInt8).comment(
            "flow direction of the metrics. 0: ip is client, 1: ip is server, 2: ip is local, 3: other",
        )),
        "server_port" => columns.push(
            col(key, UInt16)
                .index(IndexType::Set)
                .comment("server port"),
        ),
        "service_id" => columns.push(col(key, UInt32).comment("service ID of ip")),
        "service_id_0" => columns.push(col(key, UInt32).comment("service ID of ip4/6_0")),
        "service_id_1" => columns.push(col(key, UInt32).comment("service ID of ip4/6_1")),
        "signal_source" => columns.push(col(key, UInt16).comment("signal source")),
        "subnet_id" => columns.push(col(key, UInt16).comment("subnet ID of ip (0: not found)")),
        "subnet_id_0" => {
            columns.push(col(key, UInt16).comment("subnet ID of ip4/6_0 (0: not found)"))
        }
        "subnet_id_1" => {
            columns.push(col(key, UInt16).comment("subnet ID of ip4/6_1 (0: not found)"))
        }
        "team_id" => columns.push(col(key, UInt16).comment("team ID")),
        "tunnel_ip_id" => columns.push(col(key, UInt16).comment("tunnel distribution point ID")),
        _ => {}
    }
}

impl Table {
    /// `CREATE TABLE` for the per-shard local table.
    pub fn create_local_table_sql(&self) -> String {
        let mut defs: Vec<String> = self.columns.iter().map(Column::ddl).collect();
        defs.extend(
            self.columns
                .iter()
                .filter(|c| c.name != self.time_key)
                .filter_map(Column::index_ddl),
        );

        let engine = match self.engine {
            EngineType::MergeTree => "MergeTree()".to_string(),
            EngineType::ReplicatedMergeTree => format!(
                "ReplicatedMergeTree('/clickhouse/tables/{{shard}}/{}/{}', '{{replica}}')",
                self.database, self.local_name
            ),
        };

        let primary_keys = self.order_keys[..self.primary_key_count].join(", ");
        let mut ttl = format!(
            "{} + toIntervalHour({})",
            self.time_key, self.ttl_hours
        );
        if let Some(cold) = &self.cold_storage {
            let target = match cold.kind {
                ColdStorageKind::Disk => "DISK",
                ColdStorageKind::Volume => "VOLUME",
            };
            ttl.push_str(&format!(
                ", {} + toIntervalHour({}) TO {} '{}'",
                self.time_key,
                cold.ttl.as_secs() / 3600,
                target,
                cold.name
            ));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {db}.`{name}`\n(\n    {defs}\n)\nENGINE = {engine}\nPRIMARY KEY ({primary})\nORDER BY ({order})\nPARTITION BY {partition}\nTTL {ttl}\nSETTINGS storage_policy = '{policy}'",
            db = self.database,
            name = self.local_name,
            defs = defs.join(",\n    "),
            engine = engine,
            primary = primary_keys,
            order = self.order_keys.join(", "),
            partition = self.partition_func.expr(self.time_key),
            ttl = ttl,
            policy = self.storage_policy,
        )
    }

    /// `CREATE TABLE` for the distributed table over every shard's local table.
    pub fn create_global_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {db}.`{global}` AS {db}.`{local}` ENGINE = Distributed({cluster}, {db}, `{local}`, rand())",
            db = self.database,
            global = self.global_name,
            local = self.local_name,
            cluster = self.cluster,
        )
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }
}
