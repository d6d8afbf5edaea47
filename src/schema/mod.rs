//! Columnar schema for the metrics tables: column descriptors, table ids and
//! the generated `CREATE TABLE` statements.

pub mod column;
pub mod table;

pub use column::{Column, ColumnType, IndexType};
pub use table::{
    gen_order_keys, gen_tag_columns, get_metrics_tables, key_columns, ColdStorage,
    ColdStorageKind, EngineType, MetricsTableId, PartitionFunc, Table, LOCAL_SUFFIX, METRICS_DB,
};
