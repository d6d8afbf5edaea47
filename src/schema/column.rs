//! Column descriptors for the columnar store.

use serde::Serialize;
use std::fmt;

/// Storage type of a column, displayed as the store's type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int32,
    DateTime,
    IPv4,
    IPv6,
    String,
    LowCardinalityString,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::UInt8 => "UInt8",
            ColumnType::UInt16 => "UInt16",
            ColumnType::UInt32 => "UInt32",
            ColumnType::UInt64 => "UInt64",
            ColumnType::Int32 => "Int32",
            ColumnType::DateTime => "DateTime",
            ColumnType::IPv4 => "IPv4",
            ColumnType::IPv6 => "IPv6",
            ColumnType::String => "String",
            ColumnType::LowCardinalityString => "LowCardinality(String)",
        }
    }

    /// Skipping index a column of this type gets unless told otherwise.
    fn default_index(self) -> IndexType {
        match self {
            ColumnType::UInt8
            | ColumnType::UInt16
            | ColumnType::UInt32
            | ColumnType::UInt64
            | ColumnType::Int32
            | ColumnType::IPv4
            | ColumnType::IPv6 => IndexType::Minmax,
            ColumnType::String | ColumnType::LowCardinalityString => IndexType::BloomFilter,
            ColumnType::DateTime => IndexType::None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skipping index attached to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndexType {
    None,
    Minmax,
    BloomFilter,
    Set,
}

impl IndexType {
    /// Index expression, `None` when the column has no skipping index.
    pub fn expr(self) -> Option<&'static str> {
        match self {
            IndexType::None => None,
            IndexType::Minmax => Some("minmax"),
            IndexType::BloomFilter => Some("bloom_filter"),
            IndexType::Set => Some("set(300)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub index: IndexType,
    /// Part of the aggregation grouping key.
    pub group_by: bool,
    pub comment: &'static str,
}

impl Column {
    pub fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            index: column_type.default_index(),
            group_by: false,
            comment: "",
        }
    }

    pub fn with_group_by(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            group_by: true,
            ..Self::new(name, column_type)
        }
    }

    pub fn comment(mut self, comment: &'static str) -> Self {
        self.comment = comment;
        self
    }

    pub fn index(mut self, index: IndexType) -> Self {
        self.index = index;
        self
    }

    /// Column definition line for `CREATE TABLE`.
    pub fn ddl(&self) -> String {
        if self.comment.is_empty() {
            format!("`{}` {}", self.name, self.column_type)
        } else {
            format!(
                "`{}` {} COMMENT '{}'",
                self.name,
                self.column_type,
                self.comment.replace('\'', "\\'")
            )
        }
    }

    /// Skipping index line, if the column has one.
    pub fn index_ddl(&self) -> Option<String> {
        self.index
            .expr()
            .map(|expr| format!("INDEX {}_idx ({}) TYPE {} GRANULARITY 2", self.name, self.name, expr))
    }
}
