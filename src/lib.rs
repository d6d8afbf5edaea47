//! Flowtag - dimensional tags for network flow metrics.
//!
//! Every flow-metrics record carries a tag: a flat [`Field`] of dimension
//! values plus a [`Code`] bitmask saying which of them are meaningful. The
//! same code decides the metrics table a record lands in and the columns
//! that table has.
//!
//! # Architecture
//!
//! - `core`: `Code`, `Field`, `Tag`, errors, configuration and logging
//! - `receiver`: protobuf wire decoding of agent records
//! - `codec`: line-protocol text and Prometheus label encodings
//! - `schema`: metrics table ids, tag columns and DDL generation
//! - `pool`: concurrent Field/Tag object pools
//!
//! # Example
//!
//! ```
//! use flowtag::{Code, Field, Tag};
//!
//! let field = Field {
//!     is_ipv4: true,
//!     ip: u32::from(std::net::Ipv4Addr::new(192, 0, 2, 1)),
//!     server_port: 8080,
//!     ..Default::default()
//! };
//! let tag = Tag::new(field, Code::IP | Code::SERVER_PORT);
//! assert_eq!(tag.to_kv_string(), ",ip=192.0.2.1,ip_version=4,server_port=8080");
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod codec;
pub mod core;
pub mod pool;
pub mod receiver;
pub mod schema;

// Re-export core types for convenience
pub use crate::core::{Code, Config, Field, FlowTagError, Result, Tag};
pub use crate::receiver::pb::{MiniField, MiniTag};
pub use crate::schema::{get_metrics_tables, MetricsTableId, Table};
