//! Core domain types: the `Code` bitmask, the flat `Field` value, `Tag`
//! and the error/config/logging plumbing shared by every other module.

pub mod code;
pub mod config;
pub mod error;
pub mod field;
pub mod logging;
pub mod side;
pub mod tag;
pub mod tap_port;

// Re-export commonly used types
pub use code::Code;
pub use config::{Config, ConfigBuilder, LogFormat, LogLevel, LoggingConfig, PoolConfig, SchemaConfig};
pub use error::{FlowTagError, Result};
pub use field::{DeviceType, Field};
pub use logging::init_logging;
pub use side::{Direction, Role, SideType, TapSide};
pub use tag::Tag;
pub use tap_port::TapPort;
