use crate::core::code::Code;
use crate::schema::MetricsTableId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowTagError {
    #[error("Table not matched: tag code is 0x{code:x}, is second {is_second}")]
    TableNotMatched { code: Code, is_second: bool },

    #[error("Table {0} has no second-resolution counterpart")]
    NoSecondTable(MetricsTableId),

    #[error("Unknown observation point composite: 0x{0:02x}")]
    UnknownTapSide(u8),

    #[error("Invalid integer: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for flowtag operations
pub type Result<T> = std::result::Result<T, FlowTagError>;

impl FlowTagError {
    /// Creates a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::TableNotMatched { .. } | Self::NoSecondTable(_) => "routing",
            Self::UnknownTapSide(_) => "validation",
            Self::ParseInt(_) | Self::Parse { .. } => "parse",
            Self::Decode(_) => "protocol",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}
