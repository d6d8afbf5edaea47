//! Configuration management for flowtag.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Humantime durations for retention settings
//! - Validation and defaults

use crate::core::{FlowTagError, Result};
use crate::schema::{ColdStorage, EngineType, MetricsTableId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;

/// Complete configuration for flowtag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Metrics table generation
    pub schema: SchemaConfig,
    /// Field/Tag object pools
    pub pool: PoolConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Settings shared by every generated metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Engine for minute tables; second tables always use plain MergeTree
    pub engine: EngineType,
    /// Schema version recorded in table comments
    pub version: String,
    /// Cluster the global (distributed) tables live on
    pub cluster: String,
    pub storage_policy: String,
    /// Columnar store flavour, passed through to the schema layer
    pub db_type: String,
    #[serde(with = "humantime_serde")]
    pub flow_minute_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub flow_second_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub app_minute_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub app_second_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub traffic_policy_ttl: Duration,
    /// Cold storage keyed by table name, e.g. `network.1m`
    pub cold_storages: HashMap<String, ColdStorage>,
}

/// Object pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub field_capacity: usize,
    pub tag_capacity: usize,
    /// Instances pre-allocated into each pool
    pub warm_up: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG` when set
    pub level: LogLevel,
    pub format: LogFormat,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Full,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        SchemaConfig {
            engine: EngineType::MergeTree,
            version: String::new(),
            cluster: "df_cluster".to_string(),
            storage_policy: "df_storage".to_string(),
            db_type: "clickhouse".to_string(),
            flow_minute_ttl: Duration::from_secs(7 * DAY),
            flow_second_ttl: Duration::from_secs(DAY),
            app_minute_ttl: Duration::from_secs(7 * DAY),
            app_second_ttl: Duration::from_secs(DAY),
            traffic_policy_ttl: Duration::from_secs(3 * DAY),
            cold_storages: HashMap::new(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            field_capacity: 10_000,
            tag_capacity: 10_000,
            warm_up: 1_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

impl SchemaConfig {
    /// Retention of the given table in whole hours.
    pub fn ttl_hours(&self, id: MetricsTableId) -> u64 {
        let ttl = match id {
            MetricsTableId::Network1m | MetricsTableId::NetworkMap1m => self.flow_minute_ttl,
            MetricsTableId::Network1s | MetricsTableId::NetworkMap1s => self.flow_second_ttl,
            MetricsTableId::Application1m | MetricsTableId::ApplicationMap1m => {
                self.app_minute_ttl
            }
            MetricsTableId::Application1s | MetricsTableId::ApplicationMap1s => {
                self.app_second_ttl
            }
            MetricsTableId::TrafficPolicy1m => self.traffic_policy_ttl,
            MetricsTableId::Max => Duration::ZERO,
        };
        ttl.as_secs() / HOUR
    }

    /// Cold storage configured for the given table, if enabled.
    pub fn cold_storage(&self, id: MetricsTableId) -> Option<&ColdStorage> {
        self.cold_storages
            .get(id.table_name())
            .filter(|cold| cold.enabled)
    }

    fn ttls(&self) -> [(&'static str, Duration); 5] {
        [
            ("flow_minute_ttl", self.flow_minute_ttl),
            ("flow_second_ttl", self.flow_second_ttl),
            ("app_minute_ttl", self.app_minute_ttl),
            ("app_second_ttl", self.app_second_ttl),
            ("traffic_policy_ttl", self.traffic_policy_ttl),
        ]
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Schema validation
        for (name, ttl) in self.schema.ttls() {
            if ttl.is_zero() || ttl.as_secs() % HOUR != 0 || ttl.subsec_nanos() != 0 {
                return Err(FlowTagError::config(format!(
                    "{} must be a non-zero whole number of hours, got {:?}",
                    name, ttl
                )));
            }
        }

        for (table, cold) in &self.schema.cold_storages {
            let id = MetricsTableId::from_name(table);
            if id == MetricsTableId::Max {
                return Err(FlowTagError::config(format!(
                    "Unknown table in cold_storages: '{}'",
                    table
                )));
            }
            if cold.enabled && cold.ttl.as_secs() / HOUR >= self.schema.ttl_hours(id) {
                return Err(FlowTagError::config(format!(
                    "Cold storage TTL for '{}' must be shorter than the table TTL",
                    table
                )));
            }
        }

        // Pool validation
        if self.pool.field_capacity == 0 || self.pool.tag_capacity == 0 {
            return Err(FlowTagError::config("pool capacities must be greater than 0"));
        }

        if self.pool.warm_up > self.pool.field_capacity.min(self.pool.tag_capacity) {
            return Err(FlowTagError::config(format!(
                "pool warm_up ({}) exceeds pool capacity",
                self.pool.warm_up
            )));
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| FlowTagError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Load configuration from a YAML file
    pub fn from_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded configuration from {:?}", path);
        self.from_yaml(&yaml)
    }

    /// Set the minute-table engine
    pub fn engine(mut self, engine: EngineType) -> Self {
        self.config.schema.engine = engine;
        self
    }

    /// Set the cluster name
    pub fn cluster(mut self, cluster: impl Into<String>) -> Self {
        self.config.schema.cluster = cluster.into();
        self
    }

    /// Set the storage policy
    pub fn storage_policy(mut self, policy: impl Into<String>) -> Self {
        self.config.schema.storage_policy = policy.into();
        self
    }

    /// Set network minute/second retention
    pub fn flow_ttl(mut self, minute: Duration, second: Duration) -> Self {
        self.config.schema.flow_minute_ttl = minute;
        self.config.schema.flow_second_ttl = second;
        self
    }

    /// Set application minute/second retention
    pub fn app_ttl(mut self, minute: Duration, second: Duration) -> Self {
        self.config.schema.app_minute_ttl = minute;
        self.config.schema.app_second_ttl = second;
        self
    }

    /// Add cold storage for one table
    pub fn cold_storage(mut self, table: impl Into<String>, cold: ColdStorage) -> Self {
        self.config.schema.cold_storages.insert(table.into(), cold);
        self
    }

    /// Set both pool capacities
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.config.pool.field_capacity = capacity;
        self.config.pool.tag_capacity = capacity;
        self
    }

    /// Set pool warm-up count
    pub fn warm_up(mut self, count: usize) -> Self {
        self.config.pool.warm_up = count;
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColdStorageKind;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.schema.ttl_hours(MetricsTableId::Network1m), 7 * 24);
        assert_eq!(config.schema.ttl_hours(MetricsTableId::Application1s), 24);
        assert_eq!(config.schema.ttl_hours(MetricsTableId::TrafficPolicy1m), 3 * 24);
    }

    #[test]
    fn test_ttl_must_be_whole_hours() {
        let mut config = Config::default();
        config.schema.flow_second_ttl = Duration::from_secs(90 * 60);
        assert!(config.validate().is_err());

        config.schema.flow_second_ttl = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pool_validation() {
        let mut config = Config::default();
        config.pool.tag_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pool.warm_up = config.pool.field_capacity + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cold_storage_validation() {
        let cold = ColdStorage {
            enabled: true,
            kind: ColdStorageKind::Disk,
            name: "archive".to_string(),
            ttl: Duration::from_secs(2 * DAY),
        };

        let config = ConfigBuilder::new().cold_storage("network.1m", cold.clone()).build();
        assert!(config.is_ok());

        let config = ConfigBuilder::new().cold_storage("network.5m", cold.clone()).build();
        assert!(config.is_err());

        // 2 days is longer than the 1 day second-table TTL
        let config = ConfigBuilder::new().cold_storage("network.1s", cold).build();
        assert!(config.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .engine(EngineType::ReplicatedMergeTree)
            .cluster("c1")
            .flow_ttl(Duration::from_secs(14 * DAY), Duration::from_secs(2 * DAY))
            .pool_capacity(64)
            .warm_up(8)
            .log_level(LogLevel::Debug)
            .build()
            .unwrap();

        assert_eq!(config.schema.engine, EngineType::ReplicatedMergeTree);
        assert_eq!(config.schema.cluster, "c1");
        assert_eq!(config.schema.ttl_hours(MetricsTableId::NetworkMap1m), 14 * 24);
        assert_eq!(config.schema.ttl_hours(MetricsTableId::NetworkMap1s), 48);
        assert_eq!(config.pool.tag_capacity, 64);
        assert_eq!(config.logging.level.as_str(), "debug");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
schema:
  engine: replicated_merge_tree
  flow_minute_ttl: 10days
  app_second_ttl: 12h
  cold_storages:
    application.1m:
      enabled: true
      kind: volume
      name: slow
      ttl: 2days
pool:
  field_capacity: 128
  warm_up: 16
logging:
  level: warn
  format: full
"#;

        let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();

        assert_eq!(config.schema.engine, EngineType::ReplicatedMergeTree);
        assert_eq!(config.schema.ttl_hours(MetricsTableId::Network1m), 240);
        assert_eq!(config.schema.ttl_hours(MetricsTableId::Application1s), 12);
        // untouched keys keep their defaults
        assert_eq!(config.schema.ttl_hours(MetricsTableId::Network1s), 24);
        assert_eq!(config.pool.field_capacity, 128);
        assert_eq!(config.pool.tag_capacity, 10_000);
        assert_eq!(config.logging.format, LogFormat::Full);

        let cold = config
            .schema
            .cold_storage(MetricsTableId::Application1m)
            .unwrap();
        assert_eq!(cold.kind, ColdStorageKind::Volume);
        assert_eq!(cold.name, "slow");
        assert!(config.schema.cold_storage(MetricsTableId::Network1m).is_none());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(ConfigBuilder::new().from_yaml("schema: [").is_err());
    }
}
