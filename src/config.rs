//! Collector configuration
//!
//! Loaded from TOML. Credentials are referenced by the NAME of an
//! environment variable and resolved only when connect options are built,
//! so they never live in the parsed configuration.

use crate::naming::MetricNameMode;
use crate::protocol::topics::validate_object_name;
use crate::transport::ConnectOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level collector configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectorConfig {
    pub connection: ConnectionSection,
    #[serde(default)]
    pub collection: CollectionSection,
    #[serde(default)]
    pub naming: NamingSection,
}

/// Where and how to connect
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionSection {
    /// Queue manager name; empty selects the default queue manager
    #[serde(default)]
    pub queue_manager: String,
    /// Connect over the network rather than with local bindings
    #[serde(default)]
    pub client_mode: bool,
    /// `host(port)` connection list, required in client mode
    pub connection_name: Option<String>,
    /// Server-connection channel, required in client mode
    pub channel: Option<String>,
    /// Environment variable containing the user id
    pub user_id_env: Option<String>,
    /// Environment variable containing the password
    pub password_env: Option<String>,
    #[serde(default = "default_command_queue")]
    pub command_queue: String,
    /// Model queue used to create the reply queues
    #[serde(default = "default_reply_queue")]
    pub reply_queue: String,
    /// Optional separate model queue for status-polling replies
    pub reply_queue2: Option<String>,
    /// Seconds to wait for each correlated reply
    #[serde(default = "default_wait_interval")]
    pub wait_interval_secs: u64,
    #[serde(default = "default_application_name")]
    pub application_name: String,
}

fn default_command_queue() -> String {
    "SYSTEM.ADMIN.COMMAND.QUEUE".to_string()
}

fn default_reply_queue() -> String {
    "SYSTEM.DEFAULT.MODEL.QUEUE".to_string()
}

fn default_wait_interval() -> u64 {
    3
}

fn default_application_name() -> String {
    "mqmetric".to_string()
}

/// What to collect and how
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionSection {
    /// Use resource-statistics publications where the platform allows
    #[serde(default = "default_true")]
    pub use_publications: bool,
    /// Poll object status with administrative requests
    #[serde(default = "default_true")]
    pub use_status: bool,
    /// Comma-separated queue patterns, `!` prefix excludes
    #[serde(default)]
    pub queues: String,
    #[serde(default)]
    pub channels: String,
    #[serde(default)]
    pub amqp_channels: String,
    #[serde(default)]
    pub mqtt_channels: String,
    #[serde(default)]
    pub topics: String,
    #[serde(default)]
    pub subscriptions: String,
    /// Report defined-but-not-running channels as stopped
    #[serde(default)]
    pub show_inactive_channels: bool,
    /// Replace AMQP client ids with a placeholder in exposed values
    #[serde(default)]
    pub hide_amqp_client_id: bool,
    /// Replace MQTT client ids with a placeholder in exposed values
    #[serde(default)]
    pub hide_mqtt_client_id: bool,
    /// Also request interval queue statistics (z/OS)
    #[serde(default)]
    pub use_reset_q_stats: bool,
    /// Refuse to start when queue monitoring is disabled on the queue manager
    #[serde(default)]
    pub require_queue_monitoring: bool,
    /// Offset of the queue manager's local clock from UTC, in seconds
    #[serde(default)]
    pub tz_offset_secs: i64,
    /// How often cached object definitions are refreshed
    #[serde(default = "default_rediscover_interval")]
    pub rediscover_interval_secs: u64,
    /// Use durable subscriptions named with this prefix
    pub durable_sub_prefix: Option<String>,
    #[serde(default)]
    pub subscription_delivery: SubscriptionDelivery,
    /// Keep durable subscription handles open after creation
    #[serde(default)]
    pub keep_durable_handles: bool,
    /// Object-specific statistic types to subscribe to per queue
    /// (for example `GENERAL`, `PUT`, `GET`); empty means all
    #[serde(default)]
    pub queue_subscription_selector: Vec<String>,
}

impl Default for CollectionSection {
    fn default() -> Self {
        Self {
            use_publications: true,
            use_status: true,
            queues: String::new(),
            channels: String::new(),
            amqp_channels: String::new(),
            mqtt_channels: String::new(),
            topics: String::new(),
            subscriptions: String::new(),
            show_inactive_channels: false,
            hide_amqp_client_id: false,
            hide_mqtt_client_id: false,
            use_reset_q_stats: false,
            require_queue_monitoring: false,
            tz_offset_secs: 0,
            rediscover_interval_secs: default_rediscover_interval(),
            durable_sub_prefix: None,
            subscription_delivery: SubscriptionDelivery::default(),
            keep_durable_handles: false,
            queue_subscription_selector: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_rediscover_interval() -> u64 {
    3600
}

/// Delivery mode for publication subscriptions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionDelivery {
    /// Broker-managed queue per subscription
    #[default]
    Managed,
    /// Deliver onto the collector's shared reply queue
    Queue,
}

/// Metric naming
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NamingSection {
    #[serde(default)]
    pub metric_names: MetricNameMode,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid queue manager name: {0}")]
    InvalidQueueManager(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CollectorConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: CollectorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let conn = &self.connection;
        if !conn.queue_manager.is_empty() {
            validate_object_name(&conn.queue_manager).map_err(|e| {
                ConfigError::InvalidQueueManager(format!("'{}': {e}", conn.queue_manager))
            })?;
        }

        if conn.client_mode && (conn.connection_name.is_none() || conn.channel.is_none()) {
            return Err(ConfigError::InvalidConfig(
                "client_mode requires both connection_name and channel".to_string(),
            ));
        }

        if conn.wait_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "wait_interval_secs must be at least 1".to_string(),
            ));
        }

        if let Some(prefix) = &self.collection.durable_sub_prefix {
            validate_object_name(prefix).map_err(|e| {
                ConfigError::InvalidConfig(format!("durable_sub_prefix '{prefix}': {e}"))
            })?;
        }

        if !self.collection.use_publications && !self.collection.use_status {
            return Err(ConfigError::InvalidConfig(
                "at least one of use_publications and use_status must be enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Helper to read an optional environment variable by name
    fn get_env_var_optional(env_var_name: Option<&String>) -> Result<Option<String>, ConfigError> {
        match env_var_name {
            None => Ok(None),
            Some(name) => std::env::var(name)
                .map(Some)
                .map_err(|_| ConfigError::EnvVarNotFound(name.clone())),
        }
    }

    /// Build transport connect options, resolving credentials from the environment
    pub fn connect_options(&self) -> Result<ConnectOptions, ConfigError> {
        let conn = &self.connection;
        Ok(ConnectOptions {
            queue_manager: conn.queue_manager.clone(),
            client_mode: conn.client_mode,
            connection_name: conn.connection_name.clone(),
            channel: conn.channel.clone(),
            user_id: Self::get_env_var_optional(conn.user_id_env.as_ref())?,
            password: Self::get_env_var_optional(conn.password_env.as_ref())?,
            application_name: conn.application_name.clone(),
        })
    }

    /// Bounded wait used for every correlated receive
    pub fn wait_interval(&self) -> Duration {
        Duration::from_secs(self.connection.wait_interval_secs)
    }

    /// Create a configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[connection]
queue_manager = "QM1"

[collection]
queues = "APP.*"
channels = "*"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}
