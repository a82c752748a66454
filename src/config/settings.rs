//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub bot: BotConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub orders: OrdersConfig,
    pub finance: FinanceConfig,
    pub logging: LoggingConfig,
}

/// VK community bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    pub token: String,
    pub group_id: i64,
    pub confirmation_code: String,
    pub secret_key: Option<String>,
    pub api_url: String,
    pub api_version: String,
    pub admin_user_id: i64,
    pub timeout_seconds: u64,
}

/// Inbound webhook server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub webhook_path: String,
    pub request_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Order lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrdersConfig {
    /// How long a pending order waits for a courier before the client is asked to reconfirm
    pub acceptance_window_secs: u64,
    /// How often the acceptance monitor looks for expired deadlines
    pub sweep_interval_secs: u64,
    /// Cancel the order when the client does not reconfirm it
    pub cancel_on_declined_relevance: bool,
    pub active_orders_limit: i64,
}

/// Financial report configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FinanceConfig {
    pub commission_percent: i64,
    pub courier_share_percent: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub max_files: u32,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_file("config")
    }

    /// Load settings from the given file (extension optional) overlaid with `COURIERHUB__*` variables
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("COURIERHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::CourierHubError> {
        super::validation::validate_settings(self)
    }
}

impl OrdersConfig {
    pub fn acceptance_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.acceptance_window_secs as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            orders: OrdersConfig::default(),
            finance: FinanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            group_id: 0,
            confirmation_code: String::new(),
            secret_key: None,
            api_url: "https://api.vk.com/method/".to_string(),
            api_version: "5.131".to_string(),
            admin_user_id: 0,
            timeout_seconds: 10,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            webhook_path: "/api/vk-webhook".to_string(),
            request_timeout_secs: 25,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/courierhub".to_string(),
            max_connections: 10,
            min_connections: 1,
        }
    }
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            acceptance_window_secs: 15 * 60,
            sweep_interval_secs: 30,
            cancel_on_declined_relevance: false,
            active_orders_limit: 5,
        }
    }
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            commission_percent: 10,
            courier_share_percent: 80,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: "logs".to_string(),
            max_files: 7,
        }
    }
}
