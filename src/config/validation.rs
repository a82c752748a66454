//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{CourierHubError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_orders_config(&settings.orders)?;
    validate_finance_config(&settings.finance)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(CourierHubError::Config(
            "Bot token is required".to_string()
        ));
    }

    if config.group_id <= 0 {
        return Err(CourierHubError::Config(
            "Community group id must be positive".to_string()
        ));
    }

    if config.confirmation_code.is_empty() {
        return Err(CourierHubError::Config(
            "Callback API confirmation code is required".to_string()
        ));
    }

    if config.admin_user_id <= 0 {
        return Err(CourierHubError::Config(
            "Admin user id must be configured".to_string()
        ));
    }

    url::Url::parse(&config.api_url)?;

    Ok(())
}

/// Validate webhook server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if !config.webhook_path.starts_with('/') {
        return Err(CourierHubError::Config(
            "Webhook path must start with '/'".to_string()
        ));
    }

    if config.bind_address.parse::<std::net::SocketAddr>().is_err() {
        return Err(CourierHubError::Config(
            format!("Invalid bind address: {}", config.bind_address)
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CourierHubError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(CourierHubError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(CourierHubError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate order lifecycle configuration
fn validate_orders_config(config: &super::OrdersConfig) -> Result<()> {
    if config.acceptance_window_secs == 0 {
        return Err(CourierHubError::Config(
            "Acceptance window must be greater than 0".to_string()
        ));
    }

    if config.sweep_interval_secs == 0 {
        return Err(CourierHubError::Config(
            "Sweep interval must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate finance percentages
fn validate_finance_config(config: &super::FinanceConfig) -> Result<()> {
    for (name, value) in [
        ("commission_percent", config.commission_percent),
        ("courier_share_percent", config.courier_share_percent),
    ] {
        if !(0..=100).contains(&value) {
            return Err(CourierHubError::Config(
                format!("{} must be between 0 and 100, got {}", name, value)
            ));
        }
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CourierHubError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(CourierHubError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
