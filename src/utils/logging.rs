//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the CourierHub application.

use tracing::{info, warn, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{CourierHubError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file appender on drop and must be held
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("courierhub")
        .filename_suffix("log")
        .max_log_files(config.max_files as usize)
        .build(&config.file_path)
        .map_err(|e| CourierHubError::Config(format!("Cannot open log directory: {}", e)))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
        .try_init()
        .map_err(|e| CourierHubError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: i64, action: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log order lifecycle transitions
pub fn log_order_transition(order_id: i64, from: &str, to: &str, actor_id: Option<i64>) {
    info!(
        order_id = order_id,
        from = from,
        to = to,
        actor_id = actor_id,
        "Order status changed"
    );
}

/// Log group chat events
pub fn log_chat_event(peer_id: i64, event: &str, user_id: Option<i64>, details: Option<&str>) {
    info!(
        peer_id = peer_id,
        event = event,
        user_id = user_id,
        details = details,
        "Chat event occurred"
    );
}

/// Log staff actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
