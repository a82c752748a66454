//! Error handling for CourierHub
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for CourierHub application
#[derive(Error, Debug)]
pub enum CourierHubError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Messaging gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors reported by the chat platform itself
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Gateway is not configured: {0}")]
    NotConfigured(String),
}

/// Result type alias for CourierHub operations
pub type Result<T> = std::result::Result<T, CourierHubError>;

impl CourierHubError {
    /// Whether the failed call may succeed if the platform redelivers or the user retries
    pub fn is_recoverable(&self) -> bool {
        match self {
            CourierHubError::Database(_) => false,
            CourierHubError::Migration(_) => false,
            CourierHubError::Gateway(_) => true,
            CourierHubError::Config(_) => false,
            CourierHubError::OrderNotFound { .. } => false,
            CourierHubError::InvalidStateTransition { .. } => false,
            CourierHubError::Http(_) => true,
            CourierHubError::Serialization(_) => false,
            CourierHubError::Io(_) => true,
            CourierHubError::UrlParse(_) => false,
            CourierHubError::InvalidInput(_) => false,
        }
    }

    /// Transient and minor failures are only worth a warning
    pub fn needs_attention(&self) -> bool {
        match self.severity() {
            ErrorSeverity::Info | ErrorSeverity::Warning => false,
            ErrorSeverity::Error => !self.is_recoverable(),
            ErrorSeverity::Critical => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CourierHubError::Database(_) => ErrorSeverity::Critical,
            CourierHubError::Migration(_) => ErrorSeverity::Critical,
            CourierHubError::Config(_) => ErrorSeverity::Critical,
            CourierHubError::InvalidStateTransition { .. } => ErrorSeverity::Warning,
            CourierHubError::InvalidInput(_) => ErrorSeverity::Info,
            CourierHubError::OrderNotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
