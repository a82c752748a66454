//! CourierHub VK Bot
//!
//! A VK community bot running a small courier delivery service.
//! This library provides the webhook server, the client shop dialogue,
//! order dispatch with courier acceptance, and staff chat administration.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod handlers;
pub mod models;
pub mod server;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{CourierHubError, Result};

// Re-export main components for easy access
pub use database::{DatabaseService, MemoryStore, Store};
pub use server::{build_app, handle_webhook};
pub use state::AppContext;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
