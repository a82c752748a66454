//! Data models module
//!
//! This module contains all data models used throughout the application

pub mod activity;
pub mod catalog;
pub mod chat;
pub mod order;
pub mod user;

pub use activity::*;
pub use catalog::*;
pub use chat::*;
pub use order::*;
pub use user::*;

/// A stored enum column held an unknown value
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}
