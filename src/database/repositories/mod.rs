//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod activity;
pub mod catalog;
pub mod chat;
pub mod order;
pub mod state;
pub mod user;

// Re-export repositories
pub use activity::ActivityRepository;
pub use catalog::CatalogRepository;
pub use chat::ChatRepository;
pub use order::OrderRepository;
pub use state::StateRepository;
pub use user::UserRepository;
