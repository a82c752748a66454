//! Database module
//!
//! This module handles database connections, the store contract and its implementations

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, PoolOptions, create_pool, run_migrations, health_check};
pub use memory::MemoryStore;
pub use repositories::{ActivityRepository, CatalogRepository, ChatRepository, OrderRepository, StateRepository, UserRepository};
pub use service::DatabaseService;
pub use store::Store;
