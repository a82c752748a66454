//! Services module
//!
//! This module contains the order, chat and reporting logic together with the
//! outbound messaging gateway it drives.

pub mod finance;
pub mod gateway;
pub mod keyboards;
pub mod orders;
pub mod registry;
pub mod timeouts;
pub mod vk;

// Re-export commonly used services
pub use finance::{FinanceReporter, FinanceSummary};
pub use gateway::MessagingGateway;
pub use keyboards::Keyboard;
pub use orders::{AcceptOutcome, CourierSignal, OrderEngine, RelevanceOutcome, SignalOutcome};
pub use registry::ChatRegistry;
pub use timeouts::AcceptanceMonitor;
pub use vk::VkGateway;
