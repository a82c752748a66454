//! Bot handlers module
//!
//! This module contains all inbound message handlers organized by type:
//! - Router deciding between private and group handling
//! - Callback handlers for keyboard payloads
//! - Message handlers for the private dialogue
//! - Command handlers for staff group chats

pub mod callbacks;
pub mod commands;
pub mod group;
pub mod messages;
pub mod payload;
pub mod router;
pub mod shop;

// Re-export commonly used handler items
pub use payload::Intent;
pub use router::{route_message, IncomingMessage, ReplyMessage};
