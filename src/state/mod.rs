//! State management module
//!
//! This module handles the application context and per-user conversation state

pub mod context;

pub use context::{AppContext, ConversationState, DialogueStep};
