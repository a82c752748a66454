//! Test helpers module
//!
//! This module provides utilities and helpers for testing the CourierHub bot:
//! a recording messaging gateway, fixed test data and the test context.

#![allow(dead_code)]

pub mod recording_gateway;
pub mod test_context;
pub mod test_data;

pub use recording_gateway::*;
pub use test_context::*;
pub use test_data::*;
