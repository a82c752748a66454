//! Handler-level integration tests

pub mod private_dialogue_test;
pub mod staff_commands_test;
pub mod webhook_test;
