//! Integration tests module
//!
//! Organized by entry point (webhook, private dialogue, group chats) and by
//! longer scenarios spanning several of them.

pub mod handlers;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (called once)
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}
