//! Fixed identities and settings shared by the integration tests

use CourierHub::config::Settings;
use CourierHub::models::{ChatRole, CreateProductRequest};

pub const GROUP_ID: i64 = 222_333;
pub const SECRET: &str = "s3cret";
pub const CONFIRMATION_CODE: &str = "a1b2c3d4";
pub const ADMIN_ID: i64 = 900;

pub const CLIENT_ID: i64 = 1001;
pub const OTHER_CLIENT_ID: i64 = 1002;
pub const COURIER_ID: i64 = 2001;
pub const SECOND_COURIER_ID: i64 = 2002;
pub const SENIOR_ID: i64 = 3001;
pub const MANAGER_ID: i64 = 4001;

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.bot.token = "test-token".to_string();
    settings.bot.group_id = GROUP_ID;
    settings.bot.confirmation_code = CONFIRMATION_CODE.to_string();
    settings.bot.secret_key = Some(SECRET.to_string());
    settings.bot.admin_user_id = ADMIN_ID;
    settings.orders.acceptance_window_secs = 15 * 60;
    settings
}

/// Peer id a registered chat of the given role lives at
pub fn chat_peer(role: ChatRole) -> i64 {
    let index = ChatRole::ALL.iter().position(|r| *r == role).unwrap_or(0) as i64;
    2_000_000_001 + index
}

pub fn product_request(category_id: i64, name: &str, price: i64, cost_price: i64) -> CreateProductRequest {
    CreateProductRequest {
        category_id,
        name: name.to_string(),
        nutrition: None,
        price,
        cost_price,
    }
}
