//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;
use chrono::{DateTime, Utc, Datelike, NaiveDate, Duration};
use regex::Regex;
use crate::utils::errors::{CourierHubError, Result};

/// Maximum length of a client display name
pub const MAX_USERNAME_LENGTH: usize = 100;

/// Maximum length of a delivery location
pub const MAX_LOCATION_LENGTH: usize = 200;

/// Platform limit for button labels
pub const MAX_BUTTON_LABEL_LENGTH: usize = 40;

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d.%m.%Y %H:%M").to_string()
}

/// Format a date for display
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d.%m.%Y").to_string()
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Validate a client display name
pub fn validate_username(username: &str) -> Result<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(CourierHubError::InvalidInput("Никнейм не может быть пустым".to_string()));
    }
    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(CourierHubError::InvalidInput("Никнейм слишком длинный".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Validate a delivery location
pub fn validate_location(location: &str) -> Result<String> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(CourierHubError::InvalidInput("Адрес не может быть пустым".to_string()));
    }
    if trimmed.chars().count() > MAX_LOCATION_LENGTH {
        return Err(CourierHubError::InvalidInput("Адрес слишком длинный".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Validate product name, sell price and cost price
pub fn validate_product_data(name: &str, price: &str, cost_price: &str) -> Result<(String, i64, i64)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CourierHubError::InvalidInput("Название не может быть пустым".to_string()));
    }

    let price: i64 = price.trim().parse()
        .map_err(|_| CourierHubError::InvalidInput("Цена должна быть положительным числом".to_string()))?;
    let cost_price: i64 = cost_price.trim().parse()
        .map_err(|_| CourierHubError::InvalidInput("Себестоимость должна быть неотрицательным числом".to_string()))?;

    if price <= 0 {
        return Err(CourierHubError::InvalidInput("Цена должна быть положительным числом".to_string()));
    }
    if cost_price < 0 {
        return Err(CourierHubError::InvalidInput("Себестоимость должна быть неотрицательным числом".to_string()));
    }
    if cost_price > price {
        return Err(CourierHubError::InvalidInput("Себестоимость не может быть больше цены".to_string()));
    }

    Ok((name.to_string(), price, cost_price))
}

/// Normalize a courier's delivery estimate ("минут 20" -> "20 минут")
pub fn parse_estimated_time(text: &str) -> String {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    let captures = DIGITS
        .get_or_init(|| Regex::new(r"(\d+)").ok())
        .as_ref()
        .and_then(|re| re.captures(text));

    match captures {
        Some(caps) => format!("{} минут", &caps[1]),
        None => text.trim().to_string(),
    }
}

/// Parse a user reference from text: plain id, `id123`, `@id123` or `[id123|Name]`
pub fn parse_user_mention(text: &str) -> Option<i64> {
    let text = text.trim();
    let text = text.strip_prefix('[').map(|rest| rest.split('|').next().unwrap_or(rest)).unwrap_or(text);
    let text = text.strip_prefix('@').unwrap_or(text);
    let text = text.strip_prefix("id").unwrap_or(text);
    text.parse::<i64>().ok().filter(|id| *id > 0)
}

/// Check a free-text answer for confirmation
pub fn is_affirmative(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "да" | "подтвердить" | "yes" | "✅ да" | "✅ всё верно"
    )
}

/// Monday 00:00 UTC of the week containing `date`
pub fn week_start(date: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    let day = date.date_naive() - Duration::days(days_from_monday);
    day_start(day)
}

/// Midnight UTC of the given day
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}
