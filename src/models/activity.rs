//! Staff presence and activity statistics

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::ParseEnumError;

/// Staff seen within this many minutes count as online
pub const ONLINE_WINDOW_MINUTES: i64 = 5;

/// Longer silences start a new session instead of adding online time
pub const SESSION_GAP_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Afk,
    Offline,
}

impl PresenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Afk => "afk",
            PresenceStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresenceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(PresenceStatus::Online),
            "afk" => Ok(PresenceStatus::Afk),
            "offline" => Ok(PresenceStatus::Offline),
            other => Err(ParseEnumError::new("presence status", other)),
        }
    }
}

impl TryFrom<String> for PresenceStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Presence {
    pub vk_id: i64,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub status: PresenceStatus,
    pub last_activity: DateTime<Utc>,
    pub online_minutes: i64,
}

impl Presence {
    /// Minutes of online time earned by activity at `now`
    pub fn credited_minutes(&self, now: DateTime<Utc>) -> i64 {
        if self.status != PresenceStatus::Online {
            return 0;
        }
        let elapsed = (now - self.last_activity).num_minutes();
        if (0..=SESSION_GAP_MINUTES).contains(&elapsed) {
            elapsed
        } else {
            0
        }
    }
}

/// Aggregated activity of one employee
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffStats {
    pub messages_today: i64,
    pub messages_week: i64,
    pub online_minutes_today: i64,
    pub online_minutes_week: i64,
    pub orders_accepted_week: i64,
}
