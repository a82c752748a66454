//! Group chat registration model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::ParseEnumError;

/// Logical purpose of a staff group chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Management,
    Flood,
    Dispatch,
    Announcements,
    SeniorStaff,
    Training,
    ActivityLog,
}

impl ChatRole {
    /// Discovery order; the first marker found in a title wins
    pub const ALL: [ChatRole; 7] = [
        ChatRole::Management,
        ChatRole::Flood,
        ChatRole::Dispatch,
        ChatRole::Announcements,
        ChatRole::SeniorStaff,
        ChatRole::Training,
        ChatRole::ActivityLog,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::Management => "management",
            ChatRole::Flood => "flood",
            ChatRole::Dispatch => "dispatch",
            ChatRole::Announcements => "announcements",
            ChatRole::SeniorStaff => "senior_staff",
            ChatRole::Training => "training",
            ChatRole::ActivityLog => "activity_log",
        }
    }

    /// Case-sensitive substring expected in the chat title
    pub fn title_marker(self) -> &'static str {
        match self {
            ChatRole::Management => "Руководство",
            ChatRole::Flood => "Флудилка",
            ChatRole::Dispatch => "Диспетчерская",
            ChatRole::Announcements => "Доска объявлений",
            ChatRole::SeniorStaff => "Старший состав",
            ChatRole::Training => "Учебный центр",
            ChatRole::ActivityLog => "Журнал активности",
        }
    }

    pub fn display_name(self) -> &'static str {
        self.title_marker()
    }

    /// Match a chat title against the role vocabulary
    pub fn from_title(title: &str) -> Option<ChatRole> {
        ChatRole::ALL
            .into_iter()
            .find(|role| title.contains(role.title_marker()))
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChatRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("chat role", s))
    }
}

impl TryFrom<String> for ChatRole {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRegistration {
    pub peer_id: i64,
    #[sqlx(try_from = "String")]
    pub chat_type: ChatRole,
    pub title: String,
    pub created_at: DateTime<Utc>,
}
