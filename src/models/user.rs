//! User and staff models

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::ParseEnumError;

/// Staff hierarchy, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Trainee,
    Courier,
    Senior,
    Management,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Client, Role::Trainee, Role::Courier, Role::Senior, Role::Management];

    /// Position in the hierarchy; comparisons go through this and nothing else
    pub const fn level(self) -> u8 {
        match self {
            Role::Client => 0,
            Role::Trainee => 1,
            Role::Courier => 2,
            Role::Senior => 3,
            Role::Management => 4,
        }
    }

    /// Whether this role satisfies a gate requiring `required`
    pub fn at_least(self, required: Role) -> bool {
        self.level() >= required.level()
    }

    pub fn is_staff(self) -> bool {
        self.at_least(Role::Trainee)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Trainee => "trainee",
            Role::Courier => "courier",
            Role::Senior => "senior",
            Role::Management => "management",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::Client => "Клиент",
            Role::Trainee => "Стажёр",
            Role::Courier => "Курьер",
            Role::Senior => "Старший состав",
            Role::Management => "Руководство",
        }
    }

    /// Parse a role typed by staff, accepting Russian names
    pub fn from_user_input(input: &str) -> Option<Role> {
        match input.trim().to_lowercase().as_str() {
            "стажёр" | "стажер" | "trainee" => Some(Role::Trainee),
            "курьер" | "courier" => Some(Role::Courier),
            "старший" | "старший_состав" | "senior" => Some(Role::Senior),
            "руководство" | "management" => Some(Role::Management),
            _ => None,
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level().cmp(&other.level())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("role", s))
    }
}

impl TryFrom<String> for Role {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Anyone who has written to the community in private
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub vk_id: i64,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub blacklisted_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Block expiry if the user is blacklisted at `now`
    pub fn blocked_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.blacklisted_until.filter(|until| *until > now)
    }
}

/// Staff member working in the group chats
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub vk_id: i64,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
