//! Order model
//!
//! Orders snapshot product name, price and cost price at creation time, so
//! later catalog edits never change historical totals.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::{CartLine, ParseEnumError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Delivering,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Statuses shown in a client's "my orders"
    pub const ACTIVE: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Delivering,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn is_active(self) -> bool {
        OrderStatus::ACTIVE.contains(&self)
    }

    /// Allowed lifecycle edges. Re-entering `Delivering` covers the "arrived" signal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Cancelled)
                | (Accepted, Preparing)
                | (Accepted, Delivering)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
                | (Preparing, Delivering)
                | (Preparing, Completed)
                | (Delivering, Delivering)
                | (Delivering, Completed)
        )
    }

    pub fn describe(self) -> (&'static str, &'static str) {
        match self {
            OrderStatus::Pending => ("⏳", "Ожидает принятия"),
            OrderStatus::Accepted => ("✅", "Принят курьером"),
            OrderStatus::Preparing => ("👨‍🍳", "Готовится"),
            OrderStatus::Delivering => ("🚗", "Курьер в пути"),
            OrderStatus::Completed => ("✅", "Завершен"),
            OrderStatus::Cancelled => ("❌", "Отменен"),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("order status", s))
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub client_vk_id: i64,
    pub client_username: String,
    pub delivery_location: String,
    pub total_price: i64,
    pub total_cost: i64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub courier_vk_id: Option<i64>,
    pub courier_username: Option<String>,
    pub estimated_time: Option<String>,
    pub acceptance_deadline: Option<DateTime<Utc>>,
    pub dispatch_message_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub product_nutrition: Option<String>,
    pub product_price: i64,
    pub product_cost_price: i64,
    pub quantity: i32,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.product_price * self.quantity as i64
    }

    pub fn line_cost(&self) -> i64 {
        self.product_cost_price * self.quantity as i64
    }

    pub fn label(&self) -> String {
        match &self.product_nutrition {
            Some(nutrition) if !nutrition.is_empty() => format!("{} | {}", self.product_name, nutrition),
            _ => self.product_name.clone(),
        }
    }
}

/// Line item snapshot taken from the cart at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub product_nutrition: Option<String>,
    pub product_price: i64,
    pub product_cost_price: i64,
    pub quantity: i32,
}

/// Everything needed to insert a pending order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub client_vk_id: i64,
    pub client_username: String,
    pub delivery_location: String,
    pub items: Vec<NewOrderItem>,
    pub acceptance_deadline: DateTime<Utc>,
}

impl NewOrder {
    pub fn from_cart(
        client_vk_id: i64,
        client_username: String,
        delivery_location: String,
        cart: &[CartLine],
        acceptance_deadline: DateTime<Utc>,
    ) -> Self {
        let items = cart
            .iter()
            .filter(|line| line.quantity > 0)
            .map(|line| NewOrderItem {
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                product_nutrition: line.product.nutrition.clone(),
                product_price: line.product.price,
                product_cost_price: line.product.cost_price,
                quantity: line.quantity,
            })
            .collect();

        Self {
            client_vk_id,
            client_username,
            delivery_location,
            items,
            acceptance_deadline,
        }
    }

    pub fn total_price(&self) -> i64 {
        self.items.iter().map(|i| i.product_price * i.quantity as i64).sum()
    }

    pub fn total_cost(&self) -> i64 {
        self.items.iter().map(|i| i.product_cost_price * i.quantity as i64).sum()
    }
}
