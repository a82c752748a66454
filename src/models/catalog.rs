//! Catalog and cart models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub nutrition: Option<String>,
    pub price: i64,
    pub cost_price: i64,
}

impl Product {
    /// Name with the optional nutrition note, as shown to clients
    pub fn label(&self) -> String {
        match &self.nutrition {
            Some(nutrition) if !nutrition.is_empty() => format!("{} | {}", self.name, nutrition),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub category_id: i64,
    pub name: String,
    pub nutrition: Option<String>,
    pub price: i64,
    pub cost_price: i64,
}

/// A cart row joined with its current product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.product.price * self.quantity as i64
    }
}

/// Sum of line totals at current catalog prices
pub fn cart_total(lines: &[CartLine]) -> i64 {
    lines.iter().map(CartLine::line_total).sum()
}
