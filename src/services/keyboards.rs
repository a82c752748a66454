//! Inline keyboard layouts
//!
//! Buttons carry a JSON payload that comes back verbatim with the next
//! message; see `handlers::payload` for the decoding side.

use serde::Serialize;
use serde_json::json;

use crate::models::{CartLine, Category, Product};
use crate::utils::helpers::{truncate_text, MAX_BUTTON_LABEL_LENGTH};

/// Products shown per catalog page
pub const PRODUCTS_PER_PAGE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonColor {
    Primary,
    Secondary,
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub action: ButtonAction,
    pub color: ButtonColor,
}

impl Button {
    pub fn text(label: &str, payload: serde_json::Value, color: ButtonColor) -> Self {
        Self {
            action: ButtonAction {
                kind: "text".to_string(),
                label: truncate_text(label, MAX_BUTTON_LABEL_LENGTH),
                payload: payload.to_string(),
            },
            color,
        }
    }

    fn command(label: &str, command: &str, color: ButtonColor) -> Self {
        Self::text(label, json!({ "command": command }), color)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyboard {
    pub inline: bool,
    pub buttons: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn inline(buttons: Vec<Vec<Button>>) -> Self {
        Self { inline: true, buttons }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub fn main_menu() -> Keyboard {
    Keyboard::inline(vec![
        vec![
            Button::command("📋 Каталог", "catalog", ButtonColor::Primary),
            Button::command("🛒 Заказать", "order", ButtonColor::Positive),
        ],
        vec![
            Button::command("💼 Трудоустройство", "employment", ButtonColor::Secondary),
            Button::command("❓ Частые вопросы", "faq", ButtonColor::Secondary),
        ],
        vec![
            Button::command("🛒 Корзина", "view_cart", ButtonColor::Secondary),
            Button::command("📦 Мои заказы", "my_orders", ButtonColor::Secondary),
        ],
    ])
}

pub fn back_button(command: &str) -> Keyboard {
    Keyboard::inline(vec![vec![Button::command("◀️ Назад", command, ButtonColor::Negative)]])
}

/// Two categories per row, then a back button
pub fn categories(categories: &[Category], back_command: &str) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = categories
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|c| {
                    Button::text(
                        &c.name,
                        json!({ "command": "category", "categoryId": c.id }),
                        ButtonColor::Primary,
                    )
                })
                .collect()
        })
        .collect();
    rows.push(vec![Button::command("◀️ Назад", back_command, ButtonColor::Negative)]);
    Keyboard::inline(rows)
}

pub fn products(products: &[Product], page: usize, category_id: i64) -> Keyboard {
    let start = (page * PRODUCTS_PER_PAGE).min(products.len());
    let end = (start + PRODUCTS_PER_PAGE).min(products.len());

    let mut rows: Vec<Vec<Button>> = products[start..end]
        .iter()
        .map(|p| {
            vec![Button::text(
                &format!("{} - {}р.", p.label(), p.price),
                json!({ "command": "add_to_cart", "productId": p.id }),
                ButtonColor::Positive,
            )]
        })
        .collect();

    let mut pagination = Vec::new();
    if page > 0 {
        pagination.push(Button::text(
            "⬅️",
            json!({ "command": "page", "categoryId": category_id, "page": page - 1 }),
            ButtonColor::Secondary,
        ));
    }
    if end < products.len() {
        pagination.push(Button::text(
            "➡️",
            json!({ "command": "page", "categoryId": category_id, "page": page + 1 }),
            ButtonColor::Secondary,
        ));
    }
    if !pagination.is_empty() {
        rows.push(pagination);
    }

    rows.push(vec![Button::command("◀️ К категориям", "order", ButtonColor::Negative)]);
    Keyboard::inline(rows)
}

pub fn cart() -> Keyboard {
    Keyboard::inline(vec![
        vec![Button::command("➕ Добавить товар", "order", ButtonColor::Positive)],
        vec![
            Button::command("🗑 Удалить товар", "remove_item", ButtonColor::Secondary),
            Button::command("🧹 Очистить корзину", "clear_cart", ButtonColor::Negative),
        ],
        vec![Button::command("✅ Оформить заказ", "checkout", ButtonColor::Positive)],
        vec![Button::command("◀️ Главное меню", "main_menu", ButtonColor::Negative)],
    ])
}

pub fn remove_items(lines: &[CartLine]) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = lines
        .iter()
        .map(|line| {
            vec![Button::text(
                &format!("❌ {}", line.product.name),
                json!({ "command": "remove_from_cart", "productId": line.product.id }),
                ButtonColor::Negative,
            )]
        })
        .collect();
    rows.push(vec![Button::command("◀️ Назад", "cart", ButtonColor::Secondary)]);
    Keyboard::inline(rows)
}

pub fn cart_actions() -> Keyboard {
    Keyboard::inline(vec![
        vec![
            Button::command("➕ Добавить товар", "order", ButtonColor::Primary),
            Button::text("🗑️ Очистить", json!({ "action": "clear_cart" }), ButtonColor::Negative),
        ],
        vec![Button::text("✅ Оформить заказ", json!({ "action": "checkout" }), ButtonColor::Positive)],
        vec![Button::command("🏠 Главное меню", "start", ButtonColor::Secondary)],
    ])
}

pub fn confirm_order() -> Keyboard {
    Keyboard::inline(vec![
        vec![
            Button::command("✅ Всё верно", "confirm_order", ButtonColor::Positive),
            Button::command("✏️ Изменить", "cart", ButtonColor::Secondary),
        ],
        vec![Button::command("❌ Отменить", "cancel_order", ButtonColor::Negative)],
    ])
}

pub fn yes_no() -> Keyboard {
    Keyboard::inline(vec![vec![
        Button::text("✅ Да", json!({ "answer": "yes" }), ButtonColor::Positive),
        Button::text("❌ Нет", json!({ "answer": "no" }), ButtonColor::Negative),
    ]])
}

pub fn accept_order(order_id: i64) -> Keyboard {
    Keyboard::inline(vec![vec![Button::text(
        "✅ Принять заказ",
        json!({ "command": "accept_order", "orderId": order_id }),
        ButtonColor::Positive,
    )]])
}

pub fn courier_order(order_id: i64) -> Keyboard {
    let signal = |label: &str, command: &str, color| {
        vec![Button::text(label, json!({ "command": command, "orderId": order_id }), color)]
    };
    Keyboard::inline(vec![
        signal("👨‍🍳 Собираю заказ", "preparing", ButtonColor::Primary),
        signal("✅ Готов, еду к клиенту", "order_ready", ButtonColor::Positive),
        signal("📍 На месте", "arrived", ButtonColor::Primary),
        signal("✔️ Заказ завершён", "complete_order", ButtonColor::Positive),
    ])
}

pub fn client_order_status(order_id: i64) -> Keyboard {
    Keyboard::inline(vec![
        vec![Button::text(
            "📊 Статус заказа",
            json!({ "command": "order_status", "orderId": order_id }),
            ButtonColor::Primary,
        )],
        vec![Button::command("◀️ Главное меню", "main_menu", ButtonColor::Negative)],
    ])
}
