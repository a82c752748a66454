//! Button payload decoding
//!
//! A payload is a JSON object sent back verbatim when a keyboard button is
//! pressed. It is decoded once per message into an [`Intent`]; keys the bot
//! does not know are ignored.

use serde_json::{Map, Value};

use crate::services::CourierSignal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// No payload, or one that is not a JSON object
    None,
    Start,
    Catalog,
    Order,
    Cart,
    MyOrders,
    Employment,
    Faq,
    Back,
    Category { category_id: i64, page: usize },
    Page { category_id: i64, page: usize },
    AddToCart { product_id: i64 },
    RemoveItem,
    RemoveFromCart { product_id: i64 },
    ClearCart,
    Checkout,
    ConfirmOrder,
    CancelOrder,
    Answer(bool),
    AcceptOrder { order_id: i64 },
    Courier { order_id: i64, signal: CourierSignal },
    OrderStatus { order_id: i64 },
    /// A command the bot does not recognize, or one missing its ids
    Unknown(String),
}

fn get_i64(object: &Map<String, Value>, camel: &str, snake: &str) -> Option<i64> {
    object
        .get(camel)
        .or_else(|| object.get(snake))
        .and_then(|value| match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

impl Intent {
    pub fn decode(payload: Option<&str>) -> Intent {
        let Some(raw) = payload.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Intent::None;
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => Intent::from_object(&object),
            _ => Intent::None,
        }
    }

    fn from_object(object: &Map<String, Value>) -> Intent {
        let command = object
            .get("command")
            .or_else(|| object.get("action"))
            .and_then(Value::as_str);

        let Some(command) = command else {
            return match object.get("answer").and_then(Value::as_str) {
                Some(answer) => Intent::Answer(answer == "yes"),
                None => Intent::None,
            };
        };

        let category_id = get_i64(object, "categoryId", "category_id");
        let product_id = get_i64(object, "productId", "product_id");
        let order_id = get_i64(object, "orderId", "order_id");
        let page = get_i64(object, "page", "page").map_or(0, |p| p.max(0) as usize);
        let unknown = || Intent::Unknown(command.to_string());

        let courier = |signal| match order_id {
            Some(order_id) => Intent::Courier { order_id, signal },
            None => unknown(),
        };

        match command {
            "start" | "main_menu" => Intent::Start,
            "catalog" => Intent::Catalog,
            "order" => Intent::Order,
            "cart" | "view_cart" => Intent::Cart,
            "my_orders" => Intent::MyOrders,
            "employment" => Intent::Employment,
            "faq" => Intent::Faq,
            "back" => Intent::Back,
            "category" => category_id.map_or_else(unknown, |category_id| Intent::Category { category_id, page }),
            "page" => category_id.map_or_else(unknown, |category_id| Intent::Page { category_id, page }),
            "add_to_cart" => product_id.map_or_else(unknown, |product_id| Intent::AddToCart { product_id }),
            "remove_item" => Intent::RemoveItem,
            "remove_from_cart" => product_id.map_or_else(unknown, |product_id| Intent::RemoveFromCart { product_id }),
            "clear_cart" => Intent::ClearCart,
            "checkout" => Intent::Checkout,
            "confirm_order" => Intent::ConfirmOrder,
            "cancel_order" => Intent::CancelOrder,
            "answer" => match object.get("answer").and_then(Value::as_str) {
                Some(answer) => Intent::Answer(answer == "yes"),
                None => unknown(),
            },
            "accept_order" => order_id.map_or_else(unknown, |order_id| Intent::AcceptOrder { order_id }),
            "preparing" => courier(CourierSignal::Preparing),
            "order_ready" => courier(CourierSignal::Ready),
            "arrived" => courier(CourierSignal::Arrived),
            "complete_order" => courier(CourierSignal::Complete),
            "order_status" => order_id.map_or_else(unknown, |order_id| Intent::OrderStatus { order_id }),
            _ => unknown(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Intent::None)
    }
}
