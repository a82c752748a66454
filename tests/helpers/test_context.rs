//! Test context for unified test setup
//!
//! Wires an [`AppContext`] over the in-memory store and the recording
//! gateway, and drives it through the same webhook entry point the HTTP
//! server uses.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use CourierHub::config::Settings;
use CourierHub::database::{MemoryStore, Store};
use CourierHub::handle_webhook;
use CourierHub::models::{ChatRole, Role};
use CourierHub::services::MessagingGateway;
use CourierHub::state::AppContext;

use super::recording_gateway::RecordingGateway;
use super::test_data::*;

pub struct TestContext {
    pub app: AppContext,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<RecordingGateway>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(RecordingGateway::new());
        let app = AppContext::new(
            settings,
            store.clone() as Arc<dyn Store>,
            gateway.clone() as Arc<dyn MessagingGateway>,
        );
        Self { app, store, gateway }
    }

    /// A context with every chat registered, staff hired and a catalog
    pub async fn ready() -> (Self, SeededCatalog) {
        let ctx = Self::new();
        ctx.register_all_chats().await;
        ctx.hire_staff().await;
        let catalog = ctx.seed_catalog().await;
        (ctx, catalog)
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Deliver a raw event body
    pub async fn deliver(&self, event: Value) -> String {
        handle_webhook(&self.app, event.to_string().as_bytes()).await
    }

    /// Deliver a `message_new` event in the current API shape
    pub async fn deliver_message(&self, message: Value) -> String {
        self.deliver(json!({
            "type": "message_new",
            "group_id": GROUP_ID,
            "secret": SECRET,
            "object": { "message": message },
        }))
        .await
    }

    pub async fn private_text(&self, user_id: i64, text: &str) -> String {
        self.deliver_message(json!({ "peer_id": user_id, "from_id": user_id, "text": text }))
            .await
    }

    pub async fn private_payload(&self, user_id: i64, payload: Value) -> String {
        self.deliver_message(json!({
            "peer_id": user_id,
            "from_id": user_id,
            "text": "",
            "payload": payload.to_string(),
        }))
        .await
    }

    pub async fn group_text(&self, peer_id: i64, user_id: i64, text: &str) -> String {
        self.deliver_message(json!({ "peer_id": peer_id, "from_id": user_id, "text": text }))
            .await
    }

    pub async fn group_payload(&self, peer_id: i64, user_id: i64, payload: Value) -> String {
        self.deliver_message(json!({
            "peer_id": peer_id,
            "from_id": user_id,
            "text": "",
            "payload": payload.to_string(),
        }))
        .await
    }

    pub async fn register_all_chats(&self) {
        for role in ChatRole::ALL {
            self.store
                .save_chat(chat_peer(role), role, &format!("{} курьеров", role.title_marker()))
                .await
                .unwrap();
        }
    }

    pub async fn hire_staff(&self) {
        for (vk_id, name, role) in [
            (COURIER_ID, "Курьер Петя", Role::Courier),
            (SECOND_COURIER_ID, "Курьер Вася", Role::Courier),
            (SENIOR_ID, "Старший Олег", Role::Senior),
            (MANAGER_ID, "Руководитель Анна", Role::Management),
        ] {
            self.store.upsert_employee(vk_id, name, role).await.unwrap();
        }
    }

    /// One category with a 100 and a 150 product
    pub async fn seed_catalog(&self) -> SeededCatalog {
        let category = self.store.create_category("Бургеры", Some("Горячее")).await.unwrap();
        let cheap = self
            .store
            .create_product(&product_request(category.id, "Чизбургер", 100, 40))
            .await
            .unwrap();
        let pricey = self
            .store
            .create_product(&product_request(category.id, "Двойной", 150, 70))
            .await
            .unwrap();

        SeededCatalog {
            category_id: category.id,
            cheap_id: cheap.id,
            pricey_id: pricey.id,
        }
    }

    /// Walk a client from the menu to a placed order and return its id
    pub async fn place_order(&self, client_id: i64, product_ids: &[i64]) -> i64 {
        for product_id in product_ids {
            self.private_payload(client_id, json!({ "command": "add_to_cart", "productId": product_id }))
                .await;
        }
        self.private_payload(client_id, json!({ "action": "checkout" })).await;
        self.private_text(client_id, "Клиент").await;
        self.private_text(client_id, "ул. Ленина, 1").await;
        self.private_payload(client_id, json!({ "command": "confirm_order" })).await;

        let orders = self.store.active_orders_for_client(client_id, 10).await.unwrap();
        orders.iter().map(|o| o.id).max().expect("order was not placed")
    }
}

pub struct SeededCatalog {
    pub category_id: i64,
    pub cheap_id: i64,
    pub pricey_id: i64,
}
