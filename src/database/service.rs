//! Database service layer
//!
//! This module provides the Postgres-backed [`Store`] over per-table repositories

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::{
    ActivityRepository, CatalogRepository, ChatRepository, DatabasePool, OrderRepository,
    StateRepository, Store, UserRepository,
};
use crate::models::*;
use crate::state::ConversationState;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub states: StateRepository,
    pub catalog: CatalogRepository,
    pub orders: OrderRepository,
    pub chats: ChatRepository,
    pub activity: ActivityRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            states: StateRepository::new(pool.clone()),
            catalog: CatalogRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            chats: ChatRepository::new(pool.clone()),
            activity: ActivityRepository::new(pool),
        }
    }
}

#[async_trait]
impl Store for DatabaseService {
    async fn get_user(&self, vk_id: i64) -> Result<Option<User>> {
        self.users.find_by_vk_id(vk_id).await
    }

    async fn create_user(&self, vk_id: i64, username: &str) -> Result<User> {
        self.users.create_if_missing(vk_id, username).await
    }

    async fn set_blacklist(&self, vk_id: i64, until: Option<DateTime<Utc>>) -> Result<()> {
        self.users.set_blacklist(vk_id, until).await
    }

    async fn get_employee(&self, vk_id: i64) -> Result<Option<Employee>> {
        self.users.find_employee(vk_id).await
    }

    async fn upsert_employee(&self, vk_id: i64, username: &str, role: Role) -> Result<Employee> {
        self.users.upsert_employee(vk_id, username, role).await
    }

    async fn employees_by_roles(&self, roles: &[Role]) -> Result<Vec<Employee>> {
        self.users.employees_by_roles(roles).await
    }

    async fn get_state(&self, user_id: i64) -> Result<Option<ConversationState>> {
        self.states.find(user_id).await
    }

    async fn set_state(&self, state: &ConversationState) -> Result<()> {
        self.states.upsert(state).await
    }

    async fn clear_state(&self, user_id: i64) -> Result<()> {
        self.states.delete(user_id).await
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        self.catalog.categories().await
    }

    async fn category(&self, id: i64) -> Result<Option<Category>> {
        self.catalog.find_category(id).await
    }

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category> {
        self.catalog.create_category(name, description).await
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        self.catalog.delete_category(id).await
    }

    async fn products_by_category(&self, category_id: i64) -> Result<Vec<Product>> {
        self.catalog.products_by_category(category_id).await
    }

    async fn product(&self, id: i64) -> Result<Option<Product>> {
        self.catalog.find_product(id).await
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        self.catalog.all_products().await
    }

    async fn create_product(&self, request: &CreateProductRequest) -> Result<Product> {
        self.catalog.create_product(request).await
    }

    async fn delete_product(&self, id: i64) -> Result<bool> {
        self.catalog.delete_product(id).await
    }

    async fn cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>> {
        self.catalog.cart_lines(user_id).await
    }

    async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<()> {
        self.catalog.add_to_cart(user_id, product_id, quantity).await
    }

    async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> Result<bool> {
        self.catalog.remove_from_cart(user_id, product_id).await
    }

    async fn clear_cart(&self, user_id: i64) -> Result<()> {
        self.catalog.clear_cart(user_id).await
    }

    async fn place_order(&self, order: &NewOrder) -> Result<Order> {
        self.orders.place(order).await
    }

    async fn order(&self, id: i64) -> Result<Option<Order>> {
        self.orders.find_by_id(id).await
    }

    async fn order_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        self.orders.items(order_id).await
    }

    async fn active_orders_for_client(&self, client_vk_id: i64, limit: i64) -> Result<Vec<Order>> {
        self.orders.active_for_client(client_vk_id, limit).await
    }

    async fn claim_order(&self, order_id: i64, courier_vk_id: i64, courier_username: &str, now: DateTime<Utc>) -> Result<bool> {
        self.orders.claim(order_id, courier_vk_id, courier_username, now).await
    }

    async fn record_estimate(&self, order_id: i64, courier_vk_id: i64, estimate: &str) -> Result<bool> {
        self.orders.record_estimate(order_id, courier_vk_id, estimate).await
    }

    async fn update_order_status(&self, order_id: i64, from: OrderStatus, to: OrderStatus, now: DateTime<Utc>) -> Result<bool> {
        self.orders.update_status(order_id, from, to, now).await
    }

    async fn set_dispatch_message(&self, order_id: i64, message_id: Option<i64>) -> Result<()> {
        self.orders.set_dispatch_message(order_id, message_id).await
    }

    async fn arm_acceptance_timer(&self, order_id: i64, deadline: DateTime<Utc>) -> Result<bool> {
        self.orders.arm_deadline(order_id, deadline).await
    }

    async fn due_acceptance_timers(&self, now: DateTime<Utc>) -> Result<Vec<Order>> {
        self.orders.due_deadlines(now).await
    }

    async fn fire_acceptance_timer(&self, order_id: i64, now: DateTime<Utc>) -> Result<bool> {
        self.orders.fire_deadline(order_id, now).await
    }

    async fn completed_orders_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Order>> {
        self.orders.completed_between(from, to).await
    }

    async fn chat_by_peer(&self, peer_id: i64) -> Result<Option<ChatRegistration>> {
        self.chats.find_by_peer(peer_id).await
    }

    async fn chat_by_role(&self, role: ChatRole) -> Result<Option<ChatRegistration>> {
        self.chats.find_by_role(role).await
    }

    async fn save_chat(&self, peer_id: i64, role: ChatRole, title: &str) -> Result<ChatRegistration> {
        self.chats.save(peer_id, role, title).await
    }

    async fn all_chats(&self) -> Result<Vec<ChatRegistration>> {
        self.chats.all().await
    }

    async fn record_staff_message(&self, vk_id: i64, username: &str, now: DateTime<Utc>) -> Result<()> {
        self.activity.record_message(vk_id, username, now).await
    }

    async fn set_presence(&self, vk_id: i64, username: &str, status: PresenceStatus, now: DateTime<Utc>) -> Result<()> {
        self.activity.set_presence(vk_id, username, status, now).await
    }

    async fn online_staff(&self, since: DateTime<Utc>) -> Result<Vec<Presence>> {
        self.activity.online_since(since).await
    }

    async fn staff_stats(&self, vk_id: i64, now: DateTime<Utc>) -> Result<StaffStats> {
        self.activity.stats(vk_id, now).await
    }
}
