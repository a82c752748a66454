//! Store contract consumed by the routing and order core
//!
//! Every implementation must honour the atomic operations documented on
//! [`Store::place_order`], [`Store::claim_order`] and
//! [`Store::fire_acceptance_timer`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::*;
use crate::state::ConversationState;
use crate::utils::errors::Result;

#[async_trait]
pub trait Store: Send + Sync {
    // Users

    async fn get_user(&self, vk_id: i64) -> Result<Option<User>>;

    /// Insert a client row if none exists and return the stored user
    async fn create_user(&self, vk_id: i64, username: &str) -> Result<User>;

    /// Set or lift a blacklist, creating the user row when missing
    async fn set_blacklist(&self, vk_id: i64, until: Option<DateTime<Utc>>) -> Result<()>;

    // Employees

    async fn get_employee(&self, vk_id: i64) -> Result<Option<Employee>>;

    /// Insert or update an employee and mirror the role onto the user row
    async fn upsert_employee(&self, vk_id: i64, username: &str, role: Role) -> Result<Employee>;

    async fn employees_by_roles(&self, roles: &[Role]) -> Result<Vec<Employee>>;

    // Conversation state

    async fn get_state(&self, user_id: i64) -> Result<Option<ConversationState>>;

    async fn set_state(&self, state: &ConversationState) -> Result<()>;

    async fn clear_state(&self, user_id: i64) -> Result<()>;

    // Catalog

    async fn categories(&self) -> Result<Vec<Category>>;

    async fn category(&self, id: i64) -> Result<Option<Category>>;

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category>;

    /// Delete a category with its products; returns false if nothing was removed
    async fn delete_category(&self, id: i64) -> Result<bool>;

    async fn products_by_category(&self, category_id: i64) -> Result<Vec<Product>>;

    async fn product(&self, id: i64) -> Result<Option<Product>>;

    async fn all_products(&self) -> Result<Vec<Product>>;

    async fn create_product(&self, request: &CreateProductRequest) -> Result<Product>;

    /// Delete a product and drop it from every cart
    async fn delete_product(&self, id: i64) -> Result<bool>;

    // Cart

    /// Cart lines whose products still exist, in insertion order
    async fn cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>>;

    /// Add `quantity` to the line, creating it when missing
    async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<()>;

    async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> Result<bool>;

    async fn clear_cart(&self, user_id: i64) -> Result<()>;

    // Orders

    /// Insert the order with its items, clear the client's cart and state; all or nothing
    async fn place_order(&self, order: &NewOrder) -> Result<Order>;

    async fn order(&self, id: i64) -> Result<Option<Order>>;

    async fn order_items(&self, order_id: i64) -> Result<Vec<OrderItem>>;

    /// Newest first, restricted to active statuses
    async fn active_orders_for_client(&self, client_vk_id: i64, limit: i64) -> Result<Vec<Order>>;

    /// Set status=accepted where status=pending; true for exactly one caller
    async fn claim_order(&self, order_id: i64, courier_vk_id: i64, courier_username: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Store the courier's ETA on an accepted order assigned to that courier
    async fn record_estimate(&self, order_id: i64, courier_vk_id: i64, estimate: &str) -> Result<bool>;

    /// Compare-and-set the status; sets `completed_at` when moving to completed
    async fn update_order_status(&self, order_id: i64, from: OrderStatus, to: OrderStatus, now: DateTime<Utc>) -> Result<bool>;

    async fn set_dispatch_message(&self, order_id: i64, message_id: Option<i64>) -> Result<()>;

    /// Arm the acceptance deadline of a pending order
    async fn arm_acceptance_timer(&self, order_id: i64, deadline: DateTime<Utc>) -> Result<bool>;

    /// Pending orders whose deadline has passed
    async fn due_acceptance_timers(&self, now: DateTime<Utc>) -> Result<Vec<Order>>;

    /// Clear a due deadline of a pending order; true for exactly one caller
    async fn fire_acceptance_timer(&self, order_id: i64, now: DateTime<Utc>) -> Result<bool>;

    async fn completed_orders_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Order>>;

    // Chats

    async fn chat_by_peer(&self, peer_id: i64) -> Result<Option<ChatRegistration>>;

    async fn chat_by_role(&self, role: ChatRole) -> Result<Option<ChatRegistration>>;

    /// Register a chat; an existing registration for the peer is kept as is
    async fn save_chat(&self, peer_id: i64, role: ChatRole, title: &str) -> Result<ChatRegistration>;

    async fn all_chats(&self) -> Result<Vec<ChatRegistration>>;

    // Staff activity

    /// Count one message for today and refresh presence
    async fn record_staff_message(&self, vk_id: i64, username: &str, now: DateTime<Utc>) -> Result<()>;

    async fn set_presence(&self, vk_id: i64, username: &str, status: PresenceStatus, now: DateTime<Utc>) -> Result<()>;

    /// Staff online or AFK with activity since `since`
    async fn online_staff(&self, since: DateTime<Utc>) -> Result<Vec<Presence>>;

    async fn staff_stats(&self, vk_id: i64, now: DateTime<Utc>) -> Result<StaffStats>;
}
