//! In-process store with the same semantics as the Postgres service
//!
//! Used by the test suite and for running the bot locally without a database.
//! A single mutex guards all tables, so every trait method is atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::database::Store;
use crate::models::*;
use crate::state::ConversationState;
use crate::utils::errors::Result;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    employees: BTreeMap<i64, Employee>,
    states: HashMap<i64, ConversationState>,
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, Product>,
    carts: HashMap<i64, Vec<(i64, i32)>>,
    orders: BTreeMap<i64, Order>,
    order_items: Vec<OrderItem>,
    chats: Vec<ChatRegistration>,
    presence: BTreeMap<i64, Presence>,
    daily: HashMap<(i64, NaiveDate), (i64, i64)>,
    sequence: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn touch(&mut self, vk_id: i64, username: &str, status: PresenceStatus, now: DateTime<Utc>, messages: i64) {
        let credited = self.presence.get(&vk_id).map(|p| p.credited_minutes(now)).unwrap_or(0);
        let entry = self.presence.entry(vk_id).or_insert_with(|| Presence {
            vk_id,
            username: username.to_string(),
            status,
            last_activity: now,
            online_minutes: 0,
        });
        entry.username = username.to_string();
        entry.status = status;
        entry.last_activity = now;
        entry.online_minutes += credited;

        let day = self.daily.entry((vk_id, now.date_naive())).or_insert((0, 0));
        day.0 += messages;
        day.1 += credited;
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, vk_id: i64) -> Result<Option<User>> {
        Ok(self.tables().users.get(&vk_id).cloned())
    }

    async fn create_user(&self, vk_id: i64, username: &str) -> Result<User> {
        let mut tables = self.tables();
        let user = tables.users.entry(vk_id).or_insert_with(|| User {
            vk_id,
            username: String::new(),
            role: Role::Client,
            blacklisted_until: None,
            created_at: Utc::now(),
        });
        if user.username.is_empty() {
            user.username = username.to_string();
        }
        Ok(user.clone())
    }

    async fn set_blacklist(&self, vk_id: i64, until: Option<DateTime<Utc>>) -> Result<()> {
        let mut tables = self.tables();
        let user = tables.users.entry(vk_id).or_insert_with(|| User {
            vk_id,
            username: String::new(),
            role: Role::Client,
            blacklisted_until: None,
            created_at: Utc::now(),
        });
        user.blacklisted_until = until;
        Ok(())
    }

    async fn get_employee(&self, vk_id: i64) -> Result<Option<Employee>> {
        Ok(self.tables().employees.get(&vk_id).cloned())
    }

    async fn upsert_employee(&self, vk_id: i64, username: &str, role: Role) -> Result<Employee> {
        let mut tables = self.tables();
        let now = Utc::now();
        let employee = tables.employees.entry(vk_id).or_insert_with(|| Employee {
            vk_id,
            username: username.to_string(),
            role,
            created_at: now,
        });
        employee.username = username.to_string();
        employee.role = role;
        let employee = employee.clone();

        let user = tables.users.entry(vk_id).or_insert_with(|| User {
            vk_id,
            username: username.to_string(),
            role,
            blacklisted_until: None,
            created_at: now,
        });
        user.role = role;
        Ok(employee)
    }

    async fn employees_by_roles(&self, roles: &[Role]) -> Result<Vec<Employee>> {
        let mut employees: Vec<Employee> = self
            .tables()
            .employees
            .values()
            .filter(|e| roles.contains(&e.role))
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(employees)
    }

    async fn get_state(&self, user_id: i64) -> Result<Option<ConversationState>> {
        Ok(self.tables().states.get(&user_id).cloned())
    }

    async fn set_state(&self, state: &ConversationState) -> Result<()> {
        self.tables().states.insert(state.user_id, state.clone());
        Ok(())
    }

    async fn clear_state(&self, user_id: i64) -> Result<()> {
        self.tables().states.remove(&user_id);
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.tables().categories.values().cloned().collect())
    }

    async fn category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.tables().categories.get(&id).cloned())
    }

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category> {
        let mut tables = self.tables();
        let category = Category {
            id: tables.next_id(),
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables();
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        let removed: Vec<i64> = tables
            .products
            .values()
            .filter(|p| p.category_id == id)
            .map(|p| p.id)
            .collect();
        tables.products.retain(|_, p| p.category_id != id);
        for lines in tables.carts.values_mut() {
            lines.retain(|(product_id, _)| !removed.contains(product_id));
        }
        for item in tables.order_items.iter_mut() {
            if item.product_id.is_some_and(|pid| removed.contains(&pid)) {
                item.product_id = None;
            }
        }
        Ok(true)
    }

    async fn products_by_category(&self, category_id: i64) -> Result<Vec<Product>> {
        Ok(self
            .tables()
            .products
            .values()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn product(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.tables().products.get(&id).cloned())
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.tables().products.values().cloned().collect();
        products.sort_by_key(|p| (p.category_id, p.id));
        Ok(products)
    }

    async fn create_product(&self, request: &CreateProductRequest) -> Result<Product> {
        let mut tables = self.tables();
        let product = Product {
            id: tables.next_id(),
            category_id: request.category_id,
            name: request.name.clone(),
            nutrition: request.nutrition.clone(),
            price: request.price,
            cost_price: request.cost_price,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables();
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        for lines in tables.carts.values_mut() {
            lines.retain(|(product_id, _)| *product_id != id);
        }
        for item in tables.order_items.iter_mut() {
            if item.product_id == Some(id) {
                item.product_id = None;
            }
        }
        Ok(true)
    }

    async fn cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>> {
        let tables = self.tables();
        let lines = tables
            .carts
            .get(&user_id)
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(|(product_id, quantity)| {
                        tables.products.get(product_id).map(|product| CartLine {
                            product: product.clone(),
                            quantity: *quantity,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(lines)
    }

    async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<()> {
        let mut tables = self.tables();
        let lines = tables.carts.entry(user_id).or_default();
        match lines.iter_mut().find(|(pid, _)| *pid == product_id) {
            Some((_, existing)) => *existing += quantity,
            None => lines.push((product_id, quantity)),
        }
        Ok(())
    }

    async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> Result<bool> {
        let mut tables = self.tables();
        let Some(lines) = tables.carts.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = lines.len();
        lines.retain(|(pid, _)| *pid != product_id);
        Ok(lines.len() != before)
    }

    async fn clear_cart(&self, user_id: i64) -> Result<()> {
        self.tables().carts.remove(&user_id);
        Ok(())
    }

    async fn place_order(&self, order: &NewOrder) -> Result<Order> {
        let mut tables = self.tables();
        let created = Order {
            id: tables.next_id(),
            client_vk_id: order.client_vk_id,
            client_username: order.client_username.clone(),
            delivery_location: order.delivery_location.clone(),
            total_price: order.total_price(),
            total_cost: order.total_cost(),
            status: OrderStatus::Pending,
            courier_vk_id: None,
            courier_username: None,
            estimated_time: None,
            acceptance_deadline: Some(order.acceptance_deadline),
            dispatch_message_id: None,
            created_at: Utc::now(),
            accepted_at: None,
            completed_at: None,
        };

        for item in &order.items {
            let id = tables.next_id();
            tables.order_items.push(OrderItem {
                id,
                order_id: created.id,
                product_id: Some(item.product_id),
                product_name: item.product_name.clone(),
                product_nutrition: item.product_nutrition.clone(),
                product_price: item.product_price,
                product_cost_price: item.product_cost_price,
                quantity: item.quantity,
            });
        }

        tables.orders.insert(created.id, created.clone());
        tables.carts.remove(&order.client_vk_id);
        tables.states.remove(&order.client_vk_id);
        Ok(created)
    }

    async fn order(&self, id: i64) -> Result<Option<Order>> {
        Ok(self.tables().orders.get(&id).cloned())
    }

    async fn order_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        Ok(self
            .tables()
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn active_orders_for_client(&self, client_vk_id: i64, limit: i64) -> Result<Vec<Order>> {
        Ok(self
            .tables()
            .orders
            .values()
            .rev()
            .filter(|o| o.client_vk_id == client_vk_id && o.status.is_active())
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn claim_order(&self, order_id: i64, courier_vk_id: i64, courier_username: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.tables();
        match tables.orders.get_mut(&order_id) {
            Some(order) if order.status == OrderStatus::Pending => {
                order.status = OrderStatus::Accepted;
                order.courier_vk_id = Some(courier_vk_id);
                order.courier_username = Some(courier_username.to_string());
                order.accepted_at = Some(now);
                order.acceptance_deadline = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_estimate(&self, order_id: i64, courier_vk_id: i64, estimate: &str) -> Result<bool> {
        let mut tables = self.tables();
        match tables.orders.get_mut(&order_id) {
            Some(order)
                if order.courier_vk_id == Some(courier_vk_id)
                    && matches!(order.status, OrderStatus::Accepted | OrderStatus::Preparing | OrderStatus::Delivering) =>
            {
                order.estimated_time = Some(estimate.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_order_status(&self, order_id: i64, from: OrderStatus, to: OrderStatus, now: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.tables();
        match tables.orders.get_mut(&order_id) {
            Some(order) if order.status == from => {
                order.status = to;
                if to == OrderStatus::Completed {
                    order.completed_at = Some(now);
                }
                if to != OrderStatus::Pending {
                    order.acceptance_deadline = None;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_dispatch_message(&self, order_id: i64, message_id: Option<i64>) -> Result<()> {
        if let Some(order) = self.tables().orders.get_mut(&order_id) {
            order.dispatch_message_id = message_id;
        }
        Ok(())
    }

    async fn arm_acceptance_timer(&self, order_id: i64, deadline: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.tables();
        match tables.orders.get_mut(&order_id) {
            Some(order) if order.status == OrderStatus::Pending => {
                order.acceptance_deadline = Some(deadline);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn due_acceptance_timers(&self, now: DateTime<Utc>) -> Result<Vec<Order>> {
        let mut due: Vec<Order> = self
            .tables()
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Pending && o.acceptance_deadline.is_some_and(|d| d <= now))
            .cloned()
            .collect();
        due.sort_by_key(|o| o.acceptance_deadline);
        Ok(due)
    }

    async fn fire_acceptance_timer(&self, order_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.tables();
        match tables.orders.get_mut(&order_id) {
            Some(order)
                if order.status == OrderStatus::Pending
                    && order.acceptance_deadline.is_some_and(|d| d <= now) =>
            {
                order.acceptance_deadline = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn completed_orders_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Order>> {
        Ok(self
            .tables()
            .orders
            .values()
            .filter(|o| {
                o.status == OrderStatus::Completed
                    && o.completed_at.is_some_and(|at| at >= from && at < to)
            })
            .cloned()
            .collect())
    }

    async fn chat_by_peer(&self, peer_id: i64) -> Result<Option<ChatRegistration>> {
        Ok(self.tables().chats.iter().find(|c| c.peer_id == peer_id).cloned())
    }

    async fn chat_by_role(&self, role: ChatRole) -> Result<Option<ChatRegistration>> {
        Ok(self.tables().chats.iter().find(|c| c.chat_type == role).cloned())
    }

    async fn save_chat(&self, peer_id: i64, role: ChatRole, title: &str) -> Result<ChatRegistration> {
        let mut tables = self.tables();
        if let Some(existing) = tables.chats.iter().find(|c| c.peer_id == peer_id) {
            return Ok(existing.clone());
        }
        let chat = ChatRegistration {
            peer_id,
            chat_type: role,
            title: title.to_string(),
            created_at: Utc::now(),
        };
        tables.chats.push(chat.clone());
        Ok(chat)
    }

    async fn all_chats(&self) -> Result<Vec<ChatRegistration>> {
        Ok(self.tables().chats.clone())
    }

    async fn record_staff_message(&self, vk_id: i64, username: &str, now: DateTime<Utc>) -> Result<()> {
        self.tables().touch(vk_id, username, PresenceStatus::Online, now, 1);
        Ok(())
    }

    async fn set_presence(&self, vk_id: i64, username: &str, status: PresenceStatus, now: DateTime<Utc>) -> Result<()> {
        self.tables().touch(vk_id, username, status, now, 0);
        Ok(())
    }

    async fn online_staff(&self, since: DateTime<Utc>) -> Result<Vec<Presence>> {
        let mut online: Vec<Presence> = self
            .tables()
            .presence
            .values()
            .filter(|p| p.status != PresenceStatus::Offline && p.last_activity >= since)
            .cloned()
            .collect();
        online.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(online)
    }

    async fn staff_stats(&self, vk_id: i64, now: DateTime<Utc>) -> Result<StaffStats> {
        let tables = self.tables();
        let today = now.date_naive();
        let week_from = today - Duration::days(6);
        let mut stats = StaffStats::default();

        for ((id, date), (messages, minutes)) in tables.daily.iter() {
            if *id != vk_id || *date < week_from {
                continue;
            }
            stats.messages_week += messages;
            stats.online_minutes_week += minutes;
            if *date == today {
                stats.messages_today += messages;
                stats.online_minutes_today += minutes;
            }
        }

        let week_ago = now - Duration::days(7);
        stats.orders_accepted_week = tables
            .orders
            .values()
            .filter(|o| o.courier_vk_id == Some(vk_id) && o.accepted_at.is_some_and(|at| at >= week_ago))
            .count() as i64;

        Ok(stats)
    }
}
