//! Order lifecycle engine
//!
//! Owns every status change of an order: placement and dispatch broadcast,
//! first-wins acceptance, the courier's estimate, deadline escalation,
//! the client's reconfirmation and the courier's progress signals.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::OrdersConfig;
use crate::database::Store;
use crate::models::{ChatRole, NewOrder, Order, OrderItem, OrderStatus};
use crate::services::keyboards;
use crate::services::MessagingGateway;
use crate::state::{ConversationState, DialogueStep};
use crate::utils::errors::{CourierHubError, Result};
use crate::utils::helpers::parse_estimated_time;
use crate::utils::logging::log_order_transition;

/// State data key holding the order a dialogue refers to
pub const ORDER_ID_KEY: &str = "orderId";

#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    /// This courier won the order and is now asked for an estimate
    Claimed(Order),
    /// Someone else was first, or the order left pending
    Unavailable,
    NotFound,
    /// The sender is not an employee
    NotStaff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourierSignal {
    Preparing,
    Ready,
    Arrived,
    Complete,
}

impl CourierSignal {
    pub fn target_status(self) -> OrderStatus {
        match self {
            CourierSignal::Preparing => OrderStatus::Preparing,
            CourierSignal::Ready | CourierSignal::Arrived => OrderStatus::Delivering,
            CourierSignal::Complete => OrderStatus::Completed,
        }
    }

    fn client_notice(self, order_id: i64) -> String {
        match self {
            CourierSignal::Preparing => format!("👨‍🍳 Курьер собирает ваш заказ #{}", order_id),
            CourierSignal::Ready => format!("🚗 Заказ #{} готов, курьер едет к вам!", order_id),
            CourierSignal::Arrived => format!("📍 Курьер на месте! Заказ #{}", order_id),
            CourierSignal::Complete => format!("✅ Заказ #{} доставлен. Спасибо за заказ!", order_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Applied(OrderStatus),
    NotFound,
    /// The sender is not the courier assigned to the order
    NotAssigned,
    /// The order's current status does not allow the signal
    Rejected(OrderStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevanceOutcome {
    /// Broadcast again with a fresh deadline
    Rebroadcast,
    /// Left pending without a deadline
    Kept,
    Cancelled,
    /// The order was already taken or closed
    Settled(OrderStatus),
    NotFound,
}

#[derive(Clone)]
pub struct OrderEngine {
    store: Arc<dyn Store>,
    gateway: Arc<dyn MessagingGateway>,
    config: OrdersConfig,
}

impl OrderEngine {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn MessagingGateway>, config: OrdersConfig) -> Self {
        Self { store, gateway, config }
    }

    pub fn config(&self) -> &OrdersConfig {
        &self.config
    }

    /// Turn the client's cart into a pending order and broadcast it.
    ///
    /// Returns `None` when nothing in the cart still resolves to a product.
    pub async fn place(&self, client_vk_id: i64, username: &str, location: &str, now: DateTime<Utc>) -> Result<Option<Order>> {
        let cart = self.store.cart_lines(client_vk_id).await?;
        let new_order = NewOrder::from_cart(
            client_vk_id,
            username.to_string(),
            location.to_string(),
            &cart,
            now + self.config.acceptance_window(),
        );
        if new_order.items.is_empty() {
            return Ok(None);
        }

        let order = self.store.place_order(&new_order).await?;
        info!(
            order_id = order.id,
            user_id = client_vk_id,
            total_price = order.total_price,
            "Order placed"
        );

        if let Err(e) = self.broadcast(&order).await {
            warn!(order_id = order.id, error = %e, "Failed to broadcast order to dispatch");
        }

        Ok(Some(order))
    }

    /// Post the order to the dispatch chat with an accept button
    pub async fn broadcast(&self, order: &Order) -> Result<()> {
        let Some(dispatch) = self.store.chat_by_role(ChatRole::Dispatch).await? else {
            warn!(order_id = order.id, "Dispatch chat is not registered, order not broadcast");
            return Ok(());
        };

        let items = self.store.order_items(order.id).await?;
        let text = format_dispatch(order, &items);
        let message_id = self
            .gateway
            .send_message(dispatch.peer_id, &text, Some(&keyboards::accept_order(order.id)))
            .await?;
        self.store.set_dispatch_message(order.id, Some(message_id)).await?;

        debug!(order_id = order.id, peer_id = dispatch.peer_id, message_id = message_id, "Order broadcast");
        Ok(())
    }

    /// Handle a courier pressing "accept" under a dispatch broadcast
    pub async fn accept(&self, order_id: i64, courier_vk_id: i64, now: DateTime<Utc>) -> Result<AcceptOutcome> {
        let Some(courier) = self.store.get_employee(courier_vk_id).await? else {
            self.gateway
                .send_message(courier_vk_id, "❌ Ошибка: курьер не найден", None)
                .await?;
            return Ok(AcceptOutcome::NotStaff);
        };

        if !self.store.claim_order(order_id, courier_vk_id, &courier.username, now).await? {
            let outcome = match self.store.order(order_id).await? {
                Some(_) => AcceptOutcome::Unavailable,
                None => AcceptOutcome::NotFound,
            };
            debug!(order_id = order_id, user_id = courier_vk_id, ?outcome, "Acceptance lost");
            self.gateway
                .send_message(courier_vk_id, "❌ Заказ уже принят или отменен", None)
                .await?;
            return Ok(outcome);
        }

        log_order_transition(order_id, OrderStatus::Pending.as_str(), OrderStatus::Accepted.as_str(), Some(courier_vk_id));

        let state = ConversationState::new(courier_vk_id, DialogueStep::EnteringDeliveryTime)
            .with_data(ORDER_ID_KEY, order_id)?;
        self.store.set_state(&state).await?;

        self.gateway
            .send_message(
                courier_vk_id,
                &format!(
                    "📦 Заказ #{} принят!\n\nВведите примерное время доставки (например: \"15 минут\"):",
                    order_id
                ),
                None,
            )
            .await?;

        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(CourierHubError::OrderNotFound { order_id })?;
        self.mark_dispatch_taken(&order).await;

        Ok(AcceptOutcome::Claimed(order))
    }

    async fn mark_dispatch_taken(&self, order: &Order) {
        let Some(message_id) = order.dispatch_message_id else {
            return;
        };
        let result: Result<()> = async {
            let Some(dispatch) = self.store.chat_by_role(ChatRole::Dispatch).await? else {
                return Ok(());
            };
            let items = self.store.order_items(order.id).await?;
            let text = format!(
                "{}\n\n✅ Принял: {}",
                format_dispatch(order, &items),
                order.courier_username.as_deref().unwrap_or("курьер")
            );
            self.gateway.edit_message(dispatch.peer_id, message_id, &text, None).await
        }
        .await;

        if let Err(e) = result {
            warn!(order_id = order.id, error = %e, "Failed to update dispatch message");
        }
    }

    /// Store the courier's estimate, notify the client and hand over the shopping list
    pub async fn record_estimate(&self, courier_vk_id: i64, order_id: i64, text: &str) -> Result<bool> {
        let estimate = parse_estimated_time(text);
        self.store.clear_state(courier_vk_id).await?;

        if !self.store.record_estimate(order_id, courier_vk_id, &estimate).await? {
            self.gateway
                .send_message(courier_vk_id, "❌ Заказ не найден", None)
                .await?;
            return Ok(false);
        }

        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(CourierHubError::OrderNotFound { order_id })?;
        info!(order_id = order_id, user_id = courier_vk_id, estimate = %estimate, "Delivery estimate recorded");

        let courier_name = order.courier_username.clone().unwrap_or_default();
        self.gateway
            .send_message(
                order.client_vk_id,
                &format!("✅ Ваш курьер: {}\nПримерное время ожидания: {}", courier_name, estimate),
                Some(&keyboards::client_order_status(order_id)),
            )
            .await?;

        let items = self.store.order_items(order_id).await?;
        self.gateway
            .send_message(
                courier_vk_id,
                &format!("📝 Список покупок:\n\n{}\n\nНажмите когда будет готово:", shopping_list(&items)),
                Some(&keyboards::courier_order(order_id)),
            )
            .await?;

        Ok(true)
    }

    /// Fire the acceptance deadline of one order and ask the client to reconfirm
    pub async fn escalate(&self, order_id: i64, now: DateTime<Utc>) -> Result<bool> {
        if !self.store.fire_acceptance_timer(order_id, now).await? {
            return Ok(false);
        }

        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(CourierHubError::OrderNotFound { order_id })?;
        info!(order_id = order_id, user_id = order.client_vk_id, "Acceptance window expired");

        let state = ConversationState::new(order.client_vk_id, DialogueStep::ConfirmingOrderRelevance)
            .with_data(ORDER_ID_KEY, order_id)?;
        self.store.set_state(&state).await?;

        self.gateway
            .send_message(
                order.client_vk_id,
                &format!(
                    "⏰ Прошло {} минут. Заказ #{} все еще актуален?",
                    self.config.acceptance_window().num_minutes(),
                    order_id
                ),
                Some(&keyboards::yes_no()),
            )
            .await?;

        Ok(true)
    }

    /// Apply the client's answer to the reconfirmation question
    pub async fn answer_relevance(&self, client_vk_id: i64, order_id: i64, still_relevant: bool, now: DateTime<Utc>) -> Result<RelevanceOutcome> {
        self.store.clear_state(client_vk_id).await?;

        let order = match self.store.order(order_id).await? {
            Some(order) if order.client_vk_id == client_vk_id => order,
            _ => {
                self.gateway
                    .send_message(client_vk_id, "❌ Заказ не найден", Some(&keyboards::main_menu()))
                    .await?;
                return Ok(RelevanceOutcome::NotFound);
            }
        };

        if order.status != OrderStatus::Pending {
            self.gateway
                .send_message(client_vk_id, &format_order_status(&order), Some(&keyboards::main_menu()))
                .await?;
            return Ok(RelevanceOutcome::Settled(order.status));
        }

        let outcome = if still_relevant {
            self.store
                .arm_acceptance_timer(order_id, now + self.config.acceptance_window())
                .await?;
            if let Err(e) = self.broadcast(&order).await {
                warn!(order_id = order_id, error = %e, "Failed to re-broadcast order");
            }
            self.gateway
                .send_message(
                    client_vk_id,
                    &format!("🔁 Заказ #{} снова отправлен курьерам. Ожидайте...", order_id),
                    Some(&keyboards::main_menu()),
                )
                .await?;
            RelevanceOutcome::Rebroadcast
        } else if self.config.cancel_on_declined_relevance {
            if self.update_status(order_id, OrderStatus::Pending, OrderStatus::Cancelled, now).await? {
                self.gateway
                    .send_message(client_vk_id, "❌ Заказ отменен", Some(&keyboards::main_menu()))
                    .await?;
                RelevanceOutcome::Cancelled
            } else {
                RelevanceOutcome::Settled(self.current_status(order_id).await?)
            }
        } else {
            self.gateway
                .send_message(
                    client_vk_id,
                    &format!("📦 Заказ #{} остается в ожидании курьера", order_id),
                    Some(&keyboards::main_menu()),
                )
                .await?;
            RelevanceOutcome::Kept
        };

        info!(order_id = order_id, user_id = client_vk_id, ?outcome, "Relevance answered");
        Ok(outcome)
    }

    /// Progress signal pressed by the courier in private
    pub async fn signal(&self, courier_vk_id: i64, order_id: i64, signal: CourierSignal, now: DateTime<Utc>) -> Result<SignalOutcome> {
        let Some(order) = self.store.order(order_id).await? else {
            return Ok(SignalOutcome::NotFound);
        };
        if order.courier_vk_id != Some(courier_vk_id) {
            warn!(order_id = order_id, user_id = courier_vk_id, "Signal from a courier not assigned to the order");
            return Ok(SignalOutcome::NotAssigned);
        }

        let target = signal.target_status();
        if !order.status.can_transition_to(target) {
            return Ok(SignalOutcome::Rejected(order.status));
        }
        if !self.store.update_order_status(order_id, order.status, target, now).await? {
            return Ok(SignalOutcome::Rejected(self.current_status(order_id).await?));
        }
        log_order_transition(order_id, order.status.as_str(), target.as_str(), Some(courier_vk_id));

        self.gateway
            .send_message(order.client_vk_id, &signal.client_notice(order_id), None)
            .await?;

        Ok(SignalOutcome::Applied(target))
    }

    /// Compare-and-set a status change along a permitted edge
    pub async fn update_status(&self, order_id: i64, from: OrderStatus, to: OrderStatus, now: DateTime<Utc>) -> Result<bool> {
        if !from.can_transition_to(to) {
            return Err(CourierHubError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let changed = self.store.update_order_status(order_id, from, to, now).await?;
        if changed {
            log_order_transition(order_id, from.as_str(), to.as_str(), None);
        }
        Ok(changed)
    }

    async fn current_status(&self, order_id: i64) -> Result<OrderStatus> {
        self.store
            .order(order_id)
            .await?
            .map(|order| order.status)
            .ok_or(CourierHubError::OrderNotFound { order_id })
    }
}

fn item_line(item: &OrderItem) -> String {
    format!(
        "• {} | {}р. (х{}) = {}р.",
        item.label(),
        item.product_price,
        item.quantity,
        item.line_total()
    )
}

/// Broadcast text for the dispatch chat
pub fn format_dispatch(order: &Order, items: &[OrderItem]) -> String {
    let lines: Vec<String> = items.iter().map(item_line).collect();
    format!(
        "🔔 НОВЫЙ ЗАКАЗ!\n\n👤 Никнейм: {}\n📍 Место: {}\n\n📦 Заказ:\n{}\n\n💰 Итого: {}р.",
        order.client_username,
        order.delivery_location,
        lines.join("\n"),
        order.total_price
    )
}

/// Status card shown to the client
pub fn format_order_status(order: &Order) -> String {
    let (emoji, text) = order.status.describe();
    let mut message = format!("📦 Статус заказа #{}\n\n{} {}\n\n", order.id, emoji, text);

    if let Some(courier) = &order.courier_username {
        message.push_str(&format!("🚴 Курьер: {}\n", courier));
        if let Some(estimate) = &order.estimated_time {
            message.push_str(&format!("⏰ Примерное время: {}", estimate));
        }
    }

    message.trim_end().to_string()
}

fn shopping_list(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|item| format!("⬜ {} х{}", item.product_name, item.quantity))
        .collect::<Vec<_>>()
        .join("\n")
}
