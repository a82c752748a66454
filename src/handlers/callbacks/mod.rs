//! Button payload handlers for private conversations
//!
//! A decoded payload always wins over the message text of the same turn.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::handlers::payload::Intent;
use crate::handlers::shop;
use crate::services::orders::ORDER_ID_KEY;
use crate::services::{CourierSignal, SignalOutcome};
use crate::state::{AppContext, ConversationState, DialogueStep};
use crate::utils::errors::Result;

/// Handle a structured intent in private; `state` is the user's current private state
pub async fn handle_intent(
    ctx: &AppContext,
    user_id: i64,
    intent: Intent,
    state: Option<ConversationState>,
    now: DateTime<Utc>,
) -> Result<()> {
    debug!(user_id = user_id, ?intent, "Handling payload");

    match intent {
        Intent::None => shop::send_menu(ctx, user_id, shop::UNKNOWN_COMMAND_TEXT).await,
        Intent::Start | Intent::Back => {
            if state.is_some() {
                ctx.store.clear_state(user_id).await?;
            }
            shop::send_menu(ctx, user_id, shop::MAIN_MENU_TEXT).await
        }
        Intent::Catalog => shop::show_catalog(ctx, user_id).await,
        Intent::Order => shop::start_order(ctx, user_id).await,
        Intent::Cart => shop::show_cart(ctx, user_id).await,
        Intent::MyOrders => shop::show_my_orders(ctx, user_id).await,
        Intent::Employment => shop::show_employment(ctx, user_id).await,
        Intent::Faq => shop::show_faq(ctx, user_id).await,
        Intent::Category { category_id, page } | Intent::Page { category_id, page } => {
            shop::show_category_products(ctx, user_id, category_id, page).await
        }
        Intent::AddToCart { product_id } => shop::add_to_cart(ctx, user_id, product_id).await,
        Intent::RemoveItem => shop::show_remove_list(ctx, user_id).await,
        Intent::RemoveFromCart { product_id } => shop::remove_from_cart(ctx, user_id, product_id).await,
        Intent::ClearCart => shop::clear_cart(ctx, user_id).await,
        Intent::Checkout => shop::start_checkout(ctx, user_id).await,
        Intent::ConfirmOrder => match state {
            Some(state) if state.step() == Some(DialogueStep::ConfirmingOrder) => {
                shop::place_order(ctx, user_id, &state, now).await
            }
            _ => shop::send_menu(ctx, user_id, shop::UNKNOWN_COMMAND_TEXT).await,
        },
        Intent::CancelOrder => shop::cancel_checkout(ctx, user_id).await,
        Intent::Answer(yes) => handle_answer(ctx, user_id, yes, state, now).await,
        Intent::Courier { order_id, signal } => handle_signal(ctx, user_id, order_id, signal, now).await,
        Intent::OrderStatus { order_id } => shop::show_order_status(ctx, user_id, order_id).await,
        // Acceptance only counts under the dispatch broadcast
        Intent::AcceptOrder { .. } | Intent::Unknown(_) => {
            shop::send_menu(ctx, user_id, shop::UNKNOWN_COMMAND_TEXT).await
        }
    }
}

/// Yes/no buttons answer whichever question the state is waiting on
pub async fn handle_answer(
    ctx: &AppContext,
    user_id: i64,
    yes: bool,
    state: Option<ConversationState>,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(state) = state else {
        return shop::send_menu(ctx, user_id, shop::MAIN_MENU_TEXT).await;
    };

    match state.step() {
        Some(DialogueStep::ConfirmingOrderRelevance) => match state.get_i64(ORDER_ID_KEY) {
            Some(order_id) => {
                ctx.orders.answer_relevance(user_id, order_id, yes, now).await?;
                Ok(())
            }
            None => {
                ctx.store.clear_state(user_id).await?;
                shop::send_menu(ctx, user_id, shop::UNKNOWN_STATE_TEXT).await
            }
        },
        Some(DialogueStep::ConfirmingOrder) if yes => shop::place_order(ctx, user_id, &state, now).await,
        Some(DialogueStep::ConfirmingOrder) => shop::cancel_checkout(ctx, user_id).await,
        _ => shop::send_menu(ctx, user_id, shop::UNKNOWN_COMMAND_TEXT).await,
    }
}

async fn handle_signal(ctx: &AppContext, courier_id: i64, order_id: i64, signal: CourierSignal, now: DateTime<Utc>) -> Result<()> {
    let reply = match ctx.orders.signal(courier_id, order_id, signal, now).await? {
        SignalOutcome::Applied(status) if status.is_terminal() => format!("✔️ Заказ #{} завершён!", order_id),
        SignalOutcome::Applied(status) => {
            let (emoji, text) = status.describe();
            format!("{} Заказ #{}: {}", emoji, order_id, text)
        }
        SignalOutcome::NotFound => "❌ Заказ не найден".to_string(),
        SignalOutcome::NotAssigned => "❌ Этот заказ назначен другому курьеру".to_string(),
        SignalOutcome::Rejected(status) => {
            let (emoji, text) = status.describe();
            format!("❌ Нельзя изменить заказ #{}. Текущий статус: {} {}", order_id, emoji, text)
        }
    };

    ctx.gateway.send_message(courier_id, &reply, None).await?;
    Ok(())
}
