//! Private conversation handling
//!
//! Idle users are served from a fixed command vocabulary; users inside a
//! dialogue get the handler of their current step.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::handlers::callbacks::{handle_answer, handle_intent};
use crate::handlers::router::IncomingMessage;
use crate::handlers::shop;
use crate::services::orders::ORDER_ID_KEY;
use crate::state::{AppContext, ConversationState, DialogueStep};
use crate::utils::errors::{CourierHubError, Result};
use crate::utils::helpers::{is_affirmative, validate_location, validate_username};

pub async fn handle_private(ctx: &AppContext, message: &IncomingMessage, now: DateTime<Utc>) -> Result<()> {
    let user_id = message.from_id;
    ctx.store.create_user(user_id, &format!("id{}", user_id)).await?;

    // Staff dialogues that belong to a group chat are not visible here
    let state = ctx
        .store
        .get_state(user_id)
        .await?
        .filter(|state| !state.step().is_some_and(|step| step.is_group_flow()));

    let intent = message.intent();
    if !intent.is_none() {
        return handle_intent(ctx, user_id, intent, state, now).await;
    }

    match state {
        Some(state) => handle_step(ctx, user_id, message.text(), state, now).await,
        None => handle_idle_text(ctx, user_id, message.text()).await,
    }
}

async fn handle_idle_text(ctx: &AppContext, user_id: i64, text: &str) -> Result<()> {
    match text.to_lowercase().as_str() {
        "начать" | "start" | "/start" | "привет" => shop::send_menu(ctx, user_id, shop::WELCOME_TEXT).await,
        "меню" | "назад" => shop::send_menu(ctx, user_id, shop::MAIN_MENU_TEXT).await,
        "каталог" => shop::show_catalog(ctx, user_id).await,
        "заказать" => shop::start_order(ctx, user_id).await,
        "корзина" => shop::show_cart(ctx, user_id).await,
        "мои заказы" => shop::show_my_orders(ctx, user_id).await,
        "трудоустройство" => shop::show_employment(ctx, user_id).await,
        "частые вопросы" | "faq" => shop::show_faq(ctx, user_id).await,
        _ => shop::send_menu(ctx, user_id, shop::UNKNOWN_COMMAND_TEXT).await,
    }
}

async fn handle_step(ctx: &AppContext, user_id: i64, text: &str, state: ConversationState, now: DateTime<Utc>) -> Result<()> {
    let Some(step) = state.step() else {
        warn!(user_id = user_id, state = %state.state, "Unknown conversation state, resetting");
        ctx.store.clear_state(user_id).await?;
        return shop::send_menu(ctx, user_id, shop::UNKNOWN_STATE_TEXT).await;
    };
    debug!(user_id = user_id, step = %step, "Continuing dialogue");

    match step {
        DialogueStep::SelectingCategory => match text.parse::<i64>() {
            Ok(category_id) => shop::show_category_products(ctx, user_id, category_id, 0).await,
            Err(_) => shop::start_order(ctx, user_id).await,
        },
        DialogueStep::SelectingProduct => {
            let category_id = state.get_i64(shop::CATEGORY_ID_KEY);
            ctx.gateway
                .send_message(user_id, "👆 Выберите товар с помощью кнопок", None)
                .await?;
            match category_id {
                Some(category_id) => shop::show_category_products(ctx, user_id, category_id, 0).await,
                None => shop::start_order(ctx, user_id).await,
            }
        }
        DialogueStep::EnteringUsername => match validate_username(text) {
            Ok(username) => {
                let next = state
                    .advance(DialogueStep::EnteringLocation)
                    .with_data(shop::USERNAME_KEY, username)?;
                ctx.store.set_state(&next).await?;
                ctx.gateway
                    .send_message(user_id, "📍 Введите адрес доставки:", None)
                    .await?;
                Ok(())
            }
            Err(e) => reprompt(ctx, user_id, &e).await,
        },
        DialogueStep::EnteringLocation => match validate_location(text) {
            Ok(location) => {
                let username = state.get_string(shop::USERNAME_KEY).unwrap_or_default();
                shop::show_confirmation(ctx, user_id, &username, &location).await
            }
            Err(e) => reprompt(ctx, user_id, &e).await,
        },
        DialogueStep::ConfirmingOrder | DialogueStep::ConfirmingOrderRelevance => {
            handle_answer(ctx, user_id, is_affirmative(text), Some(state), now).await
        }
        DialogueStep::EnteringDeliveryTime => {
            let Some(order_id) = state.get_i64(ORDER_ID_KEY) else {
                ctx.store.clear_state(user_id).await?;
                return shop::send_menu(ctx, user_id, shop::UNKNOWN_STATE_TEXT).await;
            };
            if text.is_empty() {
                ctx.gateway
                    .send_message(user_id, "⏱ Введите примерное время доставки:", None)
                    .await?;
                return Ok(());
            }
            ctx.orders.record_estimate(user_id, order_id, text).await?;
            Ok(())
        }
        // Filtered out before reaching here
        _ => shop::send_menu(ctx, user_id, shop::MAIN_MENU_TEXT).await,
    }
}

async fn reprompt(ctx: &AppContext, user_id: i64, error: &CourierHubError) -> Result<()> {
    let reason = match error {
        CourierHubError::InvalidInput(reason) => reason.as_str(),
        _ => "Некорректный ввод",
    };
    ctx.gateway
        .send_message(user_id, &format!("❌ {}. Попробуйте еще раз:", reason), None)
        .await?;
    Ok(())
}
