//! Private dialogue tests: menu vocabulary, checkout steps and blacklist

use chrono::{Duration, Utc};
use serde_json::json;

use crate::helpers::*;
use CourierHub::database::Store;
use CourierHub::handlers::shop::{MAIN_MENU_TEXT, UNKNOWN_COMMAND_TEXT, UNKNOWN_STATE_TEXT, WELCOME_TEXT};
use CourierHub::state::{ConversationState, DialogueStep};

#[tokio::test]
async fn test_idle_vocabulary() {
    let (ctx, _) = TestContext::ready().await;

    ctx.private_text(CLIENT_ID, "Начать").await;
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), WELCOME_TEXT);
    assert!(ctx.gateway.last_to(CLIENT_ID).unwrap().keyboard.is_some());

    ctx.private_text(CLIENT_ID, "меню").await;
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), MAIN_MENU_TEXT);

    ctx.private_text(CLIENT_ID, "абракадабра").await;
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), UNKNOWN_COMMAND_TEXT);

    ctx.private_text(CLIENT_ID, "каталог").await;
    let catalog = ctx.gateway.last_to(CLIENT_ID).unwrap();
    assert!(catalog.text.starts_with("📋 Каталог товаров"));
    assert!(catalog.keyboard.unwrap().contains("Бургеры"));

    // First contact creates the client record
    let user = ctx.store.get_user(CLIENT_ID).await.unwrap().unwrap();
    assert_eq!(user.username, format!("id{}", CLIENT_ID));
}

#[tokio::test]
async fn test_order_flow_selects_category_then_product() {
    let (ctx, catalog) = TestContext::ready().await;

    ctx.private_payload(CLIENT_ID, json!({ "command": "order" })).await;
    let state = ctx.store.get_state(CLIENT_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::SelectingCategory));

    ctx.private_payload(CLIENT_ID, json!({ "command": "category", "categoryId": catalog.category_id }))
        .await;
    let state = ctx.store.get_state(CLIENT_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::SelectingProduct));
    assert_eq!(state.get_i64("categoryId"), Some(catalog.category_id));
    assert!(ctx.gateway.last_text(CLIENT_ID).contains("Бургеры"));

    ctx.private_payload(CLIENT_ID, json!({ "command": "add_to_cart", "productId": catalog.pricey_id }))
        .await;
    assert!(ctx.gateway.last_text(CLIENT_ID).starts_with("✅ Добавлено в корзину"));

    let lines = ctx.store.cart_lines(CLIENT_ID).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product.id, catalog.pricey_id);
}

#[tokio::test]
async fn test_missing_product_restarts_selection() {
    let (ctx, _) = TestContext::ready().await;

    ctx.private_payload(CLIENT_ID, json!({ "command": "add_to_cart", "productId": 9999 })).await;

    let texts: Vec<String> = ctx.gateway.sent_to(CLIENT_ID).into_iter().map(|m| m.text).collect();
    assert!(texts.iter().any(|t| t == "❌ Товар не найден"));
    let state = ctx.store.get_state(CLIENT_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::SelectingCategory));
    assert!(ctx.store.cart_lines(CLIENT_ID).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_username_is_reprompted() {
    let (ctx, catalog) = TestContext::ready().await;

    ctx.private_payload(CLIENT_ID, json!({ "command": "add_to_cart", "productId": catalog.cheap_id }))
        .await;
    ctx.private_payload(CLIENT_ID, json!({ "action": "checkout" })).await;
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), "📝 Введите ваш никнейм:");

    ctx.private_text(CLIENT_ID, "   ").await;
    assert_eq!(
        ctx.gateway.last_text(CLIENT_ID),
        "❌ Никнейм не может быть пустым. Попробуйте еще раз:"
    );
    let state = ctx.store.get_state(CLIENT_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::EnteringUsername));

    ctx.private_text(CLIENT_ID, "Клиент").await;
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), "📍 Введите адрес доставки:");
    let state = ctx.store.get_state(CLIENT_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::EnteringLocation));
    assert_eq!(state.get_string("username").as_deref(), Some("Клиент"));
}

#[tokio::test]
async fn test_back_clears_dialogue_state() {
    let (ctx, catalog) = TestContext::ready().await;

    ctx.private_payload(CLIENT_ID, json!({ "command": "add_to_cart", "productId": catalog.cheap_id }))
        .await;
    ctx.private_payload(CLIENT_ID, json!({ "action": "checkout" })).await;
    assert!(ctx.store.get_state(CLIENT_ID).await.unwrap().is_some());

    ctx.private_payload(CLIENT_ID, json!({ "command": "back" })).await;
    assert!(ctx.store.get_state(CLIENT_ID).await.unwrap().is_none());
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), MAIN_MENU_TEXT);

    // Free text is no longer taken as a nickname
    ctx.private_text(CLIENT_ID, "Клиент").await;
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), UNKNOWN_COMMAND_TEXT);
    assert!(ctx.store.get_state(CLIENT_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_stored_step_resets() {
    let (ctx, _) = TestContext::ready().await;
    ctx.store.create_user(CLIENT_ID, "Клиент").await.unwrap();

    let mut state = ConversationState::new(CLIENT_ID, DialogueStep::EnteringUsername);
    state.state = "waiting_for_something_old".to_string();
    ctx.store.set_state(&state).await.unwrap();

    ctx.private_text(CLIENT_ID, "привет").await;

    assert_eq!(ctx.gateway.last_text(CLIENT_ID), UNKNOWN_STATE_TEXT);
    assert!(ctx.store.get_state(CLIENT_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cart_edits() {
    let (ctx, catalog) = TestContext::ready().await;

    ctx.private_payload(CLIENT_ID, json!({ "command": "add_to_cart", "productId": catalog.cheap_id }))
        .await;
    ctx.private_payload(CLIENT_ID, json!({ "command": "add_to_cart", "productId": catalog.cheap_id }))
        .await;
    ctx.private_payload(CLIENT_ID, json!({ "command": "add_to_cart", "productId": catalog.pricey_id }))
        .await;

    ctx.private_payload(CLIENT_ID, json!({ "command": "cart" })).await;
    let cart = ctx.gateway.last_text(CLIENT_ID);
    assert!(cart.contains("Чизбургер | 100р. (х2) = 200р."));
    assert!(cart.contains("💰 Итого: 350р."));

    ctx.private_payload(CLIENT_ID, json!({ "command": "remove_from_cart", "productId": catalog.cheap_id }))
        .await;
    assert!(ctx.gateway.last_text(CLIENT_ID).contains("💰 Итого: 150р."));

    ctx.private_payload(CLIENT_ID, json!({ "action": "clear_cart" })).await;
    assert!(ctx.store.cart_lines(CLIENT_ID).await.unwrap().is_empty());

    ctx.private_payload(CLIENT_ID, json!({ "action": "checkout" })).await;
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), "❌ Корзина пуста");
    assert!(ctx.store.get_state(CLIENT_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_blacklisted_user_has_no_side_effects() {
    let (ctx, catalog) = TestContext::ready().await;
    let until = Utc::now() + Duration::days(3);
    ctx.store.set_blacklist(CLIENT_ID, Some(until)).await.unwrap();

    ctx.private_payload(CLIENT_ID, json!({ "command": "add_to_cart", "productId": catalog.cheap_id }))
        .await;
    ctx.private_payload(CLIENT_ID, json!({ "command": "order" })).await;

    let sent = ctx.gateway.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.peer_id == CLIENT_ID && m.text.starts_with("⛔ Вы в черном списке до")));
    assert!(ctx.store.cart_lines(CLIENT_ID).await.unwrap().is_empty());
    assert!(ctx.store.get_state(CLIENT_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_blacklist_lets_user_back() {
    let (ctx, _) = TestContext::ready().await;
    ctx.store
        .set_blacklist(CLIENT_ID, Some(Utc::now() - Duration::minutes(1)))
        .await
        .unwrap();

    ctx.private_text(CLIENT_ID, "начать").await;

    assert_eq!(ctx.gateway.last_text(CLIENT_ID), WELCOME_TEXT);
}
