//! Dispatch acceptance and the courier's delivery signals

use serde_json::json;

use crate::helpers::*;
use CourierHub::database::Store;
use CourierHub::models::{ChatRole, OrderStatus};
use CourierHub::state::DialogueStep;

fn accept(order_id: i64) -> serde_json::Value {
    json!({ "command": "accept_order", "orderId": order_id })
}

#[tokio::test]
async fn test_courier_accepts_and_sends_estimate() {
    let (ctx, catalog) = TestContext::ready().await;
    let dispatch = chat_peer(ChatRole::Dispatch);
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id, catalog.pricey_id]).await;
    let broadcast_id = ctx.gateway.last_to(dispatch).unwrap().message_id;

    ctx.group_payload(dispatch, COURIER_ID, accept(order_id)).await;

    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Accepted);
    assert_eq!(order.courier_vk_id, Some(COURIER_ID));
    assert_eq!(order.courier_username.as_deref(), Some("Курьер Петя"));
    assert_eq!(order.acceptance_deadline, None);

    let state = ctx.store.get_state(COURIER_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::EnteringDeliveryTime));
    assert!(ctx
        .gateway
        .last_text(COURIER_ID)
        .starts_with(&format!("📦 Заказ #{} принят!", order_id)));

    let edits = ctx.gateway.edits();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].peer_id, dispatch);
    assert_eq!(edits[0].message_id, broadcast_id);
    assert!(edits[0].text.ends_with("✅ Принял: Курьер Петя"));

    ctx.private_text(COURIER_ID, "минут 20").await;

    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.estimated_time.as_deref(), Some("20 минут"));
    assert!(ctx.store.get_state(COURIER_ID).await.unwrap().is_none());
    assert_eq!(
        ctx.gateway.last_text(CLIENT_ID),
        "✅ Ваш курьер: Курьер Петя\nПримерное время ожидания: 20 минут"
    );

    let list = ctx.gateway.last_to(COURIER_ID).unwrap();
    assert!(list.text.starts_with("📝 Список покупок:"));
    assert!(list.text.contains("⬜"));
    assert!(list.keyboard.unwrap().contains("complete_order"));
}

#[tokio::test]
async fn test_empty_estimate_is_reprompted() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    ctx.group_payload(chat_peer(ChatRole::Dispatch), COURIER_ID, accept(order_id)).await;

    ctx.private_text(COURIER_ID, "   ").await;

    assert_eq!(ctx.gateway.last_text(COURIER_ID), "⏱ Введите примерное время доставки:");
    let state = ctx.store.get_state(COURIER_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::EnteringDeliveryTime));
    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.estimated_time, None);

    ctx.private_text(COURIER_ID, "30").await;
    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.estimated_time.as_deref(), Some("30 минут"));
}

#[tokio::test]
async fn test_estimate_for_cancelled_order_is_rejected() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    ctx.group_payload(chat_peer(ChatRole::Dispatch), COURIER_ID, accept(order_id)).await;

    assert!(ctx
        .store
        .update_order_status(order_id, OrderStatus::Accepted, OrderStatus::Cancelled, ctx.now())
        .await
        .unwrap());
    let client_messages = ctx.gateway.sent_to(CLIENT_ID).len();

    ctx.private_text(COURIER_ID, "15").await;

    assert_eq!(ctx.gateway.last_text(COURIER_ID), "❌ Заказ не найден");
    assert!(ctx.store.get_state(COURIER_ID).await.unwrap().is_none());
    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.estimated_time, None);
    assert_eq!(ctx.gateway.sent_to(CLIENT_ID).len(), client_messages);
}

#[tokio::test]
async fn test_concurrent_accepts_have_one_winner() {
    let (ctx, catalog) = TestContext::ready().await;
    let dispatch = chat_peer(ChatRole::Dispatch);
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;

    tokio::join!(
        ctx.group_payload(dispatch, COURIER_ID, accept(order_id)),
        ctx.group_payload(dispatch, SECOND_COURIER_ID, accept(order_id)),
    );

    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Accepted);
    let winner = order.courier_vk_id.unwrap();
    let loser = if winner == COURIER_ID { SECOND_COURIER_ID } else { COURIER_ID };

    assert!(ctx.gateway.last_text(winner).contains("принят!"));
    assert_eq!(ctx.gateway.last_text(loser), "❌ Заказ уже принят или отменен");
    assert!(ctx.store.get_state(loser).await.unwrap().is_none());
    assert_eq!(ctx.gateway.edits().len(), 1);
}

#[tokio::test]
async fn test_accept_requires_employee_and_dispatch_chat() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;

    ctx.group_payload(chat_peer(ChatRole::Dispatch), OTHER_CLIENT_ID, accept(order_id))
        .await;
    assert_eq!(ctx.gateway.last_text(OTHER_CLIENT_ID), "❌ Ошибка: курьер не найден");

    ctx.group_payload(chat_peer(ChatRole::Flood), COURIER_ID, accept(order_id)).await;

    // Pressing the button in private is not an acceptance either
    ctx.private_payload(COURIER_ID, accept(order_id)).await;

    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.courier_vk_id, None);
}

#[tokio::test]
async fn test_delivery_signals_walk_the_lifecycle() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    ctx.group_payload(chat_peer(ChatRole::Dispatch), COURIER_ID, accept(order_id)).await;
    ctx.private_text(COURIER_ID, "15").await;

    let signal = |command: &str| json!({ "command": command, "orderId": order_id });

    ctx.private_payload(COURIER_ID, signal("preparing")).await;
    assert_eq!(ctx.store.order(order_id).await.unwrap().unwrap().status, OrderStatus::Preparing);
    assert_eq!(
        ctx.gateway.last_text(CLIENT_ID),
        format!("👨‍🍳 Курьер собирает ваш заказ #{}", order_id)
    );

    ctx.private_payload(COURIER_ID, signal("order_ready")).await;
    assert_eq!(ctx.store.order(order_id).await.unwrap().unwrap().status, OrderStatus::Delivering);

    ctx.private_payload(COURIER_ID, signal("arrived")).await;
    assert_eq!(ctx.store.order(order_id).await.unwrap().unwrap().status, OrderStatus::Delivering);
    assert_eq!(
        ctx.gateway.last_text(CLIENT_ID),
        format!("📍 Курьер на месте! Заказ #{}", order_id)
    );

    ctx.private_payload(COURIER_ID, signal("complete_order")).await;
    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.completed_at.is_some());
    assert_eq!(ctx.gateway.last_text(COURIER_ID), format!("✔️ Заказ #{} завершён!", order_id));

    // Nothing moves a completed order
    ctx.private_payload(COURIER_ID, signal("preparing")).await;
    assert_eq!(ctx.store.order(order_id).await.unwrap().unwrap().status, OrderStatus::Completed);
    assert!(ctx.gateway.last_text(COURIER_ID).starts_with("❌ Нельзя изменить заказ"));
}

#[tokio::test]
async fn test_only_assigned_courier_can_signal() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    ctx.group_payload(chat_peer(ChatRole::Dispatch), COURIER_ID, accept(order_id)).await;

    ctx.private_payload(SECOND_COURIER_ID, json!({ "command": "complete_order", "orderId": order_id }))
        .await;

    assert_eq!(
        ctx.gateway.last_text(SECOND_COURIER_ID),
        "❌ Этот заказ назначен другому курьеру"
    );
    assert_eq!(ctx.store.order(order_id).await.unwrap().unwrap().status, OrderStatus::Accepted);
}
