//! Acceptance deadline: escalation to the client and the reconfirmation answer

use std::sync::Arc;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::helpers::*;
use CourierHub::database::Store;
use CourierHub::models::{ChatRole, OrderStatus};
use CourierHub::services::AcceptanceMonitor;
use CourierHub::state::DialogueStep;

fn monitor(ctx: &TestContext) -> AcceptanceMonitor {
    AcceptanceMonitor::new(ctx.store.clone() as Arc<dyn Store>, ctx.app.orders.clone())
}

fn past_deadline() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::minutes(16)
}

#[tokio::test]
async fn test_deadline_fires_exactly_once() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    let monitor = monitor(&ctx);

    assert_eq!(monitor.sweep_once(Utc::now()).await.unwrap(), 0);

    assert_eq!(monitor.sweep_once(past_deadline()).await.unwrap(), 1);
    assert_eq!(monitor.sweep_once(past_deadline()).await.unwrap(), 0);

    let prompts: Vec<_> = ctx
        .gateway
        .sent_to(CLIENT_ID)
        .into_iter()
        .filter(|m| m.text.starts_with("⏰"))
        .collect();
    assert_eq!(prompts.len(), 1);
    assert_eq!(
        prompts[0].text,
        format!("⏰ Прошло 15 минут. Заказ #{} все еще актуален?", order_id)
    );

    let state = ctx.store.get_state(CLIENT_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::ConfirmingOrderRelevance));
    assert_eq!(state.get_i64("orderId"), Some(order_id));

    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.acceptance_deadline, None);
}

#[tokio::test]
async fn test_accepted_order_never_escalates() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    ctx.group_payload(
        chat_peer(ChatRole::Dispatch),
        COURIER_ID,
        json!({ "command": "accept_order", "orderId": order_id }),
    )
    .await;

    assert_eq!(monitor(&ctx).sweep_once(past_deadline()).await.unwrap(), 0);
    assert!(ctx.gateway.sent_to(CLIENT_ID).iter().all(|m| !m.text.starts_with("⏰")));
}

#[tokio::test]
async fn test_declined_relevance_keeps_order_pending() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    monitor(&ctx).sweep_once(past_deadline()).await.unwrap();

    ctx.private_payload(CLIENT_ID, json!({ "answer": "no" })).await;

    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.acceptance_deadline, None);
    assert!(ctx.store.get_state(CLIENT_ID).await.unwrap().is_none());
    assert_eq!(
        ctx.gateway.last_text(CLIENT_ID),
        format!("📦 Заказ #{} остается в ожидании курьера", order_id)
    );

    // Not armed again, so no second prompt
    assert_eq!(monitor(&ctx).sweep_once(past_deadline() + Duration::hours(1)).await.unwrap(), 0);

    // Still open for a courier
    ctx.group_payload(
        chat_peer(ChatRole::Dispatch),
        COURIER_ID,
        json!({ "command": "accept_order", "orderId": order_id }),
    )
    .await;
    assert_eq!(ctx.store.order(order_id).await.unwrap().unwrap().status, OrderStatus::Accepted);
}

#[tokio::test]
async fn test_confirmed_relevance_rebroadcasts_and_rearms() {
    let (ctx, catalog) = TestContext::ready().await;
    let dispatch = chat_peer(ChatRole::Dispatch);
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    monitor(&ctx).sweep_once(past_deadline()).await.unwrap();
    let broadcasts_before = ctx.gateway.sent_to(dispatch).len();

    ctx.private_text(CLIENT_ID, "Да").await;

    let order = ctx.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.acceptance_deadline.is_some());
    assert_eq!(ctx.gateway.sent_to(dispatch).len(), broadcasts_before + 1);
    assert_eq!(order.dispatch_message_id, ctx.gateway.last_to(dispatch).map(|m| m.message_id));
    assert_eq!(
        ctx.gateway.last_text(CLIENT_ID),
        format!("🔁 Заказ #{} снова отправлен курьерам. Ожидайте...", order_id)
    );

    // The fresh deadline escalates once more
    let later = Utc::now() + Duration::minutes(16);
    assert_eq!(monitor(&ctx).sweep_once(later).await.unwrap(), 1);
}

#[tokio::test]
async fn test_declined_relevance_cancels_when_configured() {
    let mut settings = test_settings();
    settings.orders.cancel_on_declined_relevance = true;
    let ctx = TestContext::with_settings(settings);
    ctx.register_all_chats().await;
    let catalog = ctx.seed_catalog().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    monitor(&ctx).sweep_once(past_deadline()).await.unwrap();

    ctx.private_payload(CLIENT_ID, json!({ "answer": "no" })).await;

    assert_eq!(ctx.store.order(order_id).await.unwrap().unwrap().status, OrderStatus::Cancelled);
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), "❌ Заказ отменен");
}

#[tokio::test]
async fn test_late_answer_after_acceptance_shows_status() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id]).await;
    monitor(&ctx).sweep_once(past_deadline()).await.unwrap();
    ctx.group_payload(
        chat_peer(ChatRole::Dispatch),
        COURIER_ID,
        json!({ "command": "accept_order", "orderId": order_id }),
    )
    .await;

    ctx.private_payload(CLIENT_ID, json!({ "answer": "yes" })).await;

    assert_eq!(ctx.store.order(order_id).await.unwrap().unwrap().status, OrderStatus::Accepted);
    assert!(ctx
        .gateway
        .last_text(CLIENT_ID)
        .starts_with(&format!("📦 Статус заказа #{}", order_id)));
}
