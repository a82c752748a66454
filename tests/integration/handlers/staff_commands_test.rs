//! Senior staff and management chat commands

use chrono::Utc;
use serde_json::json;

use crate::helpers::*;
use CourierHub::database::Store;
use CourierHub::models::{ChatRole, Role};
use CourierHub::state::DialogueStep;

fn senior_chat() -> i64 {
    chat_peer(ChatRole::SeniorStaff)
}

fn management_chat() -> i64 {
    chat_peer(ChatRole::Management)
}

#[tokio::test]
async fn test_senior_commands_are_gated_by_role() {
    let (ctx, _) = TestContext::ready().await;

    ctx.group_text(senior_chat(), COURIER_ID, &format!("/чс {}", CLIENT_ID)).await;

    assert!(ctx.gateway.sent_to(senior_chat()).is_empty());
    let user = ctx.store.get_user(CLIENT_ID).await.unwrap();
    assert!(user.map_or(true, |u| u.blacklisted_until.is_none()));

    // Management commands are not available in the senior chat
    ctx.group_text(senior_chat(), MANAGER_ID, "/добавить_категорию").await;
    assert!(ctx.store.get_state(MANAGER_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_blacklist_and_unban() {
    let (ctx, _) = TestContext::ready().await;

    ctx.group_text(senior_chat(), SENIOR_ID, &format!("/чс {} 7", CLIENT_ID)).await;

    let user = ctx.store.get_user(CLIENT_ID).await.unwrap().unwrap();
    let until = user.blocked_until(Utc::now()).unwrap();
    assert!((until - Utc::now()).num_days() >= 6);
    assert_eq!(ctx.gateway.bans(), vec![(CLIENT_ID, Some(until))]);
    assert!(ctx
        .gateway
        .last_text(senior_chat())
        .starts_with(&format!("⛔ Пользователь {} в черном списке до", CLIENT_ID)));

    ctx.private_text(CLIENT_ID, "начать").await;
    assert!(ctx.gateway.last_text(CLIENT_ID).starts_with("⛔ Вы в черном списке до"));

    ctx.group_text(senior_chat(), SENIOR_ID, &format!("/разбан [id{}|Клиент]", CLIENT_ID)).await;
    assert_eq!(ctx.gateway.unbans(), vec![CLIENT_ID]);
    let user = ctx.store.get_user(CLIENT_ID).await.unwrap().unwrap();
    assert!(user.blocked_until(Utc::now()).is_none());

    ctx.group_text(senior_chat(), SENIOR_ID, "/чс").await;
    assert_eq!(ctx.gateway.last_text(senior_chat()), "❌ Использование: /чс <id> [дней]");
}

#[tokio::test]
async fn test_blacklist_rejects_out_of_range_days() {
    let (ctx, _) = TestContext::ready().await;

    let reply = ctx
        .group_text(senior_chat(), SENIOR_ID, &format!("/чс {} 100000000", CLIENT_ID))
        .await;

    assert_eq!(reply, "ok");
    assert_eq!(ctx.gateway.last_text(senior_chat()), "❌ Использование: /чс <id> [дней]");
    assert!(ctx.gateway.bans().is_empty());
    let user = ctx.store.get_user(CLIENT_ID).await.unwrap();
    assert!(user.map_or(true, |u| u.blacklisted_until.is_none()));

    ctx.group_text(senior_chat(), SENIOR_ID, &format!("/чс {} 36500", CLIENT_ID)).await;
    assert_eq!(ctx.gateway.bans().len(), 1);
}

#[tokio::test]
async fn test_kick_removes_from_every_chat() {
    let (ctx, _) = TestContext::ready().await;

    ctx.group_text(senior_chat(), SENIOR_ID, &format!("/кик {}", COURIER_ID)).await;

    let removed = ctx.gateway.removed();
    assert_eq!(removed.len(), ChatRole::ALL.len());
    assert!(removed.iter().all(|(_, member)| *member == COURIER_ID));
    assert_eq!(
        ctx.gateway.last_text(senior_chat()),
        format!("✅ Пользователь {} исключен из бесед: 7", COURIER_ID)
    );
}

#[tokio::test]
async fn test_add_staff_flow() {
    let (ctx, _) = TestContext::ready().await;

    ctx.group_text(senior_chat(), SENIOR_ID, "/добавить").await;
    let state = ctx.store.get_state(SENIOR_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::SeniorAddingStaff));

    // A senior cannot hire above their own role
    ctx.group_text(senior_chat(), SENIOR_ID, "5005 руководство Новый Босс").await;
    assert_eq!(ctx.gateway.last_text(senior_chat()), "❌ Нельзя назначить роль выше своей");
    assert!(ctx.store.get_employee(5005).await.unwrap().is_none());

    ctx.group_text(senior_chat(), SENIOR_ID, "5005 курьер Новый Курьер").await;
    let employee = ctx.store.get_employee(5005).await.unwrap().unwrap();
    assert_eq!(employee.role, Role::Courier);
    assert_eq!(employee.username, "Новый Курьер");
    assert!(ctx.store.get_state(SENIOR_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_staff_flow_is_bound_to_its_chat() {
    let (ctx, _) = TestContext::ready().await;
    let flood = chat_peer(ChatRole::Flood);

    ctx.group_text(senior_chat(), SENIOR_ID, "/объявление").await;
    ctx.group_text(flood, SENIOR_ID, "это просто болтовня").await;

    let board = chat_peer(ChatRole::Announcements);
    assert!(ctx.gateway.sent_to(board).is_empty());
    assert!(ctx.store.get_state(SENIOR_ID).await.unwrap().is_some());

    // The flow does not leak into the private dialogue either
    ctx.private_text(SENIOR_ID, "начать").await;
    assert!(ctx.gateway.sent_to(board).is_empty());

    ctx.group_text(senior_chat(), SENIOR_ID, "/отмена").await;
    assert_eq!(ctx.gateway.last_text(senior_chat()), "❌ Действие отменено");
    assert!(ctx.store.get_state(SENIOR_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_announcement_is_posted_and_pinned() {
    let (ctx, _) = TestContext::ready().await;
    let board = chat_peer(ChatRole::Announcements);

    ctx.group_text(senior_chat(), SENIOR_ID, "/объявление").await;
    ctx.group_text(senior_chat(), SENIOR_ID, "Завтра собрание в 18:00").await;

    let announcement = ctx.gateway.last_to(board).unwrap();
    assert_eq!(announcement.text, "📢 ОБЪЯВЛЕНИЕ\n\nЗавтра собрание в 18:00");
    assert_eq!(ctx.gateway.pins(), vec![(board, announcement.message_id)]);
    assert_eq!(ctx.gateway.last_text(senior_chat()), "✅ Объявление опубликовано и закреплено");

    ctx.group_text(senior_chat(), SENIOR_ID, "/открепить").await;
    assert_eq!(ctx.gateway.unpins(), vec![board]);
}

#[tokio::test]
async fn test_weekly_staff_stats() {
    let (ctx, _) = TestContext::ready().await;
    ctx.group_text(chat_peer(ChatRole::Flood), COURIER_ID, "привет").await;

    ctx.group_text(senior_chat(), SENIOR_ID, "/статистика").await;

    let stats = ctx.gateway.last_text(senior_chat());
    assert!(stats.starts_with("📊 Статистика сотрудников за неделю:"));
    assert!(stats.contains("👤 Курьер Петя"));
    assert!(stats.contains("👤 Руководитель Анна"));
}

#[tokio::test]
async fn test_category_and_product_management() {
    let (ctx, catalog) = TestContext::ready().await;

    ctx.group_text(management_chat(), MANAGER_ID, "/добавить_категорию").await;
    ctx.group_text(management_chat(), MANAGER_ID, "Напитки | Холодные").await;
    assert_eq!(ctx.gateway.last_text(management_chat()), "✅ Категория \"Напитки\" создана");

    let categories = ctx.store.categories().await.unwrap();
    let drinks = categories.iter().find(|c| c.name == "Напитки").unwrap().clone();
    assert_eq!(drinks.description.as_deref(), Some("Холодные"));
    let position = categories.iter().position(|c| c.id == drinks.id).unwrap() + 1;

    ctx.group_text(management_chat(), MANAGER_ID, "/добавить_товар").await;
    ctx.group_text(management_chat(), MANAGER_ID, &position.to_string()).await;
    let state = ctx.store.get_state(MANAGER_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::ManagementAddingProductDetails));

    ctx.group_text(management_chat(), MANAGER_ID, "Кола | дорого | 30").await;
    assert!(ctx.gateway.last_text(management_chat()).starts_with("❌ Цена должна быть"));

    ctx.group_text(management_chat(), MANAGER_ID, "Кола | 90 | 30 | 0.5 л").await;
    let products = ctx.store.products_by_category(drinks.id).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Кола");
    assert_eq!(products[0].price, 90);
    assert_eq!(products[0].cost_price, 30);
    assert_eq!(products[0].nutrition.as_deref(), Some("0.5 л"));
    assert!(ctx.store.get_state(MANAGER_ID).await.unwrap().is_none());

    // Deleting a category takes its products along
    let burgers = ctx
        .store
        .categories()
        .await
        .unwrap()
        .iter()
        .position(|c| c.id == catalog.category_id)
        .unwrap()
        + 1;
    ctx.group_text(management_chat(), MANAGER_ID, "/удалить_категорию").await;
    ctx.group_text(management_chat(), MANAGER_ID, &burgers.to_string()).await;
    assert!(ctx.store.category(catalog.category_id).await.unwrap().is_none());
    assert!(ctx.store.product(catalog.cheap_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_latin_command_aliases() {
    let (ctx, _) = TestContext::ready().await;

    ctx.group_text(senior_chat(), SENIOR_ID, "/stats").await;
    assert!(ctx
        .gateway
        .last_text(senior_chat())
        .starts_with("📊 Статистика сотрудников за неделю:"));

    ctx.group_text(senior_chat(), SENIOR_ID, "/announce").await;
    let state = ctx.store.get_state(SENIOR_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::SeniorCreatingAnnouncement));
    ctx.group_text(senior_chat(), SENIOR_ID, "/отмена").await;

    ctx.group_text(senior_chat(), SENIOR_ID, "/add").await;
    let state = ctx.store.get_state(SENIOR_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::SeniorAddingStaff));

    ctx.group_text(management_chat(), MANAGER_ID, "/add_cat").await;
    let state = ctx.store.get_state(MANAGER_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::ManagementAddingCategory));
    ctx.group_text(management_chat(), MANAGER_ID, "/отмена").await;

    ctx.group_text(management_chat(), MANAGER_ID, "/del_prod").await;
    assert!(ctx.gateway.last_text(management_chat()).contains("1. Чизбургер (100р.)"));
    ctx.group_text(management_chat(), MANAGER_ID, "/отмена").await;

    ctx.group_text(management_chat(), MANAGER_ID, "/post").await;
    let state = ctx.store.get_state(MANAGER_ID).await.unwrap().unwrap();
    assert_eq!(state.step(), Some(DialogueStep::ManagementCreatingPost));
}

#[tokio::test]
async fn test_delete_product_by_number() {
    let (ctx, catalog) = TestContext::ready().await;

    ctx.group_text(management_chat(), MANAGER_ID, "/удалить_товар").await;
    assert!(ctx.gateway.last_text(management_chat()).contains("1. Чизбургер (100р.)"));

    ctx.group_text(management_chat(), MANAGER_ID, "9").await;
    assert_eq!(ctx.gateway.last_text(management_chat()), "❌ Введите номер из списка:");

    ctx.group_text(management_chat(), MANAGER_ID, "1").await;
    assert_eq!(ctx.gateway.last_text(management_chat()), "✅ Товар \"Чизбургер\" удален");
    assert!(ctx.store.product(catalog.cheap_id).await.unwrap().is_none());
    assert!(ctx.store.product(catalog.pricey_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_feed_post_flow() {
    let (ctx, _) = TestContext::ready().await;

    ctx.group_text(management_chat(), MANAGER_ID, "/пост").await;
    ctx.group_text(management_chat(), MANAGER_ID, "Скидка 10% на все бургеры").await;

    assert_eq!(ctx.gateway.posts(), vec!["Скидка 10% на все бургеры".to_string()]);
    assert_eq!(ctx.gateway.last_text(management_chat()), "✅ Пост опубликован в сообществе");
}

#[tokio::test]
async fn test_financial_reports() {
    let (ctx, catalog) = TestContext::ready().await;
    let order_id = ctx.place_order(CLIENT_ID, &[catalog.cheap_id, catalog.pricey_id]).await;
    ctx.group_payload(
        chat_peer(ChatRole::Dispatch),
        COURIER_ID,
        json!({ "command": "accept_order", "orderId": order_id }),
    )
    .await;
    ctx.private_payload(COURIER_ID, json!({ "command": "complete_order", "orderId": order_id }))
        .await;

    ctx.group_text(management_chat(), MANAGER_ID, "/отчет").await;
    let daily = ctx.gateway.last_text(management_chat());
    assert!(daily.starts_with("📊 ЕЖЕДНЕВНЫЙ ОТЧЕТ"));
    assert!(daily.contains("📦 Завершено заказов: 1"));
    assert!(daily.contains("💰 За день поступило: 250р."));
    assert!(daily.contains("• Курьер Петя: 110р."));

    ctx.group_text(management_chat(), MANAGER_ID, "/отчет_неделя").await;
    let weekly = ctx.gateway.last_text(management_chat());
    assert!(weekly.starts_with("📊 НЕДЕЛЬНЫЙ ОТЧЕТ"));
    assert!(weekly.contains("💰 Доход за неделю: 140р."));
}
