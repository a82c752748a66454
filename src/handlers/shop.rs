//! Client-facing screens: catalog, cart, checkout and order status
//!
//! Each screen sends exactly one message and leaves the conversation state
//! where the next turn expects it.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{cart_total, CartLine};
use crate::services::keyboards;
use crate::services::orders::format_order_status;
use crate::state::{AppContext, ConversationState, DialogueStep};
use crate::utils::errors::Result;
use crate::utils::logging::log_user_action;

pub const MAIN_MENU_TEXT: &str = "📋 Главное меню:";
pub const WELCOME_TEXT: &str = "👋 Добро пожаловать! Выберите действие:";
pub const UNKNOWN_COMMAND_TEXT: &str = "❓ Неизвестная команда. Выберите действие из меню:";
pub const UNKNOWN_STATE_TEXT: &str = "❓ Неизвестное состояние. Начните сначала:";

const EMPLOYMENT_TEXT: &str = "💼 Трудоустройство\n\nДля трудоустройства необходимо:\n1. Заполнить анкету: https://vk.cc/cUqFKe\n2. Связаться с руководством: https://vk.com/province104";
const FAQ_TEXT: &str = "❓ Частые вопросы\n\n• Как сделать заказ?\n• Сколько стоит доставка?\n• Время работы?\n\nОбращайтесь в поддержку для получения ответов.";

/// State data keys of the checkout dialogue
pub const USERNAME_KEY: &str = "username";
pub const LOCATION_KEY: &str = "location";
pub const CATEGORY_ID_KEY: &str = "categoryId";

const DIVIDER: &str = "━━━━━━━━━━━━━━━━";

pub async fn send_menu(ctx: &AppContext, user_id: i64, text: &str) -> Result<()> {
    ctx.gateway
        .send_message(user_id, text, Some(&keyboards::main_menu()))
        .await?;
    Ok(())
}

pub async fn show_employment(ctx: &AppContext, user_id: i64) -> Result<()> {
    ctx.gateway
        .send_message(user_id, EMPLOYMENT_TEXT, Some(&keyboards::back_button("back")))
        .await?;
    Ok(())
}

pub async fn show_faq(ctx: &AppContext, user_id: i64) -> Result<()> {
    ctx.gateway
        .send_message(user_id, FAQ_TEXT, Some(&keyboards::back_button("back")))
        .await?;
    Ok(())
}

/// Browse-only catalog
pub async fn show_catalog(ctx: &AppContext, user_id: i64) -> Result<()> {
    let categories = ctx.store.categories().await?;
    if categories.is_empty() {
        ctx.gateway
            .send_message(user_id, "📋 Каталог пуст", Some(&keyboards::back_button("back")))
            .await?;
        return Ok(());
    }

    ctx.gateway
        .send_message(
            user_id,
            "📋 Каталог товаров\n\nВыберите категорию:",
            Some(&keyboards::categories(&categories, "main_menu")),
        )
        .await?;
    Ok(())
}

/// Catalog entry point of the ordering dialogue
pub async fn start_order(ctx: &AppContext, user_id: i64) -> Result<()> {
    let categories = ctx.store.categories().await?;
    if categories.is_empty() {
        send_menu(ctx, user_id, "❌ Товары временно недоступны").await?;
        return Ok(());
    }

    ctx.gateway
        .send_message(
            user_id,
            "🛒 Выберите категорию товара:",
            Some(&keyboards::categories(&categories, "main_menu")),
        )
        .await?;
    ctx.store
        .set_state(&ConversationState::new(user_id, DialogueStep::SelectingCategory))
        .await
}

pub async fn show_category_products(ctx: &AppContext, user_id: i64, category_id: i64, page: usize) -> Result<()> {
    let Some(category) = ctx.store.category(category_id).await? else {
        ctx.gateway
            .send_message(user_id, "❌ Категория не найдена", None)
            .await?;
        return start_order(ctx, user_id).await;
    };

    let products = ctx.store.products_by_category(category_id).await?;
    if products.is_empty() {
        ctx.gateway
            .send_message(
                user_id,
                "❌ В этой категории пока нет товаров",
                Some(&keyboards::back_button("order")),
            )
            .await?;
        return Ok(());
    }

    ctx.gateway
        .send_message(
            user_id,
            &format!("📦 {}\n\nВыберите товар:", category.name),
            Some(&keyboards::products(&products, page, category_id)),
        )
        .await?;

    let state = ConversationState::new(user_id, DialogueStep::SelectingProduct)
        .with_data(CATEGORY_ID_KEY, category_id)?;
    ctx.store.set_state(&state).await
}

pub async fn add_to_cart(ctx: &AppContext, user_id: i64, product_id: i64) -> Result<()> {
    let Some(product) = ctx.store.product(product_id).await? else {
        ctx.gateway
            .send_message(user_id, "❌ Товар не найден", None)
            .await?;
        return start_order(ctx, user_id).await;
    };

    ctx.store.add_to_cart(user_id, product_id, 1).await?;
    log_user_action(user_id, "add_to_cart", Some(&product.name));

    ctx.gateway
        .send_message(
            user_id,
            &format!(
                "✅ Добавлено в корзину:\n{} - {}р.\n\nХотите продолжить покупки?",
                product.label(),
                product.price
            ),
            Some(&keyboards::cart_actions()),
        )
        .await?;
    Ok(())
}

/// Cart listing with line totals
pub fn format_cart(lines: &[CartLine]) -> String {
    if lines.is_empty() {
        return "🛒 Корзина пуста".to_string();
    }

    let mut message = format!("🛒 Корзина:\n{}\n", DIVIDER);
    for line in lines {
        message.push_str(&format!(
            "• {} | {}р. (х{}) = {}р.\n",
            line.product.label(),
            line.product.price,
            line.quantity,
            line.line_total()
        ));
    }
    message.push_str(&format!("{}\n💰 Итого: {}р.", DIVIDER, cart_total(lines)));
    message
}

pub async fn show_cart(ctx: &AppContext, user_id: i64) -> Result<()> {
    let lines = ctx.store.cart_lines(user_id).await?;
    if lines.is_empty() {
        send_menu(ctx, user_id, "🛒 Корзина пуста\n\nДобавьте товары через \"Заказать\"").await?;
        return Ok(());
    }

    ctx.gateway
        .send_message(user_id, &format_cart(&lines), Some(&keyboards::cart()))
        .await?;
    Ok(())
}

pub async fn show_remove_list(ctx: &AppContext, user_id: i64) -> Result<()> {
    let lines = ctx.store.cart_lines(user_id).await?;
    if lines.is_empty() {
        return show_cart(ctx, user_id).await;
    }

    ctx.gateway
        .send_message(
            user_id,
            "🗑 Выберите товар для удаления:",
            Some(&keyboards::remove_items(&lines)),
        )
        .await?;
    Ok(())
}

pub async fn remove_from_cart(ctx: &AppContext, user_id: i64, product_id: i64) -> Result<()> {
    if ctx.store.remove_from_cart(user_id, product_id).await? {
        log_user_action(user_id, "remove_from_cart", Some(&product_id.to_string()));
    }
    show_cart(ctx, user_id).await
}

pub async fn clear_cart(ctx: &AppContext, user_id: i64) -> Result<()> {
    ctx.store.clear_cart(user_id).await?;
    log_user_action(user_id, "clear_cart", None);
    send_menu(ctx, user_id, "🗑️ Корзина очищена").await
}

pub async fn start_checkout(ctx: &AppContext, user_id: i64) -> Result<()> {
    if ctx.store.cart_lines(user_id).await?.is_empty() {
        send_menu(ctx, user_id, "❌ Корзина пуста").await?;
        return Ok(());
    }

    ctx.store
        .set_state(&ConversationState::new(user_id, DialogueStep::EnteringUsername))
        .await?;
    ctx.gateway
        .send_message(user_id, "📝 Введите ваш никнейм:", None)
        .await?;
    Ok(())
}

/// Summary before placing the order
pub async fn show_confirmation(ctx: &AppContext, user_id: i64, username: &str, location: &str) -> Result<()> {
    let lines = ctx.store.cart_lines(user_id).await?;
    if lines.is_empty() {
        ctx.store.clear_state(user_id).await?;
        return send_menu(ctx, user_id, "❌ Корзина пуста").await;
    }

    let state = ConversationState::new(user_id, DialogueStep::ConfirmingOrder)
        .with_data(USERNAME_KEY, username)?
        .with_data(LOCATION_KEY, location)?;
    ctx.store.set_state(&state).await?;

    let message = format!(
        "📋 Подтверждение заказа\n\nНикнейм: {}\nАдрес: {}\n\n{}\n\nВсё верно?",
        username,
        location,
        format_cart(&lines)
    );
    ctx.gateway
        .send_message(user_id, &message, Some(&keyboards::confirm_order()))
        .await?;
    Ok(())
}

/// Place the order collected in a confirming state
pub async fn place_order(ctx: &AppContext, user_id: i64, state: &ConversationState, now: DateTime<Utc>) -> Result<()> {
    let (Some(username), Some(location)) = (state.get_string(USERNAME_KEY), state.get_string(LOCATION_KEY)) else {
        ctx.store.clear_state(user_id).await?;
        return send_menu(ctx, user_id, UNKNOWN_STATE_TEXT).await;
    };

    match ctx.orders.place(user_id, &username, &location, now).await? {
        Some(order) => {
            log_user_action(user_id, "place_order", Some(&order.id.to_string()));
            send_menu(
                ctx,
                user_id,
                &format!("✅ Заказ #{} принят!\n\nОжидайте принятия заказа курьером...", order.id),
            )
            .await
        }
        None => {
            ctx.store.clear_state(user_id).await?;
            send_menu(ctx, user_id, "❌ Корзина пуста").await
        }
    }
}

pub async fn cancel_checkout(ctx: &AppContext, user_id: i64) -> Result<()> {
    ctx.store.clear_state(user_id).await?;
    info!(user_id = user_id, "Checkout cancelled");
    send_menu(ctx, user_id, "❌ Заказ отменен").await
}

pub async fn show_my_orders(ctx: &AppContext, user_id: i64) -> Result<()> {
    let orders = ctx
        .store
        .active_orders_for_client(user_id, ctx.settings.orders.active_orders_limit)
        .await?;
    if orders.is_empty() {
        return send_menu(ctx, user_id, "📦 У вас нет активных заказов").await;
    }

    let mut message = String::from("📦 Ваши заказы:\n\n");
    for order in &orders {
        let (emoji, status) = order.status.describe();
        message.push_str(&format!(
            "Заказ #{}\nСтатус: {} {}\nСумма: {}р.\n\n",
            order.id, emoji, status, order.total_price
        ));
    }

    send_menu(ctx, user_id, message.trim_end()).await
}

pub async fn show_order_status(ctx: &AppContext, user_id: i64, order_id: i64) -> Result<()> {
    match ctx.store.order(order_id).await? {
        Some(order) if order.client_vk_id == user_id => {
            ctx.gateway
                .send_message(
                    user_id,
                    &format_order_status(&order),
                    Some(&keyboards::client_order_status(order_id)),
                )
                .await?;
            Ok(())
        }
        _ => send_menu(ctx, user_id, "❌ Заказ не найден").await,
    }
}
