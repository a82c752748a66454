//! Management chat commands: catalog editing, feed posts and reports

use tracing::info;

use crate::handlers::commands::{pick_numbered, reply, start_flow, start_flow_with, CommandInput};
use crate::models::CreateProductRequest;
use crate::state::{AppContext, ConversationState, DialogueStep};
use crate::utils::errors::{CourierHubError, Result};
use crate::utils::helpers::validate_product_data;
use crate::utils::logging::log_admin_action;

const IDS_KEY: &str = "ids";
const CATEGORY_ID_KEY: &str = "categoryId";

const PRODUCT_FORMAT_PROMPT: &str = "📝 Введите данные товара в формате:\nНазвание | Цена | Себестоимость | КБЖУ (необязательно)";

pub async fn handle(ctx: &AppContext, input: &CommandInput<'_>) -> Result<bool> {
    let (command, _) = input.command();

    match canonical_command(&command) {
        "/добавить_категорию" => {
            start_flow(ctx, input, DialogueStep::ManagementAddingCategory, "📁 Введите название категории:").await?
        }
        "/удалить_категорию" => {
            choose_category(ctx, input, DialogueStep::ManagementDeletingCategory, "🗑 Выберите категорию для удаления (номер):").await?
        }
        "/добавить_товар" => {
            choose_category(ctx, input, DialogueStep::ManagementAddingProductCategory, "📦 Выберите категорию товара (номер):").await?
        }
        "/удалить_товар" => choose_product(ctx, input).await?,
        "/пост" => start_flow(ctx, input, DialogueStep::ManagementCreatingPost, "📝 Введите текст поста:").await?,
        "/отчет" => {
            let report = ctx.finance.daily_report(input.now).await?;
            reply(ctx, input.peer_id, &report).await?
        }
        "/отчет_неделя" => {
            let report = ctx.finance.weekly_report(input.now).await?;
            reply(ctx, input.peer_id, &report).await?
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// Map the latin shorthands onto the russian command names
fn canonical_command(command: &str) -> &str {
    match command {
        c if c.starts_with("/add_cat") => "/добавить_категорию",
        c if c.starts_with("/del_cat") => "/удалить_категорию",
        c if c.starts_with("/add_prod") => "/добавить_товар",
        c if c.starts_with("/del_prod") => "/удалить_товар",
        "/post" => "/пост",
        other => other,
    }
}

pub async fn continue_flow(ctx: &AppContext, input: &CommandInput<'_>, step: DialogueStep, state: ConversationState) -> Result<()> {
    match step {
        DialogueStep::ManagementAddingCategory => add_category(ctx, input).await,
        DialogueStep::ManagementDeletingCategory => delete_category(ctx, input, &state).await,
        DialogueStep::ManagementAddingProductCategory => pick_product_category(ctx, input, state).await,
        DialogueStep::ManagementAddingProductDetails => add_product(ctx, input, &state).await,
        DialogueStep::ManagementDeletingProduct => delete_product(ctx, input, &state).await,
        DialogueStep::ManagementCreatingPost => publish_post(ctx, input).await,
        _ => Ok(()),
    }
}

fn numbered<T>(items: &[T], label: impl Fn(&T) -> String) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, label(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn choose_category(ctx: &AppContext, input: &CommandInput<'_>, step: DialogueStep, title: &str) -> Result<()> {
    let categories = ctx.store.categories().await?;
    if categories.is_empty() {
        return reply(ctx, input.peer_id, "📋 Категорий нет").await;
    }

    let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
    let state = ConversationState::new(input.employee.vk_id, step).with_data(IDS_KEY, ids)?;
    let prompt = format!("{}\n\n{}", title, numbered(&categories, |c| c.name.clone()));
    start_flow_with(ctx, input, state, &prompt).await
}

async fn choose_product(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let products = ctx.store.all_products().await?;
    if products.is_empty() {
        return reply(ctx, input.peer_id, "📋 Товаров нет").await;
    }

    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let state = ConversationState::new(input.employee.vk_id, DialogueStep::ManagementDeletingProduct)
        .with_data(IDS_KEY, ids)?;
    let prompt = format!(
        "🗑 Выберите товар для удаления (номер):\n\n{}",
        numbered(&products, |p| format!("{} ({}р.)", p.label(), p.price))
    );
    start_flow_with(ctx, input, state, &prompt).await
}

/// `Название` or `Название | Описание`
async fn add_category(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let (name, description) = match input.text.split_once('|') {
        Some((name, description)) => (name.trim(), Some(description.trim()).filter(|d| !d.is_empty())),
        None => (input.text.trim(), None),
    };
    if name.is_empty() {
        return reply(ctx, input.peer_id, "❌ Название не может быть пустым. Попробуйте еще раз:").await;
    }

    let category = ctx.store.create_category(name, description).await?;
    ctx.store.clear_state(input.employee.vk_id).await?;
    log_admin_action(input.employee.vk_id, "create_category", Some(&category.id.to_string()), Some(name));

    reply(ctx, input.peer_id, &format!("✅ Категория \"{}\" создана", category.name)).await
}

async fn delete_category(ctx: &AppContext, input: &CommandInput<'_>, state: &ConversationState) -> Result<()> {
    let Some(category_id) = pick_numbered(state, IDS_KEY, input.text) else {
        return reply(ctx, input.peer_id, "❌ Введите номер из списка:").await;
    };
    ctx.store.clear_state(input.employee.vk_id).await?;

    let name = ctx.store.category(category_id).await?.map(|c| c.name);
    if !ctx.store.delete_category(category_id).await? {
        return reply(ctx, input.peer_id, "❌ Категория уже удалена").await;
    }
    log_admin_action(input.employee.vk_id, "delete_category", Some(&category_id.to_string()), name.as_deref());

    reply(
        ctx,
        input.peer_id,
        &format!("✅ Категория \"{}\" удалена вместе с товарами", name.unwrap_or_default()),
    )
    .await
}

async fn pick_product_category(ctx: &AppContext, input: &CommandInput<'_>, state: ConversationState) -> Result<()> {
    let Some(category_id) = pick_numbered(&state, IDS_KEY, input.text) else {
        return reply(ctx, input.peer_id, "❌ Введите номер из списка:").await;
    };

    let next = state
        .advance(DialogueStep::ManagementAddingProductDetails)
        .with_data(CATEGORY_ID_KEY, category_id)?;
    ctx.store.set_state(&next).await?;
    reply(ctx, input.peer_id, PRODUCT_FORMAT_PROMPT).await
}

/// Parse `Название | Цена | Себестоимость | КБЖУ`
pub fn parse_product(category_id: i64, text: &str) -> Result<CreateProductRequest> {
    let parts: Vec<&str> = text.split('|').map(str::trim).collect();
    if parts.len() < 3 {
        return Err(CourierHubError::InvalidInput("Неверный формат".to_string()));
    }

    let (name, price, cost_price) = validate_product_data(parts[0], parts[1], parts[2])?;
    let nutrition = parts
        .get(3)
        .filter(|n| !n.is_empty())
        .map(|n| n.to_string());

    Ok(CreateProductRequest {
        category_id,
        name,
        nutrition,
        price,
        cost_price,
    })
}

async fn add_product(ctx: &AppContext, input: &CommandInput<'_>, state: &ConversationState) -> Result<()> {
    let Some(category_id) = state.get_i64(CATEGORY_ID_KEY) else {
        ctx.store.clear_state(input.employee.vk_id).await?;
        return reply(ctx, input.peer_id, "❌ Категория не выбрана, начните сначала").await;
    };

    let request = match parse_product(category_id, input.text) {
        Ok(request) => request,
        Err(CourierHubError::InvalidInput(reason)) => {
            return reply(
                ctx,
                input.peer_id,
                &format!("❌ {}. Попробуйте еще раз:\n\n{}", reason, PRODUCT_FORMAT_PROMPT),
            )
            .await;
        }
        Err(e) => return Err(e),
    };

    if ctx.store.category(category_id).await?.is_none() {
        ctx.store.clear_state(input.employee.vk_id).await?;
        return reply(ctx, input.peer_id, "❌ Категория была удалена, начните сначала").await;
    }

    let product = ctx.store.create_product(&request).await?;
    ctx.store.clear_state(input.employee.vk_id).await?;
    log_admin_action(input.employee.vk_id, "create_product", Some(&product.id.to_string()), Some(&product.name));

    reply(
        ctx,
        input.peer_id,
        &format!("✅ Товар \"{}\" добавлен: {}р. (себестоимость {}р.)", product.label(), product.price, product.cost_price),
    )
    .await
}

async fn delete_product(ctx: &AppContext, input: &CommandInput<'_>, state: &ConversationState) -> Result<()> {
    let Some(product_id) = pick_numbered(state, IDS_KEY, input.text) else {
        return reply(ctx, input.peer_id, "❌ Введите номер из списка:").await;
    };
    ctx.store.clear_state(input.employee.vk_id).await?;

    let name = ctx.store.product(product_id).await?.map(|p| p.name);
    if !ctx.store.delete_product(product_id).await? {
        return reply(ctx, input.peer_id, "❌ Товар уже удален").await;
    }
    log_admin_action(input.employee.vk_id, "delete_product", Some(&product_id.to_string()), name.as_deref());

    reply(ctx, input.peer_id, &format!("✅ Товар \"{}\" удален", name.unwrap_or_default())).await
}

async fn publish_post(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let text = input.text.trim();
    if text.is_empty() {
        return reply(ctx, input.peer_id, "📝 Введите текст поста:").await;
    }
    ctx.store.clear_state(input.employee.vk_id).await?;

    let post_id = ctx.gateway.post_to_feed(text).await?;
    info!(post_id = post_id, user_id = input.employee.vk_id, "Post published");
    log_admin_action(input.employee.vk_id, "post", Some(&post_id.to_string()), None);

    reply(ctx, input.peer_id, "✅ Пост опубликован в сообществе").await
}
