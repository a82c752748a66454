//! Senior staff chat commands
//!
//! Available to senior staff and management only; the gate is checked by
//! the group router before anything here runs.

use chrono::Duration;
use tracing::{info, warn};

use crate::handlers::commands::{reply, start_flow, CommandInput};
use crate::models::{ChatRole, Role};
use crate::state::{AppContext, ConversationState, DialogueStep};
use crate::utils::errors::Result;
use crate::utils::helpers::{format_date, parse_user_mention, validate_username};
use crate::utils::logging::log_admin_action;

/// Blacklist length when `/чс` gets no explicit number of days
pub const DEFAULT_BLACKLIST_DAYS: i64 = 30;

/// Longest blacklist `/чс` accepts, about a hundred years
pub const MAX_BLACKLIST_DAYS: i64 = 36_500;

const ADD_STAFF_PROMPT: &str = "👤 Отправьте данные нового сотрудника:\n<VK ID> <роль> <имя>\n\nРоли: стажёр, курьер, старший, руководство";

pub async fn handle(ctx: &AppContext, input: &CommandInput<'_>) -> Result<bool> {
    let (command, args) = input.command();

    match command.as_str() {
        "/статистика" | "/stats" => weekly_stats(ctx, input).await?,
        "/добавить" | "/add" => start_flow(ctx, input, DialogueStep::SeniorAddingStaff, ADD_STAFF_PROMPT).await?,
        "/объявление" | "/announce" => {
            start_flow(ctx, input, DialogueStep::SeniorCreatingAnnouncement, "📢 Введите текст объявления:").await?
        }
        "/открепить" => unpin_board(ctx, input).await?,
        "/кик" => kick(ctx, input, args).await?,
        "/чс" => blacklist(ctx, input, args).await?,
        "/разбан" => unblacklist(ctx, input, args).await?,
        _ => return Ok(false),
    }
    Ok(true)
}

pub async fn continue_flow(ctx: &AppContext, input: &CommandInput<'_>, step: DialogueStep, _state: ConversationState) -> Result<()> {
    match step {
        DialogueStep::SeniorAddingStaff => add_staff(ctx, input).await,
        DialogueStep::SeniorCreatingAnnouncement => announce(ctx, input).await,
        _ => Ok(()),
    }
}

async fn weekly_stats(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let staff_roles: Vec<Role> = Role::ALL.into_iter().filter(|role| role.is_staff()).collect();
    let employees = ctx.store.employees_by_roles(&staff_roles).await?;
    if employees.is_empty() {
        return reply(ctx, input.peer_id, "👥 Сотрудников пока нет").await;
    }

    let mut message = String::from("📊 Статистика сотрудников за неделю:\n\n");
    for employee in &employees {
        let stats = ctx.store.staff_stats(employee.vk_id, input.now).await?;
        message.push_str(&format!(
            "👤 {} ({})\n💬 {} | 🕐 {}ч. | 📦 {}\n\n",
            employee.username,
            employee.role.display_name(),
            stats.messages_week,
            stats.online_minutes_week / 60,
            stats.orders_accepted_week
        ));
    }

    reply(ctx, input.peer_id, message.trim_end()).await
}

/// Parse `<id> <role> <name>`
pub fn parse_staff_entry(text: &str) -> Option<(i64, Role, String)> {
    let mut parts = text.split_whitespace();
    let vk_id = parse_user_mention(parts.next()?)?;
    let role = Role::from_user_input(parts.next()?)?;
    let name = validate_username(&parts.collect::<Vec<_>>().join(" ")).ok()?;
    Some((vk_id, role, name))
}

async fn add_staff(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let Some((vk_id, role, name)) = parse_staff_entry(input.text) else {
        return reply(ctx, input.peer_id, &format!("❌ Неверный формат.\n\n{}", ADD_STAFF_PROMPT)).await;
    };

    if role > input.employee.role {
        return reply(ctx, input.peer_id, "❌ Нельзя назначить роль выше своей").await;
    }

    ctx.store.upsert_employee(vk_id, &name, role).await?;
    ctx.store.clear_state(input.employee.vk_id).await?;
    log_admin_action(input.employee.vk_id, "add_employee", Some(&vk_id.to_string()), Some(role.as_str()));

    reply(
        ctx,
        input.peer_id,
        &format!("✅ Сотрудник {} добавлен как {}", name, role.display_name()),
    )
    .await
}

async fn announce(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let text = input.text.trim();
    if text.is_empty() {
        return reply(ctx, input.peer_id, "📢 Введите текст объявления:").await;
    }
    ctx.store.clear_state(input.employee.vk_id).await?;

    let Some(board) = ctx.registry.chat_for(ChatRole::Announcements).await? else {
        return reply(ctx, input.peer_id, "❌ Доска объявлений не зарегистрирована").await;
    };

    let message_id = ctx
        .gateway
        .send_message(board.peer_id, &format!("📢 ОБЪЯВЛЕНИЕ\n\n{}", text), None)
        .await?;
    log_admin_action(input.employee.vk_id, "announcement", Some(&board.peer_id.to_string()), None);

    match ctx.gateway.pin_message(board.peer_id, message_id).await {
        Ok(()) => reply(ctx, input.peer_id, "✅ Объявление опубликовано и закреплено").await,
        Err(e) => {
            warn!(peer_id = board.peer_id, error = %e, "Failed to pin announcement");
            reply(ctx, input.peer_id, "✅ Объявление опубликовано, но не закреплено").await
        }
    }
}

async fn unpin_board(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let Some(board) = ctx.registry.chat_for(ChatRole::Announcements).await? else {
        return reply(ctx, input.peer_id, "❌ Доска объявлений не зарегистрирована").await;
    };
    ctx.gateway.unpin_message(board.peer_id).await?;
    log_admin_action(input.employee.vk_id, "unpin", Some(&board.peer_id.to_string()), None);
    reply(ctx, input.peer_id, "✅ Объявление откреплено").await
}

async fn kick(ctx: &AppContext, input: &CommandInput<'_>, args: &str) -> Result<()> {
    let Some(target) = args.split_whitespace().next().and_then(parse_user_mention) else {
        return reply(ctx, input.peer_id, "❌ Использование: /кик <id>").await;
    };

    let chats = ctx.store.all_chats().await?;
    let mut removed = 0;
    for chat in &chats {
        match ctx.gateway.remove_chat_member(chat.peer_id, target).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(peer_id = chat.peer_id, user_id = target, error = %e, "Failed to remove chat member"),
        }
    }
    log_admin_action(input.employee.vk_id, "kick", Some(&target.to_string()), Some(&format!("{} chats", removed)));

    reply(
        ctx,
        input.peer_id,
        &format!("✅ Пользователь {} исключен из бесед: {}", target, removed),
    )
    .await
}

/// Parse `<id> [days]`
pub fn parse_blacklist_args(args: &str) -> Option<(i64, i64)> {
    let mut parts = args.split_whitespace();
    let target = parse_user_mention(parts.next()?)?;
    let days = match parts.next() {
        Some(days) => days
            .parse::<i64>()
            .ok()
            .filter(|d| (1..=MAX_BLACKLIST_DAYS).contains(d))?,
        None => DEFAULT_BLACKLIST_DAYS,
    };
    Some((target, days))
}

async fn blacklist(ctx: &AppContext, input: &CommandInput<'_>, args: &str) -> Result<()> {
    let parsed = parse_blacklist_args(args).and_then(|(target, days)| {
        let until = input.now.checked_add_signed(Duration::try_days(days)?)?;
        Some((target, days, until))
    });
    let Some((target, days, until)) = parsed else {
        return reply(ctx, input.peer_id, "❌ Использование: /чс <id> [дней]").await;
    };

    ctx.store.set_blacklist(target, Some(until)).await?;
    if let Err(e) = ctx.gateway.ban_user(target, Some(until)).await {
        warn!(user_id = target, error = %e, "Failed to ban user in the community");
    }
    log_admin_action(input.employee.vk_id, "blacklist", Some(&target.to_string()), Some(&format!("{} days", days)));
    info!(user_id = target, until = %until, "User blacklisted");

    reply(
        ctx,
        input.peer_id,
        &format!("⛔ Пользователь {} в черном списке до {}", target, format_date(until)),
    )
    .await
}

async fn unblacklist(ctx: &AppContext, input: &CommandInput<'_>, args: &str) -> Result<()> {
    let Some(target) = args.split_whitespace().next().and_then(parse_user_mention) else {
        return reply(ctx, input.peer_id, "❌ Использование: /разбан <id>").await;
    };

    ctx.store.set_blacklist(target, None).await?;
    if let Err(e) = ctx.gateway.unban_user(target).await {
        warn!(user_id = target, error = %e, "Failed to unban user in the community");
    }
    log_admin_action(input.employee.vk_id, "unblacklist", Some(&target.to_string()), None);

    reply(ctx, input.peer_id, &format!("✅ Пользователь {} разблокирован", target)).await
}
