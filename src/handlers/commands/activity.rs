//! Presence and statistics commands
//!
//! `!онлайн`, `!афк` and `!вышел` work in the activity-log chat; `!стата`
//! and `!беседы` in any registered chat.

use chrono::Duration;
use tracing::warn;

use crate::handlers::commands::{reply, CommandInput};
use crate::models::{ChatRegistration, PresenceStatus, StaffStats, ONLINE_WINDOW_MINUTES};
use crate::state::AppContext;
use crate::utils::errors::Result;
use crate::utils::logging::log_user_action;

/// Activity-log chat vocabulary; false when the message is not a command
pub async fn handle(ctx: &AppContext, input: &CommandInput<'_>) -> Result<bool> {
    let (command, _) = input.command();
    let employee = input.employee;

    match command.as_str() {
        "!онлайн" => show_online(ctx, input).await?,
        "!афк" => {
            ctx.store
                .set_presence(employee.vk_id, &employee.username, PresenceStatus::Afk, input.now)
                .await?;
            log_user_action(employee.vk_id, "presence_afk", None);
            reply(ctx, input.peer_id, &format!("✅ {} отметился как АФК", employee.username)).await?;
        }
        "!вышел" => {
            ctx.store
                .set_presence(employee.vk_id, &employee.username, PresenceStatus::Offline, input.now)
                .await?;
            log_user_action(employee.vk_id, "presence_offline", None);
            reply(ctx, input.peer_id, &format!("👋 {} вышел", employee.username)).await?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

async fn show_online(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let since = input.now - Duration::minutes(ONLINE_WINDOW_MINUTES);
    let online = ctx.store.online_staff(since).await?;
    if online.is_empty() {
        return reply(ctx, input.peer_id, "😴 Сейчас никого нет онлайн").await;
    }

    let mut message = String::from("👥 На сервере:\n");
    for presence in &online {
        let stats = ctx.store.staff_stats(presence.vk_id, input.now).await?;
        let icon = if presence.status == PresenceStatus::Online { "🟢" } else { "🟡" };
        message.push_str(&format!(
            "{} {} ({}ч)\n",
            icon,
            presence.username,
            stats.online_minutes_today / 60
        ));
    }

    reply(ctx, input.peer_id, message.trim_end()).await
}

pub fn format_stats(username: &str, stats: &StaffStats) -> String {
    format!(
        "📊 Статистика {}:\n\n💬 Кол-во сообщений: {}\n🕐 Онлайн за сегодня: {}ч. {}м.\n🕐 Онлайн за неделю: {}ч.\n📦 Принято заказов: {}",
        username,
        stats.messages_week,
        stats.online_minutes_today / 60,
        stats.online_minutes_today % 60,
        stats.online_minutes_week / 60,
        stats.orders_accepted_week
    )
}

/// `!стата`: the sender's own numbers
pub async fn own_stats(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let stats = ctx.store.staff_stats(input.employee.vk_id, input.now).await?;
    reply(ctx, input.peer_id, &format_stats(&input.employee.username, &stats)).await
}

pub fn format_chat_list(chats: &[ChatRegistration]) -> String {
    let mut message = String::from("💬 Список бесед, в которых состоит бот:\n\n");
    for chat in chats {
        let title = if chat.title.is_empty() { "Без названия" } else { chat.title.as_str() };
        message.push_str(&format!(
            "📌 {}\n   Название: {}\n   Peer ID: {}\n\n",
            chat.chat_type.display_name(),
            title,
            chat.peer_id
        ));
    }
    message.trim_end().to_string()
}

/// `!беседы`: registered chats, sent privately
pub async fn list_chats(ctx: &AppContext, input: &CommandInput<'_>) -> Result<()> {
    let chats = ctx.store.all_chats().await?;
    let text = if chats.is_empty() {
        "❌ Беседы еще не зарегистрированы".to_string()
    } else {
        format_chat_list(&chats)
    };

    if let Err(e) = ctx.gateway.send_message(input.employee.vk_id, &text, None).await {
        // Private messages from the community may be disabled by the user
        warn!(user_id = input.employee.vk_id, error = %e, "Failed to send chat list privately");
        reply(ctx, input.peer_id, "❌ Не удалось отправить список в ЛС. Разрешите сообщения от сообщества").await?;
    }
    Ok(())
}
