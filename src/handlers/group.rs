//! Group chat handling
//!
//! Unregistered chats are only discovered. In registered chats the dispatch
//! accept button is open to every employee, while commands are matched
//! against the chat's role and the sender's staff role.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::handlers::commands::{self, activity, management, senior, CommandInput};
use crate::handlers::payload::Intent;
use crate::handlers::router::IncomingMessage;
use crate::models::{ChatRole, Role};
use crate::state::AppContext;
use crate::utils::errors::Result;
use crate::utils::logging::{log_admin_action, log_chat_event};

pub async fn handle_group(ctx: &AppContext, message: &IncomingMessage, now: DateTime<Utc>) -> Result<()> {
    let peer_id = message.peer_id;

    let Some(chat) = ctx.registry.resolve(peer_id).await? else {
        ctx.registry.discover(peer_id).await?;
        return Ok(());
    };

    if let Intent::AcceptOrder { order_id } = message.intent() {
        if chat.chat_type == ChatRole::Dispatch {
            log_chat_event(peer_id, "accept_order", Some(message.from_id), Some(&order_id.to_string()));
            ctx.orders.accept(order_id, message.from_id, now).await?;
        }
        return Ok(());
    }

    let Some(employee) = ctx.store.get_employee(message.from_id).await? else {
        debug!(peer_id = peer_id, user_id = message.from_id, "Message from a non-employee ignored");
        return Ok(());
    };

    if let Err(e) = ctx.store.record_staff_message(employee.vk_id, &employee.username, now).await {
        warn!(user_id = employee.vk_id, error = %e, "Failed to record staff activity");
    }

    let input = CommandInput {
        peer_id,
        employee: &employee,
        text: message.text(),
        now,
    };

    if let Some(state) = ctx.store.get_state(employee.vk_id).await? {
        if state.step().is_some_and(|step| step.is_group_flow()) && commands::continue_flow(ctx, &input, state).await? {
            return Ok(());
        }
    }

    let (command, _) = input.command();
    match command.as_str() {
        "!пост" => return publish_reply(ctx, message, &input).await,
        "!стата" => return activity::own_stats(ctx, &input).await,
        "!беседы" => return activity::list_chats(ctx, &input).await,
        _ => {}
    }

    let handled = match chat.chat_type {
        ChatRole::ActivityLog => activity::handle(ctx, &input).await?,
        ChatRole::SeniorStaff if employee.role.at_least(Role::Senior) => senior::handle(ctx, &input).await?,
        ChatRole::Management if employee.role.at_least(Role::Management) => management::handle(ctx, &input).await?,
        _ => false,
    };

    if handled {
        log_chat_event(peer_id, "command", Some(employee.vk_id), Some(&command));
    }
    Ok(())
}

/// `!пост` as a reply publishes the replied-to text to the community feed
async fn publish_reply(ctx: &AppContext, message: &IncomingMessage, input: &CommandInput<'_>) -> Result<()> {
    if !input.employee.role.at_least(Role::Senior) {
        return Ok(());
    }

    let text = message
        .reply_message
        .as_ref()
        .map(|reply| reply.text.trim())
        .filter(|text| !text.is_empty());
    let Some(text) = text else {
        return commands::reply(ctx, input.peer_id, "❌ Ответьте командой !пост на сообщение с текстом поста").await;
    };

    let post_id = ctx.gateway.post_to_feed(text).await?;
    log_admin_action(input.employee.vk_id, "post_from_reply", Some(&post_id.to_string()), None);
    commands::reply(ctx, input.peer_id, "✅ Пост опубликован в сообществе").await
}
