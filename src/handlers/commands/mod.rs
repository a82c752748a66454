//! Staff command handlers for group chats
//!
//! Each chat role has its own vocabulary: activity-log commands start with
//! `!`, senior and management commands with `/`. Multi-step commands keep
//! their progress in the employee's conversation state together with the
//! chat they were started in.

pub mod activity;
pub mod management;
pub mod senior;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::Employee;
use crate::state::{AppContext, ConversationState, DialogueStep};
use crate::utils::errors::Result;

/// State data key of the chat a staff dialogue belongs to
pub const PEER_ID_KEY: &str = "peerId";

/// One staff message in a registered chat
pub struct CommandInput<'a> {
    pub peer_id: i64,
    pub employee: &'a Employee,
    pub text: &'a str,
    pub now: DateTime<Utc>,
}

impl<'a> CommandInput<'a> {
    /// Lowercased command word and the trimmed rest of the message
    pub fn command(&self) -> (String, &'a str) {
        let text = self.text.trim();
        match text.split_once(char::is_whitespace) {
            Some((command, rest)) => (command.to_lowercase(), rest.trim()),
            None => (text.to_lowercase(), ""),
        }
    }
}

pub async fn reply(ctx: &AppContext, peer_id: i64, text: &str) -> Result<()> {
    ctx.gateway.send_message(peer_id, text, None).await?;
    Ok(())
}

/// Start a multi-step staff dialogue bound to the current chat
pub async fn start_flow(ctx: &AppContext, input: &CommandInput<'_>, step: DialogueStep, prompt: &str) -> Result<()> {
    start_flow_with(ctx, input, ConversationState::new(input.employee.vk_id, step), prompt).await
}

pub async fn start_flow_with(ctx: &AppContext, input: &CommandInput<'_>, state: ConversationState, prompt: &str) -> Result<()> {
    let state = state.with_data(PEER_ID_KEY, input.peer_id)?;
    ctx.store.set_state(&state).await?;
    reply(ctx, input.peer_id, prompt).await
}

/// Feed a message to a pending staff dialogue.
///
/// Returns false when the message is not part of it: another chat, or a new
/// `/` command that should replace it.
pub async fn continue_flow(ctx: &AppContext, input: &CommandInput<'_>, state: ConversationState) -> Result<bool> {
    if state.get_i64(PEER_ID_KEY) != Some(input.peer_id) {
        return Ok(false);
    }

    let (command, _) = input.command();
    if command == "/отмена" {
        ctx.store.clear_state(input.employee.vk_id).await?;
        reply(ctx, input.peer_id, "❌ Действие отменено").await?;
        return Ok(true);
    }
    if command.starts_with('/') {
        return Ok(false);
    }

    let Some(step) = state.step() else {
        return Ok(false);
    };
    debug!(user_id = input.employee.vk_id, peer_id = input.peer_id, step = %step, "Continuing staff dialogue");

    match step {
        DialogueStep::SeniorAddingStaff | DialogueStep::SeniorCreatingAnnouncement => {
            senior::continue_flow(ctx, input, step, state).await?;
        }
        DialogueStep::ManagementAddingCategory
        | DialogueStep::ManagementDeletingCategory
        | DialogueStep::ManagementAddingProductCategory
        | DialogueStep::ManagementAddingProductDetails
        | DialogueStep::ManagementDeletingProduct
        | DialogueStep::ManagementCreatingPost => {
            management::continue_flow(ctx, input, step, state).await?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// Pick an id from a numbered list shown earlier; `choice` is 1-based
pub fn pick_numbered(state: &ConversationState, key: &str, choice: &str) -> Option<i64> {
    let ids: Vec<i64> = state.get_data(key).ok().flatten()?;
    let index: usize = choice.trim().trim_end_matches('.').parse().ok()?;
    index.checked_sub(1).and_then(|i| ids.get(i).copied())
}
