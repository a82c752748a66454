//! Inbound message routing
//!
//! Every `message_new` event goes through [`route_message`]: blacklist
//! first, then the private dialogue or the group chat handlers.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::handlers::{group, messages};
use crate::handlers::payload::Intent;
use crate::state::AppContext;
use crate::utils::errors::Result;
use crate::utils::helpers::format_timestamp;

/// Message a reply refers to
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyMessage {
    #[serde(default)]
    pub from_id: i64,
    #[serde(default)]
    pub text: String,
}

/// The `message` object of a `message_new` event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingMessage {
    pub peer_id: i64,
    pub from_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub reply_message: Option<ReplyMessage>,
    #[serde(default)]
    pub conversation_message_id: Option<i64>,
}

impl IncomingMessage {
    /// A conversation with the community itself, as opposed to a group chat
    pub fn is_private(&self) -> bool {
        self.peer_id == self.from_id
    }

    pub fn intent(&self) -> Intent {
        Intent::decode(self.payload.as_deref())
    }

    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

/// Route one inbound message; errors bubble up to the webhook boundary
pub async fn route_message(ctx: &AppContext, message: &IncomingMessage, now: DateTime<Utc>) -> Result<()> {
    debug!(
        peer_id = message.peer_id,
        user_id = message.from_id,
        has_payload = message.payload.is_some(),
        "Routing message"
    );

    // Communities and bots post with non-positive ids
    if message.from_id <= 0 {
        return Ok(());
    }

    if let Some(user) = ctx.store.get_user(message.from_id).await? {
        if let Some(until) = user.blocked_until(now) {
            info!(user_id = user.vk_id, until = %until, "Blocked user ignored");
            ctx.gateway
                .send_message(
                    message.from_id,
                    &format!("⛔ Вы в черном списке до {}", format_timestamp(until)),
                    None,
                )
                .await?;
            return Ok(());
        }
    }

    if message.is_private() {
        messages::handle_private(ctx, message, now).await
    } else {
        group::handle_group(ctx, message, now).await
    }
}
