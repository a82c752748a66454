//! Chat role registry
//!
//! Maps group chat peer ids to logical roles. Unknown chats are discovered
//! once from their title; an existing registration is never touched again.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::Store;
use crate::models::{ChatRegistration, ChatRole};
use crate::services::MessagingGateway;
use crate::utils::errors::Result;
use crate::utils::logging::log_chat_event;

#[derive(Clone)]
pub struct ChatRegistry {
    store: Arc<dyn Store>,
    gateway: Arc<dyn MessagingGateway>,
    admin_user_id: i64,
}

impl ChatRegistry {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn MessagingGateway>, admin_user_id: i64) -> Self {
        Self {
            store,
            gateway,
            admin_user_id,
        }
    }

    pub async fn resolve(&self, peer_id: i64) -> Result<Option<ChatRegistration>> {
        self.store.chat_by_peer(peer_id).await
    }

    pub async fn chat_for(&self, role: ChatRole) -> Result<Option<ChatRegistration>> {
        self.store.chat_by_role(role).await
    }

    pub async fn registered_roles(&self) -> Result<HashSet<ChatRole>> {
        Ok(self
            .store
            .all_chats()
            .await?
            .into_iter()
            .map(|chat| chat.chat_type)
            .collect())
    }

    /// Register an unknown chat by its title.
    ///
    /// Returns the registration when the chat is (or already was) registered,
    /// `None` when the title matches no role. Only a fresh registration
    /// notifies the administrator.
    pub async fn discover(&self, peer_id: i64) -> Result<Option<ChatRegistration>> {
        if let Some(existing) = self.store.chat_by_peer(peer_id).await? {
            return Ok(Some(existing));
        }

        let Some(title) = self.gateway.chat_title(peer_id).await? else {
            warn!(peer_id = peer_id, "Chat title unavailable, cannot register chat");
            return Ok(None);
        };

        let Some(role) = ChatRole::from_title(&title) else {
            info!(peer_id = peer_id, title = %title, "Chat title matches no role");
            return Ok(None);
        };

        let roles_before = self.registered_roles().await?.len();
        let chat = self.store.save_chat(peer_id, role, &title).await?;
        log_chat_event(peer_id, "chat_registered", None, Some(chat.chat_type.as_str()));

        self.notify_admin(&format!(
            "✅ Чат \"{}\" (ID: {}) зарегистрирован как {}",
            chat.title, peer_id, chat.chat_type
        ))
        .await;

        let roles_after = self.registered_roles().await?.len();
        if roles_before < ChatRole::ALL.len() && roles_after == ChatRole::ALL.len() {
            self.notify_admin(&format!(
                "✅ Все {} чатов зарегистрированы! Бот готов к работе.",
                ChatRole::ALL.len()
            ))
            .await;
        }

        Ok(Some(chat))
    }

    async fn notify_admin(&self, text: &str) {
        if self.admin_user_id <= 0 {
            return;
        }
        if let Err(e) = self.gateway.send_message(self.admin_user_id, text, None).await {
            warn!(error = %e, "Failed to notify administrator");
        }
    }
}
