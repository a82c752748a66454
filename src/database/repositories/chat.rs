//! Chat registration repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::chat::{ChatRegistration, ChatRole};
use crate::utils::errors::CourierHubError;

#[derive(Clone)]
#[derive(Debug)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_peer(&self, peer_id: i64) -> Result<Option<ChatRegistration>, CourierHubError> {
        let chat = sqlx::query_as::<_, ChatRegistration>(
            "SELECT peer_id, chat_type, title, created_at FROM chats WHERE peer_id = $1"
        )
        .bind(peer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    /// Oldest chat registered for the role
    pub async fn find_by_role(&self, role: ChatRole) -> Result<Option<ChatRegistration>, CourierHubError> {
        let chat = sqlx::query_as::<_, ChatRegistration>(
            "SELECT peer_id, chat_type, title, created_at FROM chats WHERE chat_type = $1 ORDER BY created_at LIMIT 1"
        )
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    /// Register a chat; an existing row for the peer wins
    pub async fn save(&self, peer_id: i64, role: ChatRole, title: &str) -> Result<ChatRegistration, CourierHubError> {
        sqlx::query(
            r#"
            INSERT INTO chats (peer_id, chat_type, title, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (peer_id) DO NOTHING
            "#
        )
        .bind(peer_id)
        .bind(role.as_str())
        .bind(title)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let chat = sqlx::query_as::<_, ChatRegistration>(
            "SELECT peer_id, chat_type, title, created_at FROM chats WHERE peer_id = $1"
        )
        .bind(peer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(chat)
    }

    pub async fn all(&self) -> Result<Vec<ChatRegistration>, CourierHubError> {
        let chats = sqlx::query_as::<_, ChatRegistration>(
            "SELECT peer_id, chat_type, title, created_at FROM chats ORDER BY created_at"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(chats)
    }
}
