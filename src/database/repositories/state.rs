//! Conversation state repository implementation

use sqlx::{FromRow, PgPool};
use sqlx::types::Json;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use crate::state::ConversationState;
use crate::utils::errors::CourierHubError;

#[derive(FromRow)]
struct StateRow {
    user_id: i64,
    state: String,
    data: Json<Map<String, Value>>,
    updated_at: DateTime<Utc>,
}

impl From<StateRow> for ConversationState {
    fn from(row: StateRow) -> Self {
        Self {
            user_id: row.user_id,
            state: row.state,
            data: row.data.0,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
#[derive(Debug)]
pub struct StateRepository {
    pool: PgPool,
}

impl StateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: i64) -> Result<Option<ConversationState>, CourierHubError> {
        let row = sqlx::query_as::<_, StateRow>(
            "SELECT user_id, state, data, updated_at FROM user_states WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ConversationState::from))
    }

    /// Overwrite the user's state
    pub async fn upsert(&self, state: &ConversationState) -> Result<(), CourierHubError> {
        sqlx::query(
            r#"
            INSERT INTO user_states (user_id, state, data, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET state = EXCLUDED.state, data = EXCLUDED.data, updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(state.user_id)
        .bind(&state.state)
        .bind(Json(state.data.clone()))
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, user_id: i64) -> Result<(), CourierHubError> {
        sqlx::query("DELETE FROM user_states WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
