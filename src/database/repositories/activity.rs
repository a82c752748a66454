//! Staff presence and daily statistics repository

use sqlx::{PgPool, Postgres, Transaction};
use chrono::{DateTime, Duration, Utc};
use crate::models::activity::{Presence, PresenceStatus, StaffStats};
use crate::utils::errors::CourierHubError;

#[derive(Clone)]
#[derive(Debug)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record_message(&self, vk_id: i64, username: &str, now: DateTime<Utc>) -> Result<(), CourierHubError> {
        let mut tx = self.pool.begin().await?;
        Self::touch(&mut tx, vk_id, username, PresenceStatus::Online, now, 1).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn set_presence(&self, vk_id: i64, username: &str, status: PresenceStatus, now: DateTime<Utc>) -> Result<(), CourierHubError> {
        let mut tx = self.pool.begin().await?;
        Self::touch(&mut tx, vk_id, username, status, now, 0).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Refresh presence and credit online time and messages to today's row
    async fn touch(
        tx: &mut Transaction<'_, Postgres>,
        vk_id: i64,
        username: &str,
        status: PresenceStatus,
        now: DateTime<Utc>,
        messages: i64,
    ) -> Result<(), CourierHubError> {
        let previous = sqlx::query_as::<_, Presence>(
            "SELECT vk_id, username, status, last_activity, online_minutes FROM online_activity WHERE vk_id = $1 FOR UPDATE"
        )
        .bind(vk_id)
        .fetch_optional(&mut **tx)
        .await?;

        let credited = previous.as_ref().map(|p| p.credited_minutes(now)).unwrap_or(0);

        sqlx::query(
            r#"
            INSERT INTO online_activity (vk_id, username, status, last_activity, online_minutes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (vk_id) DO UPDATE
            SET username = EXCLUDED.username, status = EXCLUDED.status,
                last_activity = EXCLUDED.last_activity,
                online_minutes = online_activity.online_minutes + EXCLUDED.online_minutes
            "#
        )
        .bind(vk_id)
        .bind(username)
        .bind(status.as_str())
        .bind(now)
        .bind(credited)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO daily_stats (vk_id, date, username, messages_count, online_minutes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (vk_id, date) DO UPDATE
            SET messages_count = daily_stats.messages_count + EXCLUDED.messages_count,
                online_minutes = daily_stats.online_minutes + EXCLUDED.online_minutes
            "#
        )
        .bind(vk_id)
        .bind(now.date_naive())
        .bind(username)
        .bind(messages)
        .bind(credited)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn online_since(&self, since: DateTime<Utc>) -> Result<Vec<Presence>, CourierHubError> {
        let presence = sqlx::query_as::<_, Presence>(
            r#"
            SELECT vk_id, username, status, last_activity, online_minutes
            FROM online_activity
            WHERE status IN ('online', 'afk') AND last_activity >= $1
            ORDER BY username
            "#
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(presence)
    }

    /// Today and the trailing seven days including today
    pub async fn stats(&self, vk_id: i64, now: DateTime<Utc>) -> Result<StaffStats, CourierHubError> {
        let today = now.date_naive();
        let week_from = today - Duration::days(6);

        let (messages_today, messages_week, online_minutes_today, online_minutes_week): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COALESCE(SUM(messages_count) FILTER (WHERE date = $2), 0)::BIGINT,
                       COALESCE(SUM(messages_count), 0)::BIGINT,
                       COALESCE(SUM(online_minutes) FILTER (WHERE date = $2), 0)::BIGINT,
                       COALESCE(SUM(online_minutes), 0)::BIGINT
                FROM daily_stats
                WHERE vk_id = $1 AND date >= $3
                "#
            )
            .bind(vk_id)
            .bind(today)
            .bind(week_from)
            .fetch_one(&self.pool)
            .await?;

        let (orders_accepted_week,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders WHERE courier_vk_id = $1 AND accepted_at >= $2"
        )
        .bind(vk_id)
        .bind(now - Duration::days(7))
        .fetch_one(&self.pool)
        .await?;

        Ok(StaffStats {
            messages_today,
            messages_week,
            online_minutes_today,
            online_minutes_week,
            orders_accepted_week,
        })
    }
}
