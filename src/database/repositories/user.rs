//! User and employee repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use crate::models::user::{Employee, Role, User};
use crate::utils::errors::CourierHubError;

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find user by VK ID
    pub async fn find_by_vk_id(&self, vk_id: i64) -> Result<Option<User>, CourierHubError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT vk_id, username, role, blacklisted_until, created_at FROM users WHERE vk_id = $1"
        )
        .bind(vk_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Create a client if missing; a known user keeps its role and name
    pub async fn create_if_missing(&self, vk_id: i64, username: &str) -> Result<User, CourierHubError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (vk_id, username, role, created_at)
            VALUES ($1, $2, 'client', $3)
            ON CONFLICT (vk_id) DO UPDATE
            SET username = CASE WHEN users.username = '' THEN EXCLUDED.username ELSE users.username END
            RETURNING vk_id, username, role, blacklisted_until, created_at
            "#
        )
        .bind(vk_id)
        .bind(username)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Set or lift the blacklist expiry
    pub async fn set_blacklist(&self, vk_id: i64, until: Option<DateTime<Utc>>) -> Result<(), CourierHubError> {
        sqlx::query(
            r#"
            INSERT INTO users (vk_id, username, role, blacklisted_until, created_at)
            VALUES ($1, '', 'client', $2, $3)
            ON CONFLICT (vk_id) DO UPDATE SET blacklisted_until = EXCLUDED.blacklisted_until
            "#
        )
        .bind(vk_id)
        .bind(until)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find employee by VK ID
    pub async fn find_employee(&self, vk_id: i64) -> Result<Option<Employee>, CourierHubError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT vk_id, username, role, created_at FROM employees WHERE vk_id = $1"
        )
        .bind(vk_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Hire or re-role an employee, keeping the users table in sync
    pub async fn upsert_employee(&self, vk_id: i64, username: &str, role: Role) -> Result<Employee, CourierHubError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (vk_id, username, role, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (vk_id) DO UPDATE SET username = EXCLUDED.username, role = EXCLUDED.role
            RETURNING vk_id, username, role, created_at
            "#
        )
        .bind(vk_id)
        .bind(username)
        .bind(role.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO users (vk_id, username, role, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (vk_id) DO UPDATE SET role = EXCLUDED.role
            "#
        )
        .bind(vk_id)
        .bind(username)
        .bind(role.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(employee)
    }

    /// Employees holding any of the given roles
    pub async fn employees_by_roles(&self, roles: &[Role]) -> Result<Vec<Employee>, CourierHubError> {
        let roles: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT vk_id, username, role, created_at FROM employees WHERE role = ANY($1) ORDER BY username"
        )
        .bind(roles)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }
}
