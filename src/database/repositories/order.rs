//! Order repository implementation
//!
//! Status changes are conditional updates so concurrent callers cannot both win.

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use crate::models::order::{NewOrder, Order, OrderItem, OrderStatus};
use crate::utils::errors::CourierHubError;

const ORDER_COLUMNS: &str = "id, client_vk_id, client_username, delivery_location, total_price, total_cost, \
    status, courier_vk_id, courier_username, estimated_time, acceptance_deadline, dispatch_message_id, \
    created_at, accepted_at, completed_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert order and items, then empty the client's cart and state, in one transaction
    pub async fn place(&self, order: &NewOrder) -> Result<Order, CourierHubError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO orders (client_vk_id, client_username, delivery_location, total_price, total_cost, \
             status, acceptance_deadline, created_at) \
             VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7) RETURNING {}",
            ORDER_COLUMNS
        );
        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(order.client_vk_id)
            .bind(&order.client_username)
            .bind(&order.delivery_location)
            .bind(order.total_price())
            .bind(order.total_cost())
            .bind(order.acceptance_deadline)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, product_name, product_nutrition,
                                         product_price, product_cost_price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#
            )
            .bind(created.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(&item.product_nutrition)
            .bind(item.product_price)
            .bind(item.product_cost_price)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart WHERE user_id = $1")
            .bind(order.client_vk_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM user_states WHERE user_id = $1")
            .bind(order.client_vk_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Order>, CourierHubError> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    pub async fn items(&self, order_id: i64) -> Result<Vec<OrderItem>, CourierHubError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, product_name, product_nutrition,
                   product_price, product_cost_price, quantity
            FROM order_items WHERE order_id = $1 ORDER BY id
            "#
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn active_for_client(&self, client_vk_id: i64, limit: i64) -> Result<Vec<Order>, CourierHubError> {
        let statuses: Vec<String> = OrderStatus::ACTIVE.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            "SELECT {} FROM orders WHERE client_vk_id = $1 AND status = ANY($2) ORDER BY created_at DESC, id DESC LIMIT $3",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(client_vk_id)
            .bind(statuses)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// First acceptance wins; the deadline is disarmed with the same statement
    pub async fn claim(&self, order_id: i64, courier_vk_id: i64, courier_username: &str, now: DateTime<Utc>) -> Result<bool, CourierHubError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'accepted', courier_vk_id = $2, courier_username = $3,
                accepted_at = $4, acceptance_deadline = NULL
            WHERE id = $1 AND status = 'pending'
            "#
        )
        .bind(order_id)
        .bind(courier_vk_id)
        .bind(courier_username)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn record_estimate(&self, order_id: i64, courier_vk_id: i64, estimate: &str) -> Result<bool, CourierHubError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET estimated_time = $3
            WHERE id = $1 AND courier_vk_id = $2 AND status IN ('accepted', 'preparing', 'delivering')
            "#
        )
        .bind(order_id)
        .bind(courier_vk_id)
        .bind(estimate)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn update_status(&self, order_id: i64, from: OrderStatus, to: OrderStatus, now: DateTime<Utc>) -> Result<bool, CourierHubError> {
        let completed_at = (to == OrderStatus::Completed).then_some(now);
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3,
                completed_at = COALESCE($4, completed_at),
                acceptance_deadline = CASE WHEN $3 = 'pending' THEN acceptance_deadline ELSE NULL END
            WHERE id = $1 AND status = $2
            "#
        )
        .bind(order_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(completed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn set_dispatch_message(&self, order_id: i64, message_id: Option<i64>) -> Result<(), CourierHubError> {
        sqlx::query("UPDATE orders SET dispatch_message_id = $2 WHERE id = $1")
            .bind(order_id)
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn arm_deadline(&self, order_id: i64, deadline: DateTime<Utc>) -> Result<bool, CourierHubError> {
        let result = sqlx::query(
            "UPDATE orders SET acceptance_deadline = $2 WHERE id = $1 AND status = 'pending'"
        )
        .bind(order_id)
        .bind(deadline)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn due_deadlines(&self, now: DateTime<Utc>) -> Result<Vec<Order>, CourierHubError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE status = 'pending' AND acceptance_deadline IS NOT NULL \
             AND acceptance_deadline <= $1 ORDER BY acceptance_deadline",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Disarm a due deadline; only one caller observes `true`
    pub async fn fire_deadline(&self, order_id: i64, now: DateTime<Utc>) -> Result<bool, CourierHubError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET acceptance_deadline = NULL
            WHERE id = $1 AND status = 'pending'
              AND acceptance_deadline IS NOT NULL AND acceptance_deadline <= $2
            "#
        )
        .bind(order_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn completed_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Order>, CourierHubError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE status = 'completed' AND completed_at >= $1 AND completed_at < $2 ORDER BY completed_at",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }
}
