//! Catalog and cart repository implementation

use sqlx::PgPool;
use crate::models::catalog::{CartLine, Category, CreateProductRequest, Product};
use crate::utils::errors::CourierHubError;

type CartRow = (i64, i64, String, Option<String>, i64, i64, i32);

#[derive(Clone)]
#[derive(Debug)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn categories(&self) -> Result<Vec<Category>, CourierHubError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY id"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn find_category(&self, id: i64) -> Result<Option<Category>, CourierHubError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category, CourierHubError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id, name, description"
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    /// Products and their cart lines go with the category via cascade
    pub async fn delete_category(&self, id: i64) -> Result<bool, CourierHubError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn products_by_category(&self, category_id: i64) -> Result<Vec<Product>, CourierHubError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, category_id, name, nutrition, price, cost_price FROM products WHERE category_id = $1 ORDER BY id"
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn find_product(&self, id: i64) -> Result<Option<Product>, CourierHubError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, category_id, name, nutrition, price, cost_price FROM products WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn all_products(&self) -> Result<Vec<Product>, CourierHubError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, category_id, name, nutrition, price, cost_price FROM products ORDER BY category_id, id"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn create_product(&self, request: &CreateProductRequest) -> Result<Product, CourierHubError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (category_id, name, nutrition, price, cost_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, category_id, name, nutrition, price, cost_price
            "#
        )
        .bind(request.category_id)
        .bind(&request.name)
        .bind(&request.nutrition)
        .bind(request.price)
        .bind(request.cost_price)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn delete_product(&self, id: i64) -> Result<bool, CourierHubError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>, CourierHubError> {
        let rows = sqlx::query_as::<_, CartRow>(
            r#"
            SELECT p.id, p.category_id, p.name, p.nutrition, p.price, p.cost_price, c.quantity
            FROM cart c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.id
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, category_id, name, nutrition, price, cost_price, quantity)| CartLine {
                product: Product { id, category_id, name, nutrition, price, cost_price },
                quantity,
            })
            .collect())
    }

    /// Repeated adds accumulate on one line
    pub async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<(), CourierHubError> {
        sqlx::query(
            r#"
            INSERT INTO cart (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart.quantity + EXCLUDED.quantity
            "#
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> Result<bool, CourierHubError> {
        let result = sqlx::query("DELETE FROM cart WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn clear_cart(&self, user_id: i64) -> Result<(), CourierHubError> {
        sqlx::query("DELETE FROM cart WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
