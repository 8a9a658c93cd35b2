//! Order operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewOrder, Order, OrderStatus, PizzaSize};

use super::Database;

impl Database {
    /// Create a new order
    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO orders (quantity, order_status, pizza_size, user_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(order.quantity)
        .bind(order.order_status.as_str())
        .bind(order.pizza_size.as_str())
        .bind(order.user_id)
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(Order {
            id: result.get("id"),
            quantity: order.quantity,
            order_status: order.order_status,
            pizza_size: order.pizza_size,
            user_id: order.user_id,
            created_at: now,
        })
    }

    /// Get an order by ID regardless of owner
    pub async fn get_order(&self, id: i64) -> Result<Option<Order>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, quantity, order_status, pizza_size, user_id, created_at
            FROM orders
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Order::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get an order by ID, only if it belongs to `user_id`
    pub async fn get_order_for_user(&self, id: i64, user_id: i64) -> Result<Option<Order>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, quantity, order_status, pizza_size, user_id, created_at
            FROM orders
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Order::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List every order
    pub async fn list_orders(&self) -> Result<Vec<Order>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, quantity, order_status, pizza_size, user_id, created_at
            FROM orders
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Order::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// List the orders placed by one user
    pub async fn list_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, quantity, order_status, pizza_size, user_id, created_at
            FROM orders
            WHERE user_id = ?
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Order::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Update quantity and size of an order owned by `user_id`
    pub async fn update_order_details(
        &self,
        id: i64,
        user_id: i64,
        quantity: i64,
        pizza_size: PizzaSize,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET quantity = ?, pizza_size = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(quantity)
        .bind(pizza_size.as_str())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the status of any order
    pub async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET order_status = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an order owned by `user_id`
    pub async fn delete_order_for_user(&self, id: i64, user_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
