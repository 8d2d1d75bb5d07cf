//! 订单仓储
//!
//! 订单的查询、状态变更与删除。订单的写入只发生在下单事务中，见 `reservation_repo`。

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::OrderRepositoryTrait;
use crate::error::StoreResult;
use crate::models::{Order, OrderStatus};

/// 订单仓储
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 根据 ID 获取订单
    pub async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, buyer_id, event_id, quantity, total_amount, status, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// 列出购买者的订单，最新的在前
    pub async fn list_orders_by_buyer(&self, buyer_id: Uuid) -> StoreResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, buyer_id, event_id, quantity, total_amount, status, created_at
            FROM orders
            WHERE buyer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// 列出活动的订单，最新的在前
    pub async fn list_orders_by_event(&self, event_id: Uuid) -> StoreResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, buyer_id, event_id, quantity, total_amount, status, created_at
            FROM orders
            WHERE event_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    // ==================== 写操作 ====================

    /// 更新订单状态，不涉及库存
    pub async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2
            WHERE id = $1
            RETURNING id, buyer_id, event_id, quantity, total_amount, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// 删除订单，不回补库存
    pub async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepositoryTrait for OrderRepository {
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        self.get_order(id).await
    }

    async fn list_orders_by_buyer(&self, buyer_id: Uuid) -> StoreResult<Vec<Order>> {
        self.list_orders_by_buyer(buyer_id).await
    }

    async fn list_orders_by_event(&self, event_id: Uuid) -> StoreResult<Vec<Order>> {
        self.list_orders_by_event(event_id).await
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        self.update_order_status(id, status).await
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_order(id).await
    }
}
