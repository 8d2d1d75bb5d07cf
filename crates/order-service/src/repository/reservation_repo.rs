//! 下单事务仓储（PostgreSQL）
//!
//! 订单写入与库存扣减在同一个数据库事务中完成。
//!
//! ## 并发控制
//!
//! - RowLock：`SELECT ... FOR UPDATE` 锁定活动行，并发事务排队，`lock_timeout` 限制等待时间
//! - Optimistic：普通读取，扣减时以旧值做条件更新，行数为 0 即冲突
//!
//! 两种策略都使用条件更新，行锁策略下条件恒成立。

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::traits::{ReservationRepositoryTrait, ReservationTransaction};
use crate::IsolationStrategy;
use crate::error::StoreResult;
use crate::models::{EventInventory, Order};

/// 下单事务仓储
pub struct ReservationRepository {
    pool: PgPool,
    /// 行锁等待上限（毫秒），0 表示不设置
    lock_timeout_ms: u64,
}

impl ReservationRepository {
    pub fn new(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }
}

#[async_trait]
impl ReservationRepositoryTrait for ReservationRepository {
    async fn begin(&self) -> StoreResult<Box<dyn ReservationTransaction>> {
        let mut tx = self.pool.begin().await?;

        if self.lock_timeout_ms > 0 {
            // SET LOCAL 不支持参数绑定，值来自配置的整数
            let sql = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms);
            sqlx::query(&sql).execute(&mut *tx).await?;
        }

        Ok(Box::new(PgReservationTransaction { tx }))
    }
}

/// PostgreSQL 下单事务
///
/// sqlx 的 Transaction 在 drop 时自动回滚，调用方取消或超时都不会留下部分写入
pub struct PgReservationTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ReservationTransaction for PgReservationTransaction {
    async fn get_event_for_update(
        &mut self,
        event_id: Uuid,
        strategy: IsolationStrategy,
    ) -> StoreResult<Option<EventInventory>> {
        let sql = match strategy {
            IsolationStrategy::RowLock => {
                r#"
                SELECT id, title, ticket_price, available_tickets, total_tickets, status
                FROM events
                WHERE id = $1
                FOR UPDATE
                "#
            }
            IsolationStrategy::Optimistic => {
                r#"
                SELECT id, title, ticket_price, available_tickets, total_tickets, status
                FROM events
                WHERE id = $1
                "#
            }
        };

        let event = sqlx::query_as::<_, EventInventory>(sql)
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(event)
    }

    async fn decrement_available(
        &mut self,
        event_id: Uuid,
        expected: i32,
        new_available: i32,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET available_tickets = $3, updated_at = NOW()
            WHERE id = $1 AND available_tickets = $2
            "#,
        )
        .bind(event_id)
        .bind(expected)
        .bind(new_available)
        .execute(&mut *self.tx)
        .await?;

        let applied = result.rows_affected() == 1;
        if !applied {
            debug!(event_id = %event_id, expected, "available_tickets 已被并发修改");
        }

        Ok(applied)
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_id, event_id, quantity, total_amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id)
        .bind(order.buyer_id)
        .bind(order.event_id)
        .bind(order.quantity)
        .bind(order.total_amount)
        .bind(order.status)
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
