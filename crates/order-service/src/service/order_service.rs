//! 下单事务协调器
//!
//! ## 核心流程
//!
//! 1. 校验数量（不开事务）
//! 2. 开启事务 -> 读取活动（按策略加锁）-> 校验状态与余票
//! 3. 计算金额 -> 写入 PENDING 订单 -> 条件扣减余票
//! 4. 提交；任何一步失败都回滚
//!
//! ## 并发控制
//!
//! 协调器本身不持有共享可变状态，并发正确性完全依赖存储事务：
//! - RowLock：同一活动的事务在行锁上排队，拿到锁后读到的一定是最新余票
//! - Optimistic：条件扣减失败即冲突，整个事务体有界重试
//!
//! 每次尝试受 `transaction_timeout` 约束。超时或调用方放弃等待时，
//! 进行中的事务随 future 一起被 drop，由存储层回滚并释放行锁。

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use ticketing_shared::config::OrderConfig;
use ticketing_shared::observability::metrics;
use ticketing_shared::retry::{RetryPolicy, retry_with_policy};

use crate::IsolationStrategy;
use crate::error::{OrderError, Result, StoreError};
use crate::models::{Event, Order, OrderStatus};
use crate::repository::{
    EventRepositoryTrait, OrderRepositoryTrait, ReservationRepositoryTrait, ReservationTransaction,
};

/// 下单事务协调器
pub struct OrderService {
    reservations: Arc<dyn ReservationRepositoryTrait>,
    orders: Arc<dyn OrderRepositoryTrait>,
    events: Arc<dyn EventRepositoryTrait>,
    isolation: IsolationStrategy,
    retry_policy: RetryPolicy,
    transaction_timeout: Duration,
}

impl OrderService {
    pub fn new(
        reservations: Arc<dyn ReservationRepositoryTrait>,
        orders: Arc<dyn OrderRepositoryTrait>,
        events: Arc<dyn EventRepositoryTrait>,
        config: &OrderConfig,
    ) -> Self {
        Self {
            reservations,
            orders,
            events,
            isolation: config.isolation,
            retry_policy: RetryPolicy::from_order_config(config),
            transaction_timeout: config.transaction_timeout(),
        }
    }

    /// 当前使用的并发控制策略
    pub fn isolation(&self) -> IsolationStrategy {
        self.isolation
    }

    // ==================== 下单 ====================

    /// 创建订单
    ///
    /// 成功时恰好新增一条 PENDING 订单，活动余票恰好减少 quantity；
    /// 失败时两者都不发生。
    #[instrument(
        skip(self),
        fields(buyer_id = %buyer_id, event_id = %event_id, quantity, isolation = ?self.isolation)
    )]
    pub async fn create_order(&self, buyer_id: Uuid, event_id: Uuid, quantity: i32) -> Result<Order> {
        if quantity <= 0 {
            warn!("订单数量无效，拒绝下单");
            metrics::record_order("invalid_quantity", 0.0);
            return Err(OrderError::InvalidQuantity(quantity));
        }

        let start = Instant::now();
        let result = retry_with_policy(
            &self.retry_policy,
            "create_order",
            OrderError::is_retryable,
            || self.attempt(buyer_id, event_id, quantity),
        )
        .await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(order) => {
                metrics::record_order("created", elapsed);
                metrics::record_tickets_reserved(quantity as u64);
                info!(
                    order_id = %order.id,
                    total_amount = %order.total_amount,
                    "订单创建成功"
                );
            }
            Err(e) if e.is_business_error() => {
                metrics::record_order(&e.error_code().to_ascii_lowercase(), elapsed);
                warn!(error = %e, code = e.error_code(), "下单被拒绝");
            }
            Err(e) => {
                metrics::record_order(&e.error_code().to_ascii_lowercase(), elapsed);
                error!(error = %e, source = ?std::error::Error::source(e), "下单失败");
            }
        }

        result
    }

    /// 单次事务尝试，超时即放弃并回滚
    async fn attempt(&self, buyer_id: Uuid, event_id: Uuid, quantity: i32) -> Result<Order> {
        let outcome = tokio::time::timeout(
            self.transaction_timeout,
            self.run_transaction(buyer_id, event_id, quantity),
        )
        .await;

        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_ms = self.transaction_timeout.as_millis() as u64,
                    "下单事务超时，已回滚"
                );
                Err(OrderError::OrderCreationFailed(StoreError::Timeout(
                    self.transaction_timeout,
                )))
            }
        };

        if matches!(&result, Err(e) if e.is_retryable()) {
            metrics::record_order_conflict();
        }

        result
    }

    /// 开启事务并执行事务体，成功提交，失败回滚
    async fn run_transaction(&self, buyer_id: Uuid, event_id: Uuid, quantity: i32) -> Result<Order> {
        let mut tx = self
            .reservations
            .begin()
            .await
            .map_err(OrderError::OrderCreationFailed)?;

        match self.reserve(tx.as_mut(), buyer_id, event_id, quantity).await {
            Ok(order) => {
                tx.commit().await.map_err(OrderError::OrderCreationFailed)?;
                Ok(order)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "事务回滚失败，连接关闭时由数据库回滚");
                }
                Err(e)
            }
        }
    }

    /// 事务体
    async fn reserve(
        &self,
        tx: &mut dyn ReservationTransaction,
        buyer_id: Uuid,
        event_id: Uuid,
        quantity: i32,
    ) -> Result<Order> {
        // 必须读权威存储，不能经过任何缓存
        let event = tx
            .get_event_for_update(event_id, self.isolation)
            .await
            .map_err(OrderError::OrderCreationFailed)?
            .ok_or(OrderError::EventNotFound(event_id))?;

        event.ensure_reservable(quantity)?;

        let order = Order::pending(buyer_id, event_id, quantity, event.total_for(quantity));

        tx.insert_order(&order)
            .await
            .map_err(OrderError::OrderCreationFailed)?;

        let remaining = event.available_tickets - quantity;
        let applied = tx
            .decrement_available(event_id, event.available_tickets, remaining)
            .await
            .map_err(OrderError::OrderCreationFailed)?;

        if !applied {
            return Err(OrderError::OrderCreationFailed(StoreError::Conflict(
                format!(
                    "event {} available_tickets changed from {}",
                    event_id, event.available_tickets
                ),
            )));
        }

        Ok(order)
    }

    // ==================== 查询 ====================

    /// 根据 ID 获取订单
    pub async fn get_order(&self, id: Uuid) -> Result<Order> {
        self.orders
            .get_order(id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))
    }

    /// 购买者的全部订单
    pub async fn list_orders_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>> {
        Ok(self.orders.list_orders_by_buyer(buyer_id).await?)
    }

    /// 活动的全部订单
    pub async fn list_orders_by_event(&self, event_id: Uuid) -> Result<Vec<Order>> {
        Ok(self.orders.list_orders_by_event(event_id).await?)
    }

    /// 读取活动（展示路径，可被上层缓存）
    pub async fn get_event(&self, id: Uuid) -> Result<Event> {
        self.events
            .get_event(id)
            .await?
            .ok_or(OrderError::EventNotFound(id))
    }

    // ==================== 订单维护 ====================

    /// 更新订单状态
    ///
    /// 只修改订单本身，不涉及库存
    #[instrument(skip(self))]
    pub async fn update_order_status(&self, id: Uuid, status: &str) -> Result<Order> {
        let status: OrderStatus = status.parse().map_err(OrderError::Validation)?;

        let order = self
            .orders
            .update_order_status(id, status)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;

        info!(order_id = %id, status = %status, "订单状态已更新");
        Ok(order)
    }

    /// 删除订单
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: Uuid) -> Result<()> {
        if !self.orders.delete_order(id).await? {
            return Err(OrderError::OrderNotFound(id));
        }

        info!(order_id = %id, "订单已删除");
        Ok(())
    }
}
