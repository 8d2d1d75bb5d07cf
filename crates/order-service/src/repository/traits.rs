//! 仓储 Trait 定义
//!
//! 定义存储接口，协调器依赖抽象而非具体实现，支持 mock 与内存实现测试

use async_trait::async_trait;
use uuid::Uuid;

use crate::IsolationStrategy;
use crate::error::StoreResult;
use crate::models::{Event, EventInventory, Order, OrderStatus};

/// 下单事务入口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationRepositoryTrait: Send + Sync {
    /// 开启一个事务
    async fn begin(&self) -> StoreResult<Box<dyn ReservationTransaction>>;
}

/// 一个进行中的下单事务
///
/// 未 commit 就被 drop 的事务必须回滚并释放持有的行锁
#[async_trait]
pub trait ReservationTransaction: Send {
    /// 读取活动库存
    ///
    /// RowLock 策略下锁定该行直到事务结束；Optimistic 策略下为普通读取
    async fn get_event_for_update(
        &mut self,
        event_id: Uuid,
        strategy: IsolationStrategy,
    ) -> StoreResult<Option<EventInventory>>;

    /// 条件扣减：仅当 available_tickets 仍为 expected 时写入 new_available
    ///
    /// 返回 false 表示库存已被并发修改
    async fn decrement_available(
        &mut self,
        event_id: Uuid,
        expected: i32,
        new_available: i32,
    ) -> StoreResult<bool>;

    /// 写入订单
    async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// 订单仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepositoryTrait: Send + Sync {
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn list_orders_by_buyer(&self, buyer_id: Uuid) -> StoreResult<Vec<Order>>;
    async fn list_orders_by_event(&self, event_id: Uuid) -> StoreResult<Vec<Order>>;
    /// 返回更新后的订单，不存在时返回 None
    async fn update_order_status(&self, id: Uuid, status: OrderStatus)
    -> StoreResult<Option<Order>>;
    /// 返回是否删除了记录
    async fn delete_order(&self, id: Uuid) -> StoreResult<bool>;
}

/// 活动只读仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepositoryTrait: Send + Sync {
    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>>;
}
