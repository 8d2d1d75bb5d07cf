//! 内存存储
//!
//! 使用 DashMap 与按活动划分的异步互斥锁实现的事务型存储，语义对齐 PostgreSQL 实现：
//!
//! - 行锁由事务持有，直到 commit、rollback 或 drop
//! - Optimistic 读取不持锁，条件扣减时取锁（与 UPDATE 的行锁行为一致）
//! - 写入先暂存在事务内，commit 时在持有行锁的情况下一次性生效
//!
//! 适用于测试和本地开发，另提供故障注入以验证事务原子性。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use super::traits::{
    EventRepositoryTrait, OrderRepositoryTrait, ReservationRepositoryTrait, ReservationTransaction,
};
use crate::IsolationStrategy;
use crate::error::{StoreError, StoreResult};
use crate::models::{Event, EventInventory, Order, OrderStatus};

/// 注入的故障，每项只生效一次（conflicts 按次数递减）
#[derive(Debug, Default)]
struct Faults {
    fail_begin: bool,
    fail_insert: bool,
    fail_decrement: bool,
    fail_commit: bool,
    conflicts: u32,
}

#[derive(Default)]
struct Inner {
    events: DashMap<Uuid, Arc<AsyncMutex<Event>>>,
    orders: DashMap<Uuid, Order>,
    faults: Mutex<Faults>,
}

/// 内存事务存储
///
/// 同时实现下单事务、订单查询和活动读取三个仓储接口，Clone 后共享同一份数据。
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    /// 创建新的内存存储实例
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 数据准备 ====================

    /// 写入或覆盖活动
    pub fn insert_event(&self, event: Event) {
        self.inner
            .events
            .insert(event.id, Arc::new(AsyncMutex::new(event)));
    }

    /// 读取活动当前值，若该行被事务锁定则等待
    pub async fn event_snapshot(&self, id: Uuid) -> Option<Event> {
        let row = self.row(id)?;
        let guard = row.lock().await;
        Some(guard.clone())
    }

    /// 活动的已提交订单
    pub fn orders_for_event(&self, event_id: Uuid) -> Vec<Order> {
        self.inner
            .orders
            .iter()
            .filter(|entry| entry.value().event_id == event_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// 已提交订单总数
    pub fn order_count(&self) -> usize {
        self.inner.orders.len()
    }

    /// 模拟另一个事务持有活动行锁，guard 释放前该行的锁定读取会阻塞
    pub async fn lock_event(&self, id: Uuid) -> Option<OwnedMutexGuard<Event>> {
        let row = self.row(id)?;
        Some(row.lock_owned().await)
    }

    // ==================== 故障注入 ====================

    /// 下一次 begin 失败
    pub fn fail_next_begin(&self) {
        self.inner.faults.lock().fail_begin = true;
    }

    /// 下一次订单写入失败
    pub fn fail_next_insert(&self) {
        self.inner.faults.lock().fail_insert = true;
    }

    /// 下一次库存扣减失败
    pub fn fail_next_decrement(&self) {
        self.inner.faults.lock().fail_decrement = true;
    }

    /// 下一次提交失败
    pub fn fail_next_commit(&self) {
        self.inner.faults.lock().fail_commit = true;
    }

    /// 接下来 n 次条件扣减报告并发冲突
    pub fn force_conflicts(&self, n: u32) {
        self.inner.faults.lock().conflicts = n;
    }

    fn row(&self, id: Uuid) -> Option<Arc<AsyncMutex<Event>>> {
        // 克隆 Arc 后立即释放 DashMap 分片锁，不能跨 await 持有
        self.inner.events.get(&id).map(|entry| entry.value().clone())
    }

    fn take_fault(&self, pick: impl FnOnce(&mut Faults) -> bool) -> bool {
        pick(&mut self.inner.faults.lock())
    }
}

// ==================== 下单事务 ====================

#[async_trait]
impl ReservationRepositoryTrait for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn ReservationTransaction>> {
        if self.take_fault(|f| std::mem::take(&mut f.fail_begin)) {
            return Err(StoreError::Unavailable("injected begin failure".to_string()));
        }

        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            locks: HashMap::new(),
            pending_orders: Vec::new(),
            pending_available: HashMap::new(),
        }))
    }
}

/// 内存事务
///
/// drop 时释放所有行锁并丢弃暂存写入，等同于回滚
struct MemoryTransaction {
    store: InMemoryStore,
    locks: HashMap<Uuid, OwnedMutexGuard<Event>>,
    pending_orders: Vec<Order>,
    pending_available: HashMap<Uuid, i32>,
}

impl MemoryTransaction {
    /// 获取（或复用已持有的）行锁
    async fn lock_row(&mut self, event_id: Uuid) -> Option<&mut OwnedMutexGuard<Event>> {
        if !self.locks.contains_key(&event_id) {
            let row = self.store.row(event_id)?;
            let guard = row.lock_owned().await;
            self.locks.insert(event_id, guard);
        }
        self.locks.get_mut(&event_id)
    }
}

#[async_trait]
impl ReservationTransaction for MemoryTransaction {
    async fn get_event_for_update(
        &mut self,
        event_id: Uuid,
        strategy: IsolationStrategy,
    ) -> StoreResult<Option<EventInventory>> {
        let mut inventory = match strategy {
            IsolationStrategy::RowLock => match self.lock_row(event_id).await {
                Some(guard) => guard.inventory(),
                None => return Ok(None),
            },
            IsolationStrategy::Optimistic => match self.locks.get(&event_id) {
                Some(guard) => guard.inventory(),
                None => match self.store.row(event_id) {
                    Some(row) => {
                        let guard = row.lock().await;
                        guard.inventory()
                    }
                    None => return Ok(None),
                },
            },
        };

        // 本事务已暂存的扣减对自己可见
        if let Some(pending) = self.pending_available.get(&event_id) {
            inventory.available_tickets = *pending;
        }

        Ok(Some(inventory))
    }

    async fn decrement_available(
        &mut self,
        event_id: Uuid,
        expected: i32,
        new_available: i32,
    ) -> StoreResult<bool> {
        if self.store.take_fault(|f| std::mem::take(&mut f.fail_decrement)) {
            return Err(StoreError::Unavailable(
                "injected decrement failure".to_string(),
            ));
        }
        if self.store.take_fault(|f| {
            if f.conflicts > 0 {
                f.conflicts -= 1;
                true
            } else {
                false
            }
        }) {
            return Ok(false);
        }
        if new_available < 0 {
            return Err(StoreError::Unavailable(format!(
                "check constraint violated: available_tickets = {}",
                new_available
            )));
        }

        let current = match self.lock_row(event_id).await {
            Some(guard) => guard.available_tickets,
            None => return Ok(false),
        };
        let current = self.pending_available.get(&event_id).copied().unwrap_or(current);

        if current != expected {
            return Ok(false);
        }

        self.pending_available.insert(event_id, new_available);
        Ok(true)
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        if self.store.take_fault(|f| std::mem::take(&mut f.fail_insert)) {
            return Err(StoreError::Unavailable("injected insert failure".to_string()));
        }
        if self.store.row(order.event_id).is_none() {
            return Err(StoreError::Unavailable(format!(
                "foreign key violated: event {} does not exist",
                order.event_id
            )));
        }

        self.pending_orders.push(order.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        if self.store.take_fault(|f| std::mem::take(&mut f.fail_commit)) {
            return Err(StoreError::Unavailable("injected commit failure".to_string()));
        }

        let MemoryTransaction {
            store,
            mut locks,
            pending_orders,
            pending_available,
        } = *self;

        // 扣减只会发生在本事务已持有行锁的行上
        for (event_id, available) in pending_available {
            if let Some(guard) = locks.get_mut(&event_id) {
                guard.available_tickets = available;
                guard.updated_at = Utc::now();
            }
        }

        for order in pending_orders {
            store.inner.orders.insert(order.id, order);
        }

        // 订单可见后才释放行锁
        drop(locks);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

// ==================== 查询仓储 ====================

#[async_trait]
impl OrderRepositoryTrait for InMemoryStore {
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.inner.orders.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_orders_by_buyer(&self, buyer_id: Uuid) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .inner
            .orders
            .iter()
            .filter(|entry| entry.value().buyer_id == buyer_id)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn list_orders_by_event(&self, event_id: Uuid) -> StoreResult<Vec<Order>> {
        let mut orders = self.orders_for_event(event_id);
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        Ok(self.inner.orders.get_mut(&id).map(|mut entry| {
            entry.status = status;
            entry.clone()
        }))
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl EventRepositoryTrait for InMemoryStore {
    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.event_snapshot(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::models::EventStatus;

    fn event(available: i32) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: "Jazz Night".to_string(),
            description: None,
            event_date: now,
            ticket_price: Decimal::new(1000, 2),
            available_tickets: available,
            total_tickets: 10,
            status: EventStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let store = InMemoryStore::new();
        let ev = event(10);
        let event_id = ev.id;
        store.insert_event(ev);

        let mut tx = store.begin().await.unwrap();
        tx.get_event_for_update(event_id, IsolationStrategy::RowLock)
            .await
            .unwrap();
        let order = Order::pending(Uuid::new_v4(), event_id, 2, Decimal::new(2000, 2));
        tx.insert_order(&order).await.unwrap();
        assert!(tx.decrement_available(event_id, 10, 8).await.unwrap());
        drop(tx);

        assert_eq!(store.order_count(), 0);
        assert_eq!(store.event_snapshot(event_id).await.unwrap().available_tickets, 10);
    }

    #[tokio::test]
    async fn test_commit_applies_both_writes() {
        let store = InMemoryStore::new();
        let ev = event(10);
        let event_id = ev.id;
        store.insert_event(ev);

        let mut tx = store.begin().await.unwrap();
        tx.get_event_for_update(event_id, IsolationStrategy::Optimistic)
            .await
            .unwrap();
        let order = Order::pending(Uuid::new_v4(), event_id, 2, Decimal::new(2000, 2));
        tx.insert_order(&order).await.unwrap();
        assert!(tx.decrement_available(event_id, 10, 8).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(store.order_count(), 1);
        assert_eq!(store.event_snapshot(event_id).await.unwrap().available_tickets, 8);
    }

    #[tokio::test]
    async fn test_stale_expected_value_is_a_conflict() {
        let store = InMemoryStore::new();
        let ev = event(10);
        let event_id = ev.id;
        store.insert_event(ev);

        let mut tx = store.begin().await.unwrap();
        assert!(!tx.decrement_available(event_id, 9, 8).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_event_reads_as_none() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let found = tx
            .get_event_for_update(Uuid::new_v4(), IsolationStrategy::RowLock)
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
