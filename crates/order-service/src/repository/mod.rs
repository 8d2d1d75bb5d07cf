//! 存储层
//!
//! PostgreSQL 实现用于生产，`InMemoryStore` 用于测试与本地开发。

mod event_repo;
mod memory;
mod order_repo;
mod reservation_repo;
mod traits;

pub use event_repo::EventRepository;
pub use memory::InMemoryStore;
pub use order_repo::OrderRepository;
pub use reservation_repo::{PgReservationTransaction, ReservationRepository};
pub use traits::{
    EventRepositoryTrait, OrderRepositoryTrait, ReservationRepositoryTrait, ReservationTransaction,
};

#[cfg(test)]
pub use traits::{MockEventRepositoryTrait, MockOrderRepositoryTrait, MockReservationRepositoryTrait};
