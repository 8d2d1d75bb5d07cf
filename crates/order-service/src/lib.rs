//! 票务订单服务
//!
//! 负责在有限库存上创建订单：校验活动状态与余票、计算金额、写入订单并扣减库存，
//! 全部在同一个存储事务内完成。
//!
//! ## 核心功能
//!
//! - **下单事务**：行锁（FOR UPDATE）或乐观条件更新两种并发策略，冲突时有界重试
//! - **订单查询**：按 ID、购买者、活动查询订单
//! - **订单维护**：状态变更与删除
//! - **活动读取**：供展示路径使用的非事务读取
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 存储层（PostgreSQL 与内存实现）
//! - `service`: 下单事务协调器

pub mod error;
pub mod models;
pub mod repository;
pub mod service;

pub use error::{OrderError, Result, StoreError, StoreResult};
pub use models::*;
pub use repository::{
    EventRepository, EventRepositoryTrait, InMemoryStore, OrderRepository, OrderRepositoryTrait,
    ReservationRepository, ReservationRepositoryTrait, ReservationTransaction,
};
pub use service::OrderService;
pub use ticketing_shared::config::IsolationStrategy;
