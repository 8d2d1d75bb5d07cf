//! 订单服务错误类型
//!
//! `StoreError` 描述存储层故障，`OrderError` 是对调用方暴露的封闭错误集合。

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::models::EventStatus;

/// PostgreSQL 中表示可重试并发冲突的 SQLSTATE
///
/// - 40001 serialization_failure
/// - 40P01 deadlock_detected
/// - 55P03 lock_not_available（lock_timeout / NOWAIT）
const CONFLICT_SQLSTATES: [&str; 3] = ["40001", "40P01", "55P03"];

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("数据库错误: {0}")]
    Database(sqlx::Error),

    #[error("并发冲突: {0}")]
    Conflict(String),

    #[error("事务超时: {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("存储不可用: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// 是否为可通过重试整个事务解决的冲突
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let conflict_code = err
            .as_database_error()
            .and_then(|db| db.code())
            .filter(|code| CONFLICT_SQLSTATES.contains(&code.as_ref()))
            .map(|code| code.into_owned());

        match conflict_code {
            Some(code) => Self::Conflict(format!("SQLSTATE {}: {}", code, err)),
            None => Self::Database(err),
        }
    }
}

/// 存储层 Result 类型别名
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 订单服务错误类型
#[derive(Debug, Error)]
pub enum OrderError {
    // === 下单校验错误 ===
    #[error("订单数量无效: {0}，数量必须大于 0")]
    InvalidQuantity(i32),

    #[error("活动不存在: {0}")]
    EventNotFound(Uuid),

    #[error("活动 {event_id} 未开放售票 (status: {status})")]
    EventNotActive { event_id: Uuid, status: EventStatus },

    #[error("余票不足: 需要 {requested}, 剩余 {available}")]
    InsufficientTickets { requested: i32, available: i32 },

    // === 订单错误 ===
    #[error("订单不存在: {0}")]
    OrderNotFound(Uuid),

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 系统错误 ===
    #[error("订单创建失败: {0}")]
    OrderCreationFailed(#[source] StoreError),

    #[error("存储错误: {0}")]
    Storage(#[from] StoreError),
}

/// 订单服务 Result 类型别名
pub type Result<T> = std::result::Result<T, OrderError>;

impl OrderError {
    /// 只有事务冲突值得整体重试，业务拒绝和其他存储故障都直接返回
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::OrderCreationFailed(e) if e.is_conflict())
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(self, Self::OrderCreationFailed(_) | Self::Storage(_))
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::EventNotFound(_) => "EVENT_NOT_FOUND",
            Self::EventNotActive { .. } => "EVENT_NOT_ACTIVE",
            Self::InsufficientTickets { .. } => "INSUFFICIENT_TICKETS",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::OrderCreationFailed(_) => "ORDER_CREATION_ERROR",
            Self::Storage(_) => "DATABASE_ERROR",
        }
    }
}
