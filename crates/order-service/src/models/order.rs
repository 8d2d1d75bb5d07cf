//! 订单模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderStatus;

/// 订单
///
/// total_amount 在创建时按当时票价计算，之后不再变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// 创建待处理订单，ID 使用时间有序的 UUID v7
    pub fn pending(buyer_id: Uuid, event_id: Uuid, quantity: i32, total_amount: Decimal) -> Self {
        Self {
            id: Uuid::now_v7(),
            buyer_id,
            event_id,
            quantity,
            total_amount,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
