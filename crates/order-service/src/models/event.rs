//! 活动模型
//!
//! 活动由外部的活动管理流程维护，订单服务只读取，并在下单事务中扣减余票。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EventStatus;
use crate::error::OrderError;

/// 活动完整信息（展示读路径）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub ticket_price: Decimal,
    pub available_tickets: i32,
    pub total_tickets: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// 下单事务关心的字段投影
    pub fn inventory(&self) -> EventInventory {
        EventInventory {
            id: self.id,
            title: self.title.clone(),
            ticket_price: self.ticket_price,
            available_tickets: self.available_tickets,
            total_tickets: self.total_tickets,
            status: self.status,
        }
    }
}

/// 事务内读取的活动库存投影
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EventInventory {
    pub id: Uuid,
    pub title: String,
    pub ticket_price: Decimal,
    pub available_tickets: i32,
    pub total_tickets: i32,
    pub status: EventStatus,
}

impl EventInventory {
    /// 校验活动能否售出 quantity 张票
    ///
    /// 先看状态再看余票：已取消的活动无论余票多少都返回 EventNotActive
    pub fn ensure_reservable(&self, quantity: i32) -> Result<(), OrderError> {
        if self.status != EventStatus::Active {
            return Err(OrderError::EventNotActive {
                event_id: self.id,
                status: self.status,
            });
        }

        if self.available_tickets < quantity {
            return Err(OrderError::InsufficientTickets {
                requested: quantity,
                available: self.available_tickets,
            });
        }

        Ok(())
    }

    /// 订单总价 = 单价 × 数量，十进制精确计算
    pub fn total_for(&self, quantity: i32) -> Decimal {
        self.ticket_price * Decimal::from(quantity)
    }
}
