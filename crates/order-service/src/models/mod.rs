//! 订单服务领域模型
//!
//! - `enums`: 状态枚举
//! - `event`: 活动与库存投影
//! - `order`: 订单

mod enums;
mod event;
mod order;

pub use enums::{EventStatus, OrderStatus};
pub use event::{Event, EventInventory};
pub use order::Order;
