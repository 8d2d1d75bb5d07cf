//! 请求 DTO 定义

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// 下单请求
///
/// quantity 的取值规则由订单服务校验，错误码为 INVALID_QUANTITY
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub event_id: Uuid,
    pub quantity: i32,
}

/// 更新订单状态请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1, max = 20, message = "订单状态长度必须在1-20个字符之间"))]
    pub status: String,
}
