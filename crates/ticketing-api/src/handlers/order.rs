//! 订单 API 处理器

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::event::invalidate_event_cache;
use crate::{
    auth::Claims,
    dto::{ApiResponse, CreateOrderRequest, OrderListResponse, OrderResponse, UpdateOrderStatusRequest},
    error::{ApiError, Result},
    extract::AppJson,
    state::AppState,
};

/// 下单
///
/// POST /api/v1/orders
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>)> {
    let buyer_id = claims.user_id()?;

    let order = state
        .order_service
        .create_order(buyer_id, req.event_id, req.quantity)
        .await?;

    invalidate_event_cache(&state, order.event_id).await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            order.into(),
            "订单创建成功",
        )),
    ))
}

/// 当前用户的订单
///
/// GET /api/v1/orders/my-orders
pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<OrderListResponse>>> {
    let buyer_id = claims.user_id()?;
    let orders = state.order_service.list_orders_by_buyer(buyer_id).await?;
    Ok(Json(ApiResponse::success(orders.into())))
}

/// 获取订单详情，仅限下单人或管理员
///
/// GET /api/v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let order = state.order_service.get_order(id).await?;

    if !claims.is_admin() && order.buyer_id != claims.user_id()? {
        return Err(ApiError::Forbidden(
            "You can only view your own orders".to_string(),
        ));
    }

    Ok(Json(ApiResponse::success(order.into())))
}

/// 更新订单状态
///
/// PATCH /api/v1/orders/{id}/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    req.validate()?;

    let order = state
        .order_service
        .update_order_status(id, &req.status)
        .await?;

    info!(order_id = %id, status = %order.status, operator = %claims.sub, "Order status updated");
    Ok(Json(ApiResponse::success(order.into())))
}

/// 删除订单
///
/// DELETE /api/v1/orders/{id}
pub async fn delete_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    state.order_service.delete_order(id).await?;

    info!(order_id = %id, operator = %claims.sub, "Order deleted");
    Ok(Json(ApiResponse::<()>::success_empty()))
}
