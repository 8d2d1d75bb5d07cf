//! 活动 API 处理器
//!
//! 活动详情走 cache-aside 读路径；缓存只服务展示，下单校验始终直接读存储

use axum::{
    Json,
    extract::{Path, State},
};
use ticketing_shared::cache::CacheKey;
use ticketing_shared::observability::metrics;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{ApiResponse, EventResponse, OrderListResponse},
    error::Result,
    state::AppState,
};

/// 获取活动详情
///
/// GET /api/v1/events/{id}
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EventResponse>>> {
    let key = CacheKey::event_detail(&id.to_string());

    if let Some(cache) = &state.cache {
        match cache.get::<EventResponse>(&key).await {
            Ok(Some(event)) => {
                metrics::record_event_cache_lookup("hit");
                return Ok(Json(ApiResponse::success(event)));
            }
            Ok(None) => metrics::record_event_cache_lookup("miss"),
            Err(e) => {
                metrics::record_event_cache_lookup("error");
                warn!(error = %e, event_id = %id, "读取活动缓存失败，回源数据库");
            }
        }
    }

    let event = EventResponse::from(state.order_service.get_event(id).await?);

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.set(&key, &event, state.cache_ttl).await {
            warn!(error = %e, event_id = %id, "写入活动缓存失败");
        }
    }

    Ok(Json(ApiResponse::success(event)))
}

/// 获取活动的全部订单
///
/// GET /api/v1/events/{id}/orders
pub async fn list_event_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderListResponse>>> {
    let orders = state.order_service.list_orders_by_event(id).await?;
    Ok(Json(ApiResponse::success(orders.into())))
}

/// 下单成功后删除活动详情缓存，使余票展示尽快更新
///
/// 失败只记录日志，不影响已提交的订单
pub(crate) async fn invalidate_event_cache(state: &AppState, event_id: Uuid) {
    let Some(cache) = &state.cache else {
        return;
    };

    let key = CacheKey::event_detail(&event_id.to_string());
    if let Err(e) = cache.delete(&key).await {
        warn!(error = %e, event_id = %event_id, "删除活动缓存失败");
    }
}
