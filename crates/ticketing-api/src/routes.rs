//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
};

use tower_http::timeout::TimeoutLayer;

use crate::{
    auth::{ROLE_ADMIN, ROLE_ORGANIZER, ROLE_USER},
    handlers,
    middleware::{auth_middleware, require_roles},
    state::AppState,
};

/// 构建订单路由
fn order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(handlers::order::create_order)
                .route_layer(from_fn(require_roles(&[ROLE_USER, ROLE_ADMIN]))),
        )
        .route("/orders/my-orders", get(handlers::order::list_my_orders))
        .route("/orders/{id}", get(handlers::order::get_order))
        .route(
            "/orders/{id}",
            delete(handlers::order::delete_order).route_layer(from_fn(require_roles(&[ROLE_ADMIN]))),
        )
        .route(
            "/orders/{id}/status",
            patch(handlers::order::update_order_status)
                .route_layer(from_fn(require_roles(&[ROLE_ADMIN]))),
        )
}

/// 构建活动路由
fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}", get(handlers::event::get_event))
        .route(
            "/events/{id}/orders",
            get(handlers::event::list_event_orders)
                .route_layer(from_fn(require_roles(&[ROLE_ORGANIZER, ROLE_ADMIN]))),
        )
}

/// 构建 /api/v1 下的全部路由，统一经过 JWT 认证
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(order_routes())
        .merge(event_routes())
        .route_layer(from_fn_with_state(state, auth_middleware))
}

/// 请求超时层：超时返回 408，进行中的处理 future 被丢弃，未提交的下单事务随之回滚
pub fn request_timeout(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}
