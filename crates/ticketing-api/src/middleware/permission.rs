//! 角色检查中间件
//!
//! 检查当前用户是否拥有指定角色之一

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;

use crate::auth::Claims;
use crate::error::ApiError;

/// 角色检查中间件工厂
///
/// 必须位于 auth_middleware 之后
///
/// # 示例
/// ```ignore
/// .route("/orders/{id}", delete(delete_order).route_layer(axum::middleware::from_fn(require_roles(&[ROLE_ADMIN]))))
/// ```
pub fn require_roles(
    roles: &'static [&'static str],
) -> impl Fn(Request<Body>, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send
{
    move |request: Request<Body>, next: Next| {
        Box::pin(async move { check_roles(request, next, roles).await })
    }
}

async fn check_roles(request: Request<Body>, next: Next, roles: &[&str]) -> Response {
    let allowed = match request.extensions().get::<Claims>() {
        Some(claims) => roles.iter().any(|role| claims.has_role(role)),
        None => {
            return ApiError::Unauthorized("未认证".to_string()).into_response();
        }
    };

    if !allowed {
        return ApiError::Forbidden(format!("需要角色: {}", roles.join(" / "))).into_response();
    }

    next.run(request).await
}
