//! API 错误类型定义
//!
//! 将订单服务的错误映射为 HTTP 状态码与统一响应体

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use ticket_orders::OrderError;

/// API 层错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),
    #[error("禁止访问: {0}")]
    Forbidden(String),

    // 请求体验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    // 订单服务错误
    #[error(transparent)]
    Order(#[from] OrderError),

    // 系统错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Order(e) => match e {
                OrderError::InvalidQuantity(_) | OrderError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                OrderError::EventNotFound(_) | OrderError::OrderNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                // 请求本身合法，但与活动当前状态冲突
                OrderError::EventNotActive { .. } | OrderError::InsufficientTickets { .. } => {
                    StatusCode::CONFLICT
                }
                OrderError::OrderCreationFailed(_) | OrderError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Order(e) => e.error_code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 附加在响应 data 字段中的结构化信息
    fn details(&self) -> Value {
        match self {
            Self::Order(OrderError::EventNotActive { event_id, status }) => json!({
                "eventId": event_id,
                "status": status,
            }),
            Self::Order(OrderError::InsufficientTickets {
                requested,
                available,
            }) => json!({
                "requested": requested,
                "available": available,
            }),
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，原因记录在日志中
        let message = match &self {
            Self::Order(e @ (OrderError::OrderCreationFailed(_) | OrderError::Storage(_))) => {
                tracing::error!(
                    error = %e,
                    source = ?std::error::Error::source(e),
                    "订单存储操作失败"
                );
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": self.details(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 请求体无法解析（非 JSON、缺少字段、类型不符）统一按参数错误返回
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// API 层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
