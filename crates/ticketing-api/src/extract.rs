//! 请求体提取器

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON 请求体
///
/// 与 `axum::Json` 相同，解析失败时返回统一错误响应（400 `VALIDATION_ERROR`）
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
