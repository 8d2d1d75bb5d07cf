//! 票务订单 HTTP 服务
//!
//! 对外提供下单、订单查询与维护、活动详情等 REST API。
//!
//! ## 模块结构
//!
//! - `auth`: JWT 校验与角色
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型与 HTTP 映射
//! - `extract`: 请求体提取器
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 认证与角色检查
//! - `routes`: 路由配置
//! - `state`: 应用状态
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod auth;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use state::AppState;
