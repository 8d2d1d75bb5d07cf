//! 中间件模块
//!
//! 提供认证与角色检查中间件

mod auth;
mod permission;

pub use auth::auth_middleware;
pub use permission::require_roles;
