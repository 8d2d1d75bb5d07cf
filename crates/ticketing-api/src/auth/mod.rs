//! 认证模块
//!
//! 提供 JWT Token 校验与角色常量

mod jwt;

pub use jwt::{Claims, JwtConfig, JwtManager, ROLE_ADMIN, ROLE_ORGANIZER, ROLE_USER};
