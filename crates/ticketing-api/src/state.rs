//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;
use std::time::Duration;

use ticket_orders::OrderService;
use ticketing_shared::cache::Cache;

use crate::auth::{JwtConfig, JwtManager};

/// Axum 应用共享状态
///
/// 通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    /// 下单事务协调器
    pub order_service: Arc<OrderService>,
    /// JWT 管理器
    pub jwt_manager: Arc<JwtManager>,
    /// 活动详情缓存，未启用 Redis 时为 None
    pub cache: Option<Arc<Cache>>,
    /// 活动详情缓存有效期
    pub cache_ttl: Duration,
}

impl AppState {
    /// 创建不带缓存的应用状态
    pub fn new(order_service: Arc<OrderService>, jwt_config: JwtConfig) -> Self {
        Self {
            order_service,
            jwt_manager: Arc::new(JwtManager::new(jwt_config)),
            cache: None,
            cache_ttl: Duration::from_secs(300),
        }
    }

    /// 启用活动详情缓存
    pub fn with_cache(mut self, cache: Arc<Cache>) -> Self {
        self.cache_ttl = cache.default_ttl();
        self.cache = Some(cache);
        self
    }
}
