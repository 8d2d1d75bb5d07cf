//! 票务订单 HTTP 服务
//!
//! 提供下单、订单查询与维护、活动详情等 REST API。

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use ticket_orders::{EventRepository, OrderRepository, OrderService, ReservationRepository};
use ticketing_api::{auth::JwtConfig, routes, state::AppState};
use ticketing_shared::{
    cache::Cache,
    config::{AppConfig, DEFAULT_JWT_SECRET},
    database::Database,
    observability::{self, middleware as obs_middleware},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

const SERVICE_NAME: &str = "ticketing-api";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;
    let _guard = observability::init(&config.service_name, &config.observability).await?;

    info!(
        environment = %config.environment,
        isolation = ?config.order.isolation,
        "Starting {} on {}",
        config.service_name,
        config.server_addr()
    );

    // 初始化基础设施
    let db = Database::connect(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    let cache = if config.redis.enabled {
        Some(Arc::new(Cache::new(&config.redis)?))
    } else {
        info!("Redis cache disabled, event reads go to the database");
        None
    };

    if config.jwt.secret == DEFAULT_JWT_SECRET {
        warn!("Using default JWT secret - set TICKETING_JWT__SECRET for production");
    }

    let order_service = Arc::new(OrderService::new(
        Arc::new(ReservationRepository::new(
            db.pool().clone(),
            config.order.lock_timeout_ms,
        )),
        Arc::new(OrderRepository::new(db.pool().clone())),
        Arc::new(EventRepository::new(db.pool().clone())),
        &config.order,
    ));

    let mut state = AppState::new(order_service, JwtConfig::from(config.jwt.clone()));
    if let Some(cache) = &cache {
        state = state.with_cache(cache.clone());
    }

    let app = Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db.clone();
                let cache_for_ready = cache.clone();
                move || readiness_check(db_for_ready.clone(), cache_for_ready.clone())
            }),
        )
        .layer(routes::request_timeout(Duration::from_secs(
            config.server.request_timeout_seconds,
        )))
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(&config))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// CORS 配置：cors_origins 为逗号分隔的来源列表，"*" 表示全部放行
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_origins == "*" {
        if config.is_production() {
            warn!("cors_origins=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", config.cors_origins);
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 为所有响应注入 HTTP 安全头
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));
    response
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针：检查数据库和（启用时的）Redis 连接
async fn readiness_check(db: Database, cache: Option<Arc<Cache>>) -> Json<serde_json::Value> {
    let db_ok = db.health_check().await.is_ok();
    let redis = match &cache {
        Some(cache) => {
            if cache.health_check().await.is_ok() {
                "ok"
            } else {
                "fail"
            }
        }
        None => "disabled",
    };
    let all_ok = db_ok && redis != "fail";

    Json(serde_json::json!({
        "status": if all_ok { "ok" } else { "degraded" },
        "service": SERVICE_NAME,
        "checks": {
            "database": if db_ok { "ok" } else { "fail" },
            "redis": redis
        }
    }))
}
