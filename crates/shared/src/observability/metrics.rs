//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(service_name: &str, port: u16) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册指标描述，出现在 /metrics 的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("ticket_orders_total", "Order creation attempts by outcome");
    metrics::describe_histogram!(
        "ticket_order_duration_seconds",
        "Order creation duration in seconds, retries included"
    );
    metrics::describe_counter!(
        "ticket_order_conflicts_total",
        "Inventory conflicts that triggered a transaction retry"
    );
    metrics::describe_counter!("tickets_reserved_total", "Tickets reserved by committed orders");

    metrics::describe_counter!("event_cache_lookups_total", "Event cache lookups by result");

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录一次下单结果
///
/// outcome 取错误码的小写形式，成功为 "created"
#[inline]
pub fn record_order(outcome: &str, duration_secs: f64) {
    metrics::counter!("ticket_orders_total", "outcome" => outcome.to_string()).increment(1);
    metrics::histogram!("ticket_order_duration_seconds", "outcome" => outcome.to_string())
        .record(duration_secs);
}

/// 记录库存冲突（乐观更新失败、序列化失败、锁等待超时）
#[inline]
pub fn record_order_conflict() {
    metrics::counter!("ticket_order_conflicts_total").increment(1);
}

/// 记录已预订票数
#[inline]
pub fn record_tickets_reserved(quantity: u64) {
    metrics::counter!("tickets_reserved_total").increment(quantity);
}

/// 记录活动缓存查询结果（hit / miss / error）
#[inline]
pub fn record_event_cache_lookup(result: &str) {
    metrics::counter!("event_cache_lookups_total", "result" => result.to_string()).increment(1);
}
