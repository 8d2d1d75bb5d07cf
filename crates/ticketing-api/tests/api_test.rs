//! HTTP API 测试
//!
//! 使用内存存储构造完整路由，通过 oneshot 验证认证、角色、状态码与响应体。

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use ticket_orders::{Event, EventStatus, InMemoryStore, OrderService};
use ticketing_api::{
    auth::{JwtConfig, JwtManager, ROLE_ADMIN, ROLE_ORGANIZER, ROLE_USER},
    routes,
    state::AppState,
};
use ticketing_shared::config::OrderConfig;
use tower::ServiceExt;
use uuid::Uuid;

// ==================== 辅助函数 ====================

struct TestApp {
    router: Router,
    store: InMemoryStore,
    jwt: JwtManager,
}

impl TestApp {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        let config = OrderConfig {
            retry_initial_delay_ms: 1,
            retry_max_delay_ms: 5,
            ..OrderConfig::default()
        };
        let service = Arc::new(OrderService::new(
            shared.clone(),
            shared.clone(),
            shared,
            &config,
        ));
        let state = AppState::new(service, JwtConfig::default());
        let router = Router::new()
            .nest("/api/v1", routes::api_routes(state.clone()))
            .with_state(state);

        Self {
            router,
            store,
            jwt: JwtManager::new(JwtConfig::default()),
        }
    }

    fn seed_event(&self, status: EventStatus, available: i32) -> Uuid {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: "Indie Night".to_string(),
            description: Some("Live music".to_string()),
            event_date: now,
            ticket_price: Decimal::new(2500, 2),
            available_tickets: available,
            total_tickets: 10,
            status,
            created_at: now,
            updated_at: now,
        };
        let id = event.id;
        self.store.insert_event(event);
        id
    }

    fn token(&self, user_id: Uuid, role: &str) -> String {
        self.jwt
            .generate_token(user_id, "buyer@example.com", "buyer", vec![role.to_string()])
            .unwrap()
            .0
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn place_order(&self, token: &str, event_id: Uuid, quantity: i32) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/v1/orders",
            Some(token),
            Some(json!({ "eventId": event_id, "quantity": quantity })),
        )
        .await
    }
}

// ==================== 下单 ====================

#[tokio::test]
async fn test_create_order_returns_201() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let buyer = Uuid::new_v4();
    let token = app.token(buyer, ROLE_USER);

    let (status, body) = app.place_order(&token, event_id, 3).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["quantity"], 3);
    assert_eq!(body["data"]["totalAmount"], "75.00");
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["buyerId"], buyer.to_string());
    assert_eq!(
        app.store.event_snapshot(event_id).await.unwrap().available_tickets,
        7
    );
}

#[tokio::test]
async fn test_missing_or_bad_token_is_401() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/orders",
            None,
            Some(json!({ "eventId": event_id, "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.place_order("not-a-jwt", event_id, 1).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.order_count(), 0);
}

#[tokio::test]
async fn test_organizer_cannot_place_orders() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let token = app.token(Uuid::new_v4(), ROLE_ORGANIZER);

    let (status, body) = app.place_order(&token, event_id, 1).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_invalid_quantity_is_400() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let token = app.token(Uuid::new_v4(), ROLE_USER);

    for quantity in [0, -5] {
        let (status, body) = app.place_order(&token, event_id, quantity).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_QUANTITY");
    }
}

#[tokio::test]
async fn test_unparseable_order_body_is_400_envelope() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let token = app.token(Uuid::new_v4(), ROLE_USER);

    let bodies = [
        json!({ "quantity": 1 }),
        json!({ "eventId": event_id, "quantity": "x" }),
        json!({ "eventId": "not-a-uuid", "quantity": 1 }),
    ];
    for body in bodies {
        let (status, response) = app
            .send("POST", "/api/v1/orders", Some(&token), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(response["success"], false);
        assert_eq!(response["code"], "VALIDATION_ERROR");
        assert!(response["message"].is_string());
    }

    // 请求体本身不是 JSON
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/orders")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"eventId\":"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    assert_eq!(app.store.orders_for_event(event_id).len(), 0);
}

#[tokio::test]
async fn test_business_rejections_map_to_status_codes() {
    let app = TestApp::new();
    let token = app.token(Uuid::new_v4(), ROLE_USER);

    let low_stock = app.seed_event(EventStatus::Active, 7);
    let (status, body) = app.place_order(&token, low_stock, 8).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_TICKETS");
    assert_eq!(body["data"]["requested"], 8);
    assert_eq!(body["data"]["available"], 7);

    let cancelled = app.seed_event(EventStatus::Cancelled, 10);
    let (status, body) = app.place_order(&token, cancelled, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EVENT_NOT_ACTIVE");
    assert_eq!(body["data"]["status"], "CANCELLED");

    let (status, body) = app.place_order(&token, Uuid::new_v4(), 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn test_storage_failure_is_500_without_details() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let token = app.token(Uuid::new_v4(), ROLE_USER);

    app.store.fail_next_insert();
    let (status, body) = app.place_order(&token, event_id, 1).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "ORDER_CREATION_ERROR");
    assert!(!body["message"].as_str().unwrap().contains("injected"));
}

// ==================== 查询 ====================

#[tokio::test]
async fn test_order_visibility() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let owner = app.token(Uuid::new_v4(), ROLE_USER);
    let stranger = app.token(Uuid::new_v4(), ROLE_USER);
    let admin = app.token(Uuid::new_v4(), ROLE_ADMIN);

    let (_, created) = app.place_order(&owner, event_id, 2).await;
    let order_id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/orders/{}", order_id);

    let (status, body) = app.send("GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], order_id);

    let (status, body) = app.send("GET", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("your own orders"));

    let (status, _) = app.send("GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let missing = format!("/api/v1/orders/{}", Uuid::new_v4());
    let (status, body) = app.send("GET", &missing, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn test_my_orders_lists_only_callers_orders() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let alice = app.token(Uuid::new_v4(), ROLE_USER);
    let bob = app.token(Uuid::new_v4(), ROLE_USER);

    app.place_order(&alice, event_id, 1).await;
    app.place_order(&alice, event_id, 2).await;
    app.place_order(&bob, event_id, 3).await;

    let (status, body) = app
        .send("GET", "/api/v1/orders/my-orders", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["orders"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_event_orders_require_organizer_or_admin() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let buyer = app.token(Uuid::new_v4(), ROLE_USER);
    let organizer = app.token(Uuid::new_v4(), ROLE_ORGANIZER);

    app.place_order(&buyer, event_id, 4).await;
    let uri = format!("/api/v1/events/{}/orders", event_id);

    let (status, _) = app.send("GET", &uri, Some(&buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("GET", &uri, Some(&organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["orders"][0]["quantity"], 4);
}

#[tokio::test]
async fn test_get_event_reflects_latest_inventory() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let token = app.token(Uuid::new_v4(), ROLE_USER);
    let uri = format!("/api/v1/events/{}", event_id);

    let (status, body) = app.send("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["availableTickets"], 10);
    assert_eq!(body["data"]["ticketPrice"], "25.00");

    app.place_order(&token, event_id, 6).await;
    let (_, body) = app.send("GET", &uri, Some(&token), None).await;
    assert_eq!(body["data"]["availableTickets"], 4);

    let (status, _) = app
        .send("GET", &format!("/api/v1/events/{}", Uuid::new_v4()), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ==================== 订单维护 ====================

#[tokio::test]
async fn test_admin_updates_status() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let buyer = app.token(Uuid::new_v4(), ROLE_USER);
    let admin = app.token(Uuid::new_v4(), ROLE_ADMIN);

    let (_, created) = app.place_order(&buyer, event_id, 1).await;
    let uri = format!("/api/v1/orders/{}/status", created["data"]["id"].as_str().unwrap());

    let (status, _) = app
        .send("PATCH", &uri, Some(&buyer), Some(json!({ "status": "COMPLETED" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send("PATCH", &uri, Some(&admin), Some(json!({ "status": "SHIPPED" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send("PATCH", &uri, Some(&admin), Some(json!({ "state": "COMPLETED" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send("PATCH", &uri, Some(&admin), Some(json!({ "status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");
}

#[tokio::test]
async fn test_admin_deletes_order_without_restock() {
    let app = TestApp::new();
    let event_id = app.seed_event(EventStatus::Active, 10);
    let buyer = app.token(Uuid::new_v4(), ROLE_USER);
    let admin = app.token(Uuid::new_v4(), ROLE_ADMIN);

    let (_, created) = app.place_order(&buyer, event_id, 3).await;
    let uri = format!("/api/v1/orders/{}", created["data"]["id"].as_str().unwrap());

    let (status, _) = app.send("DELETE", &uri, Some(&buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(
        app.store.event_snapshot(event_id).await.unwrap().available_tickets,
        7
    );
}
