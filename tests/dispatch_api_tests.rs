use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use bus_station_ops::cache::CacheConfig;
use bus_station_ops::config::{DatabaseConfig, DispatchStore, EnvironmentConfig};
use bus_station_ops::database::DatabaseConnection;
use bus_station_ops::models::operator::OperatorRole;
use bus_station_ops::repositories::MemoryDispatchRepository;
use bus_station_ops::services::DispatchService;
use bus_station_ops::utils::jwt::{generate_token, JwtConfig};
use bus_station_ops::{create_app, AppState};

struct TestApp {
    router: Router,
    token: String,
    operator_id: Uuid,
}

impl TestApp {
    fn new() -> Self {
        let config = EnvironmentConfig {
            dispatch_store: DispatchStore::Memory,
            ..EnvironmentConfig::default()
        };
        let pool = DatabaseConnection::connect_lazy(&DatabaseConfig::new(config.database_url.clone()))
            .unwrap();
        let dispatch = DispatchService::new(
            Arc::new(MemoryDispatchRepository::new()),
            config.workflow_policy().unwrap(),
            CacheConfig::default(),
        );

        let operator_id = Uuid::new_v4();
        let token = generate_token(
            operator_id,
            "dispatcher1",
            OperatorRole::Dispatcher,
            &JwtConfig::from(&config),
        )
        .unwrap();

        let state = AppState::new(pool, config, dispatch);
        Self {
            router: create_app(state),
            token,
            operator_id,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>, auth: bool) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
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
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), true).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, true).await
    }

    async fn enter_vehicle(&self) -> String {
        let (status, body) = self
            .post("/api/dispatch", json!({ "vehicleId": Uuid::new_v4() }))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

fn approved_permit(code: &str) -> Value {
    json!({
        "decision": "approved",
        "transportOrderCode": code,
        "routeId": Uuid::new_v4(),
        "departureDate": "2026-10-19",
        "departureTime": "09:00:00",
        "seatCount": 40
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, false).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dispatchStore"], "memory");
}

#[tokio::test]
async fn test_dispatch_requires_token() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/dispatch/board", None, false).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/dispatch/board")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_token_operator() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/auth/me").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "dispatcher1");
    assert_eq!(body["role"], "dispatcher");
    assert_eq!(body["operatorId"], app.operator_id.to_string());
}

#[tokio::test]
async fn test_full_dispatch_lifecycle() {
    let app = TestApp::new();
    let id = app.enter_vehicle().await;

    let (status, body) = app.get(&format!("/api/dispatch/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentStatus"], "entered");
    assert_eq!(body["displayStatus"], "in-station");

    let (status, body) = app
        .post(&format!("/api/dispatch/{}/passenger-drop", id), json!({ "passengersArrived": 15 }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["currentStatus"], "passengers_dropped");

    let (status, body) = app
        .post(
            &format!("/api/dispatch/{}/charges", id),
            json!({ "serviceType": "parking", "quantity": 2, "unitPrice": 10000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = app
        .post(&format!("/api/dispatch/{}/permit", id), approved_permit("LENH-100"))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["currentStatus"], "permit_issued");
    assert_eq!(body["data"]["displayStatus"], "permit-issued");
    assert_eq!(body["data"]["permitIssuedBy"], app.operator_id.to_string());
    assert_eq!(body["data"]["plannedDepartureTime"], "2026-10-19T02:00:00Z");

    let (status, body) = app.post(&format!("/api/dispatch/{}/payment", id), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["currentStatus"], "paid");
    assert!(!body["data"]["paymentAmount"].is_null());
    assert!(body["data"]["invoiceNumber"].as_str().unwrap().starts_with("HD-"));

    let (status, body) = app
        .post(
            &format!("/api/dispatch/{}/departure-order", id),
            json!({ "passengersDeparting": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["currentStatus"], "departure_ordered");

    let (status, body) = app
        .send(Method::POST, &format!("/api/dispatch/{}/exit", id), None, true)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["currentStatus"], "departed");
    assert_eq!(body["data"]["displayStatus"], "departed");

    for field in [
        "entryTime",
        "passengerDropTime",
        "boardingPermitTime",
        "paymentTime",
        "departureOrderTime",
        "exitTime",
    ] {
        assert!(!body["data"][field].is_null(), "{} should be set", field);
    }

    let (status, board) = app.get("/api/dispatch/board").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["departed"].as_array().unwrap().len(), 1);
    assert!(board["inStation"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_before_permit_is_conflict() {
    let app = TestApp::new();
    let id = app.enter_vehicle().await;

    let (status, body) = app.post(&format!("/api/dispatch/{}/payment", id), json!({})).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_permit_without_code_names_the_field() {
    let app = TestApp::new();
    let id = app.enter_vehicle().await;

    let mut permit = approved_permit("unused");
    permit.as_object_mut().unwrap().remove("transportOrderCode");

    let (status, body) = app.post(&format!("/api/dispatch/{}/permit", id), permit).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["fields"]["transportOrderCode"].is_string());

    let (_, record) = app.get(&format!("/api/dispatch/{}", id)).await;
    assert_eq!(record["currentStatus"], "entered");
}

#[tokio::test]
async fn test_event_time_before_entry_names_the_field() {
    let app = TestApp::new();
    let id = app.enter_vehicle().await;

    let (status, body) = app
        .post(
            &format!("/api/dispatch/{}/passenger-drop", id),
            json!({ "passengersArrived": 15, "eventTime": "2020-01-01T00:00:00Z" }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["fields"]["eventTime"].is_string());

    let (_, record) = app.get(&format!("/api/dispatch/{}", id)).await;
    assert_eq!(record["currentStatus"], "entered");
}

#[tokio::test]
async fn test_duplicate_transport_order_code() {
    let app = TestApp::new();
    let first = app.enter_vehicle().await;
    let second = app.enter_vehicle().await;

    let (status, _) = app
        .post(&format!("/api/dispatch/{}/permit", first), approved_permit("LENH-777"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(&format!("/api/dispatch/{}/permit", second), approved_permit("LENH-777"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_TRANSPORT_ORDER_CODE");
}

#[tokio::test]
async fn test_permit_dry_run_reports_every_field() {
    let app = TestApp::new();
    let id = app.enter_vehicle().await;

    let (status, body) = app
        .post(&format!("/api/dispatch/{}/permit/validate", id), json!({ "seatCount": 0 }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    let fields = body["fieldErrors"].as_object().unwrap();
    for field in ["transportOrderCode", "routeId", "departureDate", "seatCount"] {
        assert!(fields.contains_key(field), "missing error for {}", field);
    }
}

#[tokio::test]
async fn test_unknown_dispatch_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app.get(&format!("/api/dispatch/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_legacy_source_not_configured() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/legacy/dispatch").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_report_summary_counts_visits() {
    let app = TestApp::new();
    app.enter_vehicle().await;
    app.enter_vehicle().await;

    let (status, body) = app.get("/api/reports/summary").await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["totalVisits"], 2);
    assert_eq!(body["buckets"]["inStation"], 2);
}
