//! HTTP boundary tests over the in-memory store

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio_test::assert_ok;
use tower::util::ServiceExt;
use uuid::Uuid;

use wallet_ledger::api;

mod common;

async fn app(user_ids: &[&str]) -> Router {
    api::build_router(common::memory_store(user_ids).await)
}

fn post(uri: &str, user_id: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header("X-Request-User-Id", user_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, user_id: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("X-Request-User-Id", user_id)
        .body(Body::empty())
        .unwrap()
}

/// Captures formatted log output for assertions
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_logs(logs: &LogBuffer) -> tracing::subscriber::DefaultGuard {
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

fn log_line(logs: &str, message: &str) -> String {
    logs.lines()
        .find(|line| line.contains(message))
        .unwrap_or_else(|| panic!("no {:?} line in:\n{}", message, logs))
        .to_string()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = assert_ok!(app.clone().oneshot(request).await);
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn test_health_needs_no_identity() {
    let app = app(&[]).await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let app = app(&["alice"]).await;

    let (status, body) = send(
        &app,
        post("/api/v1/wallet/deposit", None, json!({ "amount": "10.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "missing_header");
}

#[tokio::test]
async fn test_deposit_transfer_and_balance() {
    let app = app(&["alice", "bob"]).await;

    let (status, body) = send(
        &app,
        post("/api/v1/wallet/deposit", Some("alice"), json!({ "amount": "100" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "deposit accepted");
    assert_eq!(body["balance"], "100.00");

    let (status, body) = send(
        &app,
        post(
            "/api/v1/wallet/transfer",
            Some("alice"),
            json!({ "to_user_id": "bob", "amount": 40.5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "transfer accepted");
    assert_eq!(body["balance"], "59.50");

    let (status, body) = send(&app, get("/api/v1/wallet/balance", "bob")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "40.50");
}

#[tokio::test]
async fn test_invalid_amount_is_bad_request() {
    let app = app(&["alice"]).await;

    for amount in [json!("0"), json!("-1"), json!("1.234"), json!("lots")] {
        let (status, body) = send(
            &app,
            post("/api/v1/wallet/deposit", Some("alice"), json!({ "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {}", amount);
        assert_eq!(body["error_code"], "invalid_amount");
    }
}

#[tokio::test]
async fn test_transfer_error_statuses() {
    let app = app(&["alice", "bob"]).await;

    let (status, body) = send(
        &app,
        post(
            "/api/v1/wallet/transfer",
            Some("alice"),
            json!({ "to_user_id": "alice", "amount": "1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "self_transfer_not_allowed");

    let (status, body) = send(
        &app,
        post(
            "/api/v1/wallet/transfer",
            Some("alice"),
            json!({ "to_user_id": "bob", "amount": "1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "insufficient_balance");

    let (status, body) = send(
        &app,
        post(
            "/api/v1/wallet/transfer",
            Some("alice"),
            json!({ "to_user_id": "nobody", "amount": "1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "recipient_not_found");
}

#[tokio::test]
async fn test_revert_flow_over_http() {
    let app = app(&["alice", "mallory"]).await;

    send(
        &app,
        post("/api/v1/wallet/deposit", Some("alice"), json!({ "amount": "30" })),
    )
    .await;

    let (status, body) = send(&app, get("/api/v1/wallet/transactions", "alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    let transaction_id = body["items"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post(
            "/api/v1/wallet/revert",
            Some("mallory"),
            json!({ "transaction_id": transaction_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "not_owner");

    let (status, body) = send(
        &app,
        post(
            "/api/v1/wallet/revert",
            Some("alice"),
            json!({ "transaction_id": transaction_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "transaction reverted");
    assert_eq!(body["balance"], "0.00");

    let (status, body) = send(
        &app,
        post(
            "/api/v1/wallet/revert",
            Some("alice"),
            json!({ "transaction_id": transaction_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "already_reverted");

    let (status, body) = send(
        &app,
        post(
            "/api/v1/wallet/revert",
            Some("alice"),
            json!({ "transaction_id": Uuid::new_v4() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "transaction_not_found");
}

#[tokio::test]
async fn test_transactions_pagination_params() {
    let app = app(&["alice"]).await;
    for value in ["1", "2", "3"] {
        send(
            &app,
            post("/api/v1/wallet/deposit", Some("alice"), json!({ "amount": value })),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        get("/api/v1/wallet/transactions?page=2&limit=2", "alice"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["amount"], "1.00");
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
}

#[tokio::test]
async fn test_balance_for_unknown_account() {
    let app = app(&[]).await;

    let (status, body) = send(&app, get("/api/v1/wallet/balance", "ghost")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "account_not_found");
}

#[tokio::test]
async fn test_request_logs_carry_correlation_id() {
    let logs = LogBuffer::default();
    let _guard = capture_logs(&logs);
    let app = app(&["alice"]).await;

    let correlation_id = "11111111-2222-3333-4444-555555555555";
    let request = Request::builder()
        .uri("/api/v1/wallet/balance")
        .header("X-Request-User-Id", "alice")
        .header("X-Correlation-Id", correlation_id)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let logs = logs.contents();
    let expected = format!("correlation_id=Some({})", correlation_id);
    for message in ["Incoming request", "Request completed"] {
        let line = log_line(&logs, message);
        assert!(line.contains(&expected), "{}", line);
    }
    assert!(log_line(&logs, "Incoming request").contains("request_user_id=Some(\"alice\")"));
}

#[tokio::test]
async fn test_request_logs_get_generated_correlation_id() {
    let logs = LogBuffer::default();
    let _guard = capture_logs(&logs);
    let app = app(&["alice"]).await;

    let (status, _) = send(&app, get("/api/v1/wallet/balance", "alice")).await;
    assert_eq!(status, StatusCode::OK);

    let line = log_line(&logs.contents(), "Request completed");
    assert!(line.contains("correlation_id=Some("), "{}", line);
}

#[tokio::test]
async fn test_malformed_json_uses_error_body() {
    let app = app(&["alice"]).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/wallet/deposit")
        .header("content-type", "application/json")
        .header("X-Request-User-Id", "alice")
        .body(Body::from("{\"amount\": "))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_request");

    let (status, body) = send(
        &app,
        post("/api/v1/wallet/transfer", Some("alice"), json!({ "amount": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn test_blank_user_header_is_bad_request() {
    let app = app(&["alice"]).await;

    let (status, body) = send(
        &app,
        post("/api/v1/wallet/deposit", Some("   "), json!({ "amount": "10.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_user_id");

    let long_id = "x".repeat(129);
    let (status, body) = send(&app, get("/api/v1/wallet/balance", &long_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_user_id");
}
