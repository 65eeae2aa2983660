//! Integration tests for the Budget Tracker API
//!
//! These tests verify the complete request/response cycle for all endpoints.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tempfile::TempDir;
use tower::ServiceExt;

use budget_tracker::{create_router, open_database, AppState, Config};

// Test configuration constants
const TEST_SECRET: &str = "test-session-secret";
const TEST_PASSWORD: &str = "hunter22";

// =============================================================================
// Test Helpers
// =============================================================================

/// Create a test configuration
fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,                // Random port
        database_path: "".to_string(), // Set per test
        allowed_origins: vec!["http://localhost:5173".to_string()],
        environment: "test".to_string(),
        session_secret: TEST_SECRET.to_string(),
        session_ttl_secs: 3600,
        bcrypt_cost: 4,
        log_requests: false,
    }
}

/// Create a test app router backed by a database in a temporary directory
fn create_test_app(temp_dir: &TempDir) -> Router {
    let db_path = temp_dir.path().join("test.db");
    let db = open_database(&db_path).expect("Failed to create test database");

    let mut config = test_config();
    config.database_path = db_path.to_string_lossy().into_owned();

    create_router(AppState::new(db, config))
}

/// Parse response body as JSON
async fn body_to_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Parse a decimal serialized as a JSON string
fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal as string")).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Create a request with an optional JSON body and bearer token
fn make_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn make_get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    make_request("GET", uri, token, None)
}

fn make_post_request(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    make_request("POST", uri, token, Some(body))
}

fn make_put_request(uri: &str, token: &str, body: Value) -> Request<Body> {
    make_request("PUT", uri, Some(token), Some(body))
}

fn make_delete_request(uri: &str, token: &str) -> Request<Body> {
    make_request("DELETE", uri, Some(token), None)
}

/// Sign up a user and return their access token
async fn sign_up(app: &Router, email: &str) -> String {
    let body = json!({
        "email": email,
        "password": TEST_PASSWORD,
        "username": "tester"
    });

    let response = app
        .clone()
        .oneshot(make_post_request("/auth/signup", None, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_to_json(response.into_body()).await;
    body["access_token"].as_str().unwrap().to_string()
}

/// Add an expense dated now and return the created JSON
async fn add_expense(app: &Router, token: &str, amount: &str, category: &str) -> Value {
    let body = json!({
        "amount": amount,
        "category": category,
        "description": "test expense",
        "date": chrono::Utc::now().to_rfc3339()
    });

    let response = app
        .clone()
        .oneshot(make_post_request("/api/expenses", Some(token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_to_json(response.into_body()).await
}

/// Add a budget limit and return the response status and JSON
async fn add_budget_limit(
    app: &Router,
    token: &str,
    amount: &str,
    category: &str,
    period: &str,
) -> (StatusCode, Value) {
    let body = json!({ "amount": amount, "category": category, "period": period });

    let response = app
        .clone()
        .oneshot(make_post_request("/api/budget-limits", Some(token), body))
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check_returns_healthy() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    let response = app.oneshot(make_get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body["version"].as_str().is_some());
}

// =============================================================================
// Auth Tests
// =============================================================================

#[tokio::test]
async fn test_sign_up_returns_session_and_profile() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    let token = sign_up(&app, "Alice@Example.com").await;

    let response = app
        .clone()
        .oneshot(make_get_request("/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["profile"]["username"], "tester");

    let response = app
        .oneshot(make_get_request("/api/profile", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["username"], "tester");
}

#[tokio::test]
async fn test_sign_up_duplicate_email_returns_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    sign_up(&app, "bob@example.com").await;

    let body = json!({
        "email": "bob@example.com",
        "password": TEST_PASSWORD,
        "username": "bob"
    });
    let response = app
        .oneshot(make_post_request("/auth/signup", None, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn test_sign_up_rejects_short_password() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    let body = json!({ "email": "c@example.com", "password": "abc", "username": "c" });
    let response = app
        .oneshot(make_post_request("/auth/signup", None, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_in_and_sign_out() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    sign_up(&app, "dana@example.com").await;

    // Wrong password
    let body = json!({ "email": "dana@example.com", "password": "wrong-password" });
    let response = app
        .clone()
        .oneshot(make_post_request("/auth/signin", None, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct password
    let body = json!({ "email": "dana@example.com", "password": TEST_PASSWORD });
    let response = app
        .clone()
        .oneshot(make_post_request("/auth/signin", None, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    // Sign out
    let response = app
        .clone()
        .oneshot(make_post_request("/auth/signout", Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["success"], true);

    // Token no longer works
    let response = app
        .oneshot(make_get_request("/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    for uri in ["/api/expenses", "/api/budget-limits", "/api/summary", "/auth/session"] {
        let response = app.clone().oneshot(make_get_request(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let response = app
        .oneshot(make_get_request("/api/expenses", Some("forged.token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Expense Tests
// =============================================================================

#[tokio::test]
async fn test_expense_crud() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    let token = sign_up(&app, "erin@example.com").await;

    let created = add_expense(&app, &token, "12.50", "Food").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(decimal(&created["amount"]), dec("12.50"));
    assert_eq!(created["category"], "Food");

    // List
    let response = app
        .clone()
        .oneshot(make_get_request("/api/expenses", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Update
    let update = json!({
        "amount": "20",
        "category": "Transport",
        "description": "bus pass",
        "date": chrono::Utc::now().to_rfc3339()
    });
    let response = app
        .clone()
        .oneshot(make_put_request(&format!("/api/expenses/{}", id), &token, update))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["category"], "Transport");
    assert_eq!(body["description"], "bus pass");

    // Delete
    let response = app
        .clone()
        .oneshot(make_delete_request(&format!("/api/expenses/{}", id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(make_get_request("/api/expenses", Some(&token)))
        .await
        .unwrap();
    let body = body_to_json(response.into_body()).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_expense_validation() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    let token = sign_up(&app, "fay@example.com").await;

    let invalid = [
        json!({ "amount": "-1", "category": "Food", "date": chrono::Utc::now() }),
        json!({ "amount": "1.005", "category": "Food", "date": chrono::Utc::now() }),
        json!({
            "amount": "50000000000000000000000000000",
            "category": "Food",
            "date": chrono::Utc::now()
        }),
        json!({
            "amount": "1",
            "category": "Food",
            "description": "x".repeat(501),
            "date": chrono::Utc::now()
        }),
    ];

    for body in invalid {
        let response = app
            .clone()
            .oneshot(make_post_request("/api/expenses", Some(&token), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // Unknown category is rejected by the JSON extractor
    let body = json!({ "amount": "1", "category": "Rent", "date": chrono::Utc::now() });
    let response = app
        .oneshot(make_post_request("/api/expenses", Some(&token), body))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_expenses_are_scoped_to_owner() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    let owner = sign_up(&app, "gail@example.com").await;
    let other = sign_up(&app, "hank@example.com").await;

    let created = add_expense(&app, &owner, "5", "Health").await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(make_get_request("/api/expenses", Some(&other)))
        .await
        .unwrap();
    let body = body_to_json(response.into_body()).await;
    assert!(body.as_array().unwrap().is_empty());

    let response = app
        .clone()
        .oneshot(make_delete_request(&format!("/api/expenses/{}", id), &other))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Still there for the owner
    let response = app
        .oneshot(make_get_request("/api/expenses", Some(&owner)))
        .await
        .unwrap();
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

// =============================================================================
// Budget Limit Tests
// =============================================================================

#[tokio::test]
async fn test_duplicate_budget_limit_returns_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    let token = sign_up(&app, "ivy@example.com").await;

    let (status, _) = add_budget_limit(&app, &token, "200", "Food", "monthly").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = add_budget_limit(&app, &token, "300", "Food", "monthly").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A monthly budget limit for Food already exists");

    // Same category, other period is fine
    let (status, _) = add_budget_limit(&app, &token, "2000", "Food", "yearly").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_budget_limit_must_be_positive() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    let token = sign_up(&app, "jack@example.com").await;

    let (status, _) = add_budget_limit(&app, &token, "0", "Bills", "monthly").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_budget_limit() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    let token = sign_up(&app, "kim@example.com").await;

    let (_, food) = add_budget_limit(&app, &token, "100", "Food", "monthly").await;
    let (_, bills) = add_budget_limit(&app, &token, "400", "Bills", "monthly").await;
    let food_id = food["id"].as_str().unwrap().to_string();
    let bills_id = bills["id"].as_str().unwrap().to_string();

    let update = json!({ "amount": "150", "period": "yearly" });
    let response = app
        .clone()
        .oneshot(make_put_request(
            &format!("/api/budget-limits/{}", food_id),
            &token,
            update,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(decimal(&body["amount"]), dec("150"));
    assert_eq!(body["period"], "yearly");

    // Deleting one limit leaves the other
    let response = app
        .clone()
        .oneshot(make_delete_request(
            &format!("/api/budget-limits/{}", food_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(make_get_request("/api/budget-limits", Some(&token)))
        .await
        .unwrap();
    let body = body_to_json(response.into_body()).await;
    let limits = body.as_array().unwrap();
    assert_eq!(limits.len(), 1);
    assert_eq!(limits[0]["id"], bills_id.as_str());

    let response = app
        .oneshot(make_delete_request(
            &format!("/api/budget-limits/{}", food_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Summary Tests
// =============================================================================

#[tokio::test]
async fn test_summary_for_empty_user() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    let token = sign_up(&app, "lee@example.com").await;

    let response = app
        .oneshot(make_get_request("/api/summary", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(decimal(&body["total"]), Decimal::ZERO);
    assert_eq!(decimal(&body["average"]), Decimal::ZERO);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_summary_totals() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    let token = sign_up(&app, "max@example.com").await;

    add_expense(&app, &token, "10", "Food").await;
    add_expense(&app, &token, "30", "Shopping").await;

    let response = app
        .oneshot(make_get_request("/api/summary", Some(&token)))
        .await
        .unwrap();
    let body = body_to_json(response.into_body()).await;
    assert_eq!(decimal(&body["total"]), dec("40"));
    assert_eq!(decimal(&body["this_month"]), dec("40"));
    assert_eq!(decimal(&body["average"]), dec("20"));
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_budget_status_warning_levels() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);
    let token = sign_up(&app, "nia@example.com").await;

    add_budget_limit(&app, &token, "100", "Food", "monthly").await;
    add_budget_limit(&app, &token, "50", "Transport", "monthly").await;
    add_budget_limit(&app, &token, "1000", "Health", "yearly").await;

    add_expense(&app, &token, "85", "Food").await;
    add_expense(&app, &token, "60", "Transport").await;
    add_expense(&app, &token, "10", "Health").await;

    let response = app
        .oneshot(make_get_request("/api/budget-status", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    let statuses = body.as_array().unwrap();
    assert_eq!(statuses.len(), 3);

    let find = |category: &str| {
        statuses
            .iter()
            .find(|s| s["limit"]["category"] == category)
            .unwrap()
            .clone()
    };

    let food = find("Food");
    assert_eq!(food["warning_level"], "warning");
    assert_eq!(food["label"], "Near Limit");
    assert_eq!(decimal(&food["spent"]), dec("85"));

    let transport = find("Transport");
    assert_eq!(transport["warning_level"], "danger");
    assert_eq!(transport["label"], "Over Budget!");
    assert_eq!(decimal(&transport["percentage"]), dec("100"));

    let health = find("Health");
    assert_eq!(health["warning_level"], "none");
    assert_eq!(health["label"], "Within Budget");
}
