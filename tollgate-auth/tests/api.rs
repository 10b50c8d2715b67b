use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tollgate_auth::config::AppConfig;
use tollgate_auth::store::MemoryCredentialStore;
use tollgate_auth::{router, AppState};

fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        database_url: None,
        db_pool_size: 1,
        access_secret: "integration-access-secret".into(),
        refresh_secret: "integration-refresh-secret".into(),
        access_ttl_secs: 900,
        refresh_ttl_secs: 7 * 24 * 3600,
        hash_cost: 1,
        hash_memory_kib: 1024,
        environment: "test".into(),
    }
}

fn app() -> Router {
    let store = Arc::new(MemoryCredentialStore::new());
    let state = AppState::new(test_config(), store).unwrap();
    router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/auth/register",
        Some(json!({ "email": email, "password": password })),
        None,
    )
    .await
}

#[tokio::test]
async fn register_validate_refresh_replay() {
    let app = app();

    let (status, body) = register(&app, "alice@example.com", "secret123").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();
    let refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::POST, "/auth/validate", None, Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"]["userId"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/refresh",
        Some(json!({ "refreshToken": refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["data"]["refreshToken"].as_str().unwrap();
    assert_ne!(rotated, refresh);

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/refresh",
        Some(json!({ "refreshToken": refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    let (status, _) = register(&app, "bob@example.com", "secret123").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app, "bob@example.com", "another1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = app();
    register(&app, "carol@example.com", "secret123").await;

    let unknown = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "nobody@example.com", "password": "secret123" })),
        None,
    )
    .await;
    let wrong = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "carol@example.com", "password": "wrong-pass" })),
        None,
    )
    .await;

    assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong);
    assert_eq!(unknown.1["error"], "Invalid email or password");
}

#[tokio::test]
async fn invalid_bodies_are_rejected_before_the_service() {
    let app = app();

    let (status, body) = register(&app, "not-an-email", "secret123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_array());

    let (status, body) = send(&app, Method::POST, "/auth/refresh", Some(json!({})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn overlong_email_is_400_not_a_storage_error() {
    let app = app();
    let domain = vec!["b".repeat(60); 4].join(".");
    let email = format!("{}@{domain}.com", "a".repeat(64));
    assert!(email.len() > 255);

    let (status, body) = register(&app, &email, "secret123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_array());

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": email, "password": "secret123" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validate_requires_a_bearer_token() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/auth/validate", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access token required");

    let (status, body) = send(&app, Method::POST, "/auth/validate", None, Some("forged.token.value")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn logout_then_refresh_fails() {
    let app = app();
    let (_, body) = register(&app, "dave@example.com", "secret123").await;
    let refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/logout",
        Some(json!({ "refreshToken": refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Logging out twice is not an error.
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/logout",
        Some(json!({ "refreshToken": refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/refresh",
        Some(json!({ "refreshToken": refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_lifecycle() {
    let app = app();
    let (_, body) = register(&app, "erin@example.com", "secret123").await;
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/auth/profile", None, Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "erin@example.com");
    assert!(body["data"].get("passwordHash").is_none());

    let (status, _) = send(&app, Method::DELETE, "/auth/profile", None, Some(&access)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/auth/profile", None, Some(&access)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::POST, "/auth/validate", None, Some(&access)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "tollgate-auth");
}
