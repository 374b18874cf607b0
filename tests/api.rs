// End-to-end tests over the real router with the in-memory store and a
// manual clock.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use keywarden::{
    api::{create_router, AppState},
    clock::ManualClock,
    config::{
        AdminConfig, Config, DatabaseConfig, KeysConfig, LoginLimitConfig, ObservabilityConfig,
        ServerConfig, StatsConfig,
    },
    db::MemStore,
    rate_limit::MemoryLoginLimiter,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ROOT_USER: &str = "root";
const ROOT_PASS: &str = "RootPass1";

fn test_config(max_attempts: u32) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        database: DatabaseConfig {
            url: "postgres://unused-in-tests".to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_seconds: 5,
            idle_timeout_seconds: 300,
            call_timeout_seconds: 5,
        },
        redis: None,
        keys: KeysConfig {
            default_hours: 24,
            max_hours: 168,
        },
        admin: AdminConfig {
            session_ttl_hours: 24,
            root_username: Some(ROOT_USER.to_string()),
            root_password: Some(ROOT_PASS.to_string()),
            username_min_length: 3,
            password_min_length: 8,
            password_require_uppercase: true,
            password_require_lowercase: true,
            password_require_digit: true,
        },
        login_limit: LoginLimitConfig {
            backend: "memory".to_string(),
            window_seconds: 900,
            max_attempts,
        },
        stats: StatsConfig {
            recent_window_hours: 24,
        },
        observability: ObservabilityConfig {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        },
    }
}

async fn test_app(max_attempts: u32) -> (Router, Arc<ManualClock>) {
    let config = test_config(max_attempts);
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let limiter = Arc::new(MemoryLoginLimiter::new(clock.clone(), &config.login_limit));
    let state = AppState::new(Arc::new(MemStore::new()), clock.clone(), limiter, &config);
    state.admin.bootstrap().await.unwrap();
    (create_router(state), clock)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/v1/admin/login",
        None,
        Some(json!({ "username": ROOT_USER, "password": ROOT_PASS })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_key_then_duplicate_conflicts() {
    let (app, _) = test_app(10).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/keys",
        None,
        Some(json!({ "user_id": "alice", "hours": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], "alice");
    assert_eq!(body["valid_for_hours"], 1);
    let key_id = body["key_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/keys",
        None,
        Some(json!({ "user_id": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["existing_key"]["key_id"], key_id.as_str());
    assert_eq!(body["existing_key"]["time_remaining"]["expired"], false);
}

#[tokio::test]
async fn test_create_key_rejects_bad_input() {
    let (app, _) = test_app(10).await;

    let (status, _) = send(&app, "POST", "/v1/keys", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/keys",
        None,
        Some(json!({ "user_id": "bob", "hours": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validate_unknown_key_is_404() {
    let (app, _) = test_app(10).await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/keys/00000000-0000-4000-8000-000000000000/validate",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_key_reports_410_in_body() {
    let (app, clock) = test_app(10).await;

    let (_, body) = send(
        &app,
        "POST",
        "/v1/keys",
        None,
        Some(json!({ "user_id": "bob", "hours": 24 })),
    )
    .await;
    let key_id = body["key_id"].as_str().unwrap().to_string();

    // One counted use while valid.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/keys/{key_id}/validate"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["code"], 200);
    assert_eq!(body["usage_count"], 1);

    clock.advance(chrono::Duration::hours(25));

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/keys/{key_id}/validate"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["code"], 410);
    assert_eq!(body["usage_count"], 1);
    assert_eq!(body["time_remaining"]["expired"], true);
}

#[tokio::test]
async fn test_info_and_list_do_not_count_usage() {
    let (app, _) = test_app(10).await;

    let (_, body) = send(
        &app,
        "POST",
        "/v1/keys",
        None,
        Some(json!({ "user_id": "carol" })),
    )
    .await;
    let key_id = body["key_id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/v1/keys/{key_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage_count"], 0);

    let (status, body) = send(&app, "GET", "/v1/users/carol/keys", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["usage_count"], 0);

    let (status, body) = send(&app, "GET", "/v1/users/nobody/keys", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_validates_and_rejects() {
    let (app, _) = test_app(10).await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/admin/login",
        None,
        Some(json!({ "username": ROOT_USER })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/admin/login",
        None,
        Some(json!({ "username": ROOT_USER, "password": "WrongPass1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_session_lifecycle_over_http() {
    let (app, _) = test_app(10).await;
    let token = login(&app).await;

    let (status, body) = send(&app, "GET", "/v1/admin/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"]["username"], ROOT_USER);
    // The hashes never leave the server.
    assert!(body["admin"].get("password_hash").is_none());
    assert!(body["session"].get("session_token_hash").is_none());

    let (status, body) = send(&app, "POST", "/v1/admin/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions_removed"], 1);

    // Logout never leaks whether the token was live.
    let (status, body) = send(&app, "POST", "/v1/admin/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions_removed"], 0);

    let (status, _) = send(&app, "GET", "/v1/admin/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_is_unauthorized() {
    let (app, clock) = test_app(10).await;
    let token = login(&app).await;

    clock.advance(chrono::Duration::hours(25));

    let (status, _) = send(&app, "GET", "/v1/admin/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_a_token() {
    let (app, _) = test_app(10).await;

    for (method, uri) in [
        ("GET", "/v1/admin/session"),
        ("GET", "/v1/admin/sessions"),
        ("GET", "/v1/stats"),
        ("GET", "/v1/admin/admins"),
        ("DELETE", "/v1/admin/keys/00000000-0000-4000-8000-000000000000"),
    ] {
        let (status, _) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_login_rate_limit_over_http() {
    let (app, clock) = test_app(3).await;

    for _ in 0..3 {
        let (status, _) = send(
            &app,
            "POST",
            "/v1/admin/login",
            None,
            Some(json!({ "username": ROOT_USER, "password": "WrongPass1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // Correct credentials no longer help within the window.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/admin/login",
        None,
        Some(json!({ "username": ROOT_USER, "password": ROOT_PASS })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["retry_after_seconds"].as_u64().unwrap() > 0);

    clock.advance(chrono::Duration::seconds(901));
    login(&app).await;
}

#[tokio::test]
async fn test_clear_sessions_invalidates_the_caller() {
    let (app, _) = test_app(10).await;
    let token = login(&app).await;

    let (status, body) = send(&app, "GET", "/v1/admin/sessions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["username"], ROOT_USER);

    let (status, body) = send(&app, "DELETE", "/v1/admin/sessions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions_cleared"], 1);

    let (status, _) = send(&app, "GET", "/v1/admin/sessions", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_crud_over_http() {
    let (app, _) = test_app(10).await;
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/admin/admins",
        Some(&token),
        Some(json!({ "username": "operator", "password": "Operator1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "operator");
    assert!(body.get("password_hash").is_none());
    let operator_id = body["id"].as_str().unwrap().to_string();

    // Weak password is rejected server-side.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/admin/admins",
        Some(&token),
        Some(json!({ "username": "weakling", "password": "weakpass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Duplicate username conflicts.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/admin/admins",
        Some(&token),
        Some(json!({ "username": "Operator", "password": "Operator1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Disable, then the operator cannot log in.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/v1/admin/admins/{operator_id}"),
        Some(&token),
        Some(json!({ "status": "DISABLED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "DISABLED");

    let (status, _) = send(
        &app,
        "POST",
        "/v1/admin/login",
        None,
        Some(json!({ "username": "operator", "password": "Operator1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/v1/admin/admins/{operator_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/v1/admin/admins/{operator_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_permanent_and_self_guards_over_http() {
    let (app, _) = test_app(10).await;
    let token = login(&app).await;

    let (_, body) = send(&app, "GET", "/v1/admin/session", Some(&token), None).await;
    let root_id = body["admin"]["id"].as_str().unwrap().to_string();

    // The permanent root cannot be disabled, demoted, or deleted.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/admin/admins/{root_id}"),
        Some(&token),
        Some(json!({ "status": "DISABLED" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/admin/admins/{root_id}"),
        Some(&token),
        Some(json!({ "is_permanent": false })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/v1/admin/admins/{root_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/v1/admin/admins/{root_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["is_permanent"], true);
    assert_eq!(body["status"], "ACTIVE");
}

#[tokio::test]
async fn test_admin_issued_key_and_delete() {
    let (app, _) = test_app(10).await;
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/admin/keys",
        Some(&token),
        Some(json!({ "user_id": "dave", "hours": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let key_id = body["key_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/v1/admin/keys/{key_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/v1/admin/keys/{key_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_over_http() {
    let (app, clock) = test_app(10).await;
    let token = login(&app).await;

    send(
        &app,
        "POST",
        "/v1/keys",
        None,
        Some(json!({ "user_id": "alice", "hours": 1 })),
    )
    .await;
    send(
        &app,
        "POST",
        "/v1/keys",
        None,
        Some(json!({ "user_id": "bob", "hours": 48 })),
    )
    .await;

    clock.advance(chrono::Duration::hours(2));

    let (status, body) = send(&app, "GET", "/v1/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["active"], 1);
    assert_eq!(body["expired"], 1);
    assert_eq!(body["recent"], 2);
}

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _) = test_app(10).await;

    let (status, body) = send(&app, "GET", "/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["store"]["status"], "ok");
}
