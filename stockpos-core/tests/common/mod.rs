//! Shared helpers for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use stockpos_core::config::{ApiConfig, Config};
use stockpos_core::navigation::NavigationLog;
use stockpos_core::AppContext;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CSRF_TOKEN: &str = "tok123";

pub fn test_config(base_url: &str) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        },
        ..Config::default()
    }
}

/// Context against `server` with an in-memory navigator starting at `start`
pub fn context(server: &MockServer, start: Option<&str>) -> (AppContext, Arc<NavigationLog>) {
    let log = Arc::new(match start {
        Some(url) => NavigationLog::starting_at(url),
        None => NavigationLog::new(),
    });
    let ctx = AppContext::new(test_config(&server.uri()), log.clone()).unwrap();
    (ctx, log)
}

pub fn user_json(username: &str, staff: bool, groups: &[&str]) -> Value {
    json!({
        "id": 1,
        "username": username,
        "email": format!("{}@example.com", username),
        "is_staff": staff,
        "is_superuser": false,
        "groups": groups,
    })
}

/// `GET /api/auth/csrf/` setting the token cookie
pub async fn mount_csrf(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/auth/csrf/"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", format!("csrftoken={}; Path=/", CSRF_TOKEN).as_str())
                .set_body_json(json!({"detail": "CSRF cookie set"})),
        )
        .mount(server)
        .await;
}

pub async fn mount_me(server: &MockServer, user: Value) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user))
        .mount(server)
        .await;
}

pub async fn mount_me_unauthorized(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Authentication credentials were not provided."})),
        )
        .mount(server)
        .await;
}

pub async fn mount_logout(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
}

pub fn stats_json() -> Value {
    json!({
        "products": {"total": 3, "active": 2, "inactive": 1},
        "stock": {"global": 12, "por_sede": [{"store__code": "CCS", "total": 12}]},
        "sales_last_30d": {"count": 2, "total": "80.00"},
        "fx_usd": 40.0,
        "fx_base": "USD",
        "fx_currency": "VES"
    })
}
