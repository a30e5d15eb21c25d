//! 401 interception, single-flight refresh and replay

mod common;

use common::*;
use futures::future::join_all;
use serde_json::json;
use std::time::Duration;
use stockpos_core::auth::RefreshPhase;
use stockpos_core::domain::StatsResponse;
use stockpos_core::error::ClientError;
use stockpos_core::http::ApiRequest;
use stockpos_core::navigation::Navigator;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"}))
}

/// Stats answers 401 `failures` times, then 200 exactly `replays` times
async fn mount_stats_after_failures(server: &MockServer, failures: u64, replays: u64) {
    Mock::given(method("GET"))
        .and(path("/api/inventory/stats/"))
        .respond_with(unauthorized())
        .up_to_n_times(failures)
        .expect(failures)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/stats/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json()))
        .expect(replays)
        .mount(server)
        .await;
}

fn assert_token_expired(err: ClientError) {
    match err {
        ClientError::Authentication { path, body } => {
            assert_eq!(path, "/inventory/stats/");
            assert_eq!(body, Some(json!({"detail": "Token expired"})));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_refresh_then_replay_succeeds() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_stats_after_failures(&server, 1, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .and(header("X-CSRFToken", CSRF_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "refreshed"})))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, log) = context(&server, Some("/home"));
    let stats = ctx.inventory.stats().await.unwrap();

    assert_eq!(stats.products.total, 3);
    assert_eq!(stats.sales_last_30d.total, 80.0);
    assert_eq!(ctx.orchestrator.phase(), RefreshPhase::Idle);
    // no redirect on success
    assert_eq!(log.history(), vec!["/home"]);
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_stats_after_failures(&server, 3, 3).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, _) = context(&server, None);
    let results = join_all((0..3).map(|_| ctx.inventory.stats())).await;

    for result in results {
        assert_eq!(result.unwrap().products.total, 3);
    }
    assert_eq!(ctx.orchestrator.waiting(), 0);
    assert_eq!(ctx.orchestrator.phase(), RefreshPhase::Idle);
    // three 401s, one refresh, three replays
    server.verify().await;
}

#[tokio::test]
async fn test_failed_refresh_returns_request_error_and_logs_out() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/stats/"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Refresh token invalid"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, log) = context(&server, Some("/products"));
    let err = ctx.inventory.stats().await.unwrap_err();

    assert_token_expired(err);
    assert!(!ctx.session.is_authenticated());
    assert_eq!(
        log.current_url().as_deref(),
        Some("/login?next=/products")
    );
}

#[tokio::test]
async fn test_failed_refresh_fails_every_queued_request() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/stats/"))
        .respond_with(unauthorized())
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Refresh token invalid"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_logout(&server).await;

    let (ctx, log) = context(&server, Some("/home"));
    let results = join_all((0..3).map(|_| ctx.inventory.stats())).await;

    for result in results {
        assert_token_expired(result.unwrap_err());
    }
    assert_eq!(ctx.orchestrator.phase(), RefreshPhase::Idle);
    assert_eq!(
        log.history(),
        vec!["/home".to_string(), "/login?next=/home".to_string()]
    );
    server.verify().await;
}

#[tokio::test]
async fn test_auth_paths_are_not_intercepted() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (ctx, _) = context(&server, None);
    let err = ctx
        .api
        .execute(&ApiRequest::get("/auth/me/"))
        .await
        .unwrap_err();
    assert!(err.is_authentication());
}

#[tokio::test]
async fn test_non_auth_errors_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/stats/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Forbidden"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (ctx, _) = context(&server, None);
    let result: Result<StatsResponse, _> = ctx.inventory.stats().await;
    let err = result.unwrap_err();
    assert!(!err.is_authentication());
    assert_eq!(err.user_message("x"), "Forbidden");
}
