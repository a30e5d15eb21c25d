//! Session lifecycle against a mocked backend

mod common;

use common::*;
use serde_json::json;
use stockpos_core::domain::Credentials;
use stockpos_core::error::{ClientError, LoginStep};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_restore_session_calls_backend_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("ana", false, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, _) = context(&server, None);
    assert!(ctx.restore().await);
    assert!(ctx.restore().await);
    assert_eq!(ctx.session.current_user().unwrap().username, "ana");
}

#[tokio::test]
async fn test_restore_session_without_cookie_is_false() {
    let server = MockServer::start().await;
    mount_me_unauthorized(&server).await;

    let (ctx, _) = context(&server, None);
    assert!(!ctx.restore().await);
    assert!(!ctx.session.is_authenticated());
    assert!(ctx.session.current_user().is_none());
}

#[tokio::test]
async fn test_login_sequence_sends_csrf_header() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(header("X-CSRFToken", CSRF_TOKEN))
        .and(body_json(json!({"username": "ana", "password": "secreto"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_me(&server, user_json("ana", false, &["VENDEDOR"])).await;

    let (ctx, _) = context(&server, None);
    let user = ctx
        .login(&Credentials::new("ana", "secreto"))
        .await
        .unwrap();

    assert_eq!(user.username, "ana");
    assert!(ctx.session.is_authenticated());
    assert!(ctx.session.has_any_role(&["VENDEDOR"]));
    assert_eq!(ctx.http.cookie("csrftoken").as_deref(), Some(CSRF_TOKEN));
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"non_field_errors": ["Credenciales inválidas"]})),
        )
        .mount(&server)
        .await;

    let (ctx, _) = context(&server, None);
    let err = ctx
        .login(&Credentials::new("ana", "mal"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Login {
            step: LoginStep::Credentials,
            ..
        }
    ));
    assert_eq!(err.user_message("fallback"), "Credenciales inválidas");
    assert!(!ctx.session.is_authenticated());
}

#[tokio::test]
async fn test_login_identity_step_failure_leaves_session_cleared() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    mount_me_unauthorized(&server).await;

    let (ctx, _) = context(&server, None);
    let err = ctx
        .login(&Credentials::new("ana", "secreto"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Login {
            step: LoginStep::Identity,
            ..
        }
    ));
    assert!(!ctx.session.is_authenticated());
}

#[tokio::test]
async fn test_login_csrf_step_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/csrf/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (ctx, _) = context(&server, None);
    let err = ctx
        .login(&Credentials::new("ana", "secreto"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Login {
            step: LoginStep::Csrf,
            ..
        }
    ));
}

#[tokio::test]
async fn test_logout_clears_session_even_on_server_error() {
    let server = MockServer::start().await;
    mount_me(&server, user_json("ana", true, &[])).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, log) = context(&server, Some("/home"));
    assert!(ctx.restore().await);

    assert!(ctx.logout().await.is_err());
    assert!(!ctx.session.is_authenticated());
    assert_eq!(log.history().last().map(String::as_str), Some("/login"));
}
