//! Integration tests for invite minting, invite emails and user management.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use cicr_connect_api::app::create_app;
use common::{
    create_invite, create_user, json_request_with_auth, parse_response_body, request_with_auth,
    test_config, test_pool, RecordingMailer,
};
use domain::models::Role;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn test_head_can_create_invite() {
    let Some(pool) = test_pool().await else { return };
    let head = create_user(&pool, Role::Head).await;

    let response = common::create_test_app(test_config(), pool.clone())
        .oneshot(request_with_auth(Method::POST, "/api/admin/invite", &head.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = parse_response_body(response).await;
    let code = body["code"].as_str().unwrap();
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    assert!(body["expiresAt"].is_string());

    let (created_by,): (Option<uuid::Uuid>,) =
        sqlx::query_as("SELECT created_by FROM invite_codes WHERE code = $1")
            .bind(code)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(created_by, Some(head.id));
}

#[tokio::test]
async fn test_member_cannot_create_invite() {
    let Some(pool) = test_pool().await else { return };
    let member = create_user(&pool, Role::Member).await;

    let response = common::create_test_app(test_config(), pool)
        .oneshot(request_with_auth(Method::POST, "/api/admin/invite", &member.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        parse_response_body(response).await["message"],
        "User role (Member) is not authorized to access this route"
    );
}

#[tokio::test]
async fn test_send_invite_delivers_email() {
    let Some(pool) = test_pool().await else { return };
    let admin = create_user(&pool, Role::Admin).await;
    let code = create_invite(&pool, Some(admin.id), Duration::days(7)).await;

    let mailer = Arc::new(RecordingMailer::default());
    let app = create_app(common::test_state(test_config(), pool).with_mailer(mailer.clone()));

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/admin/send-invite",
            json!({ "email": "Friend@Example.com", "inviteCode": code }),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["emailSent"], true);
    assert_eq!(body["message"], "Invite sent to friend@example.com");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "friend@example.com");
    assert_eq!(sent[0].subject, "CICR Connect Invitation");
    assert!(sent[0].body_text.contains(&code));
}

#[tokio::test]
async fn test_send_invite_reports_delivery_failure() {
    let Some(pool) = test_pool().await else { return };
    let admin = create_user(&pool, Role::Admin).await;
    let code = create_invite(&pool, Some(admin.id), Duration::days(7)).await;

    let app = create_app(
        common::test_state(test_config(), pool).with_mailer(Arc::new(RecordingMailer::failing())),
    );

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/admin/send-invite",
            json!({ "email": "friend@example.com", "inviteCode": code }),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["emailSent"], false);
}

#[tokio::test]
async fn test_send_invite_rejects_unknown_and_expired_codes() {
    let Some(pool) = test_pool().await else { return };
    let admin = create_user(&pool, Role::Admin).await;
    let app = common::create_test_app(test_config(), pool.clone());

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/admin/send-invite",
            json!({ "email": "friend@example.com", "inviteCode": "NOPE0000" }),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        parse_response_body(response).await["message"],
        "Invite code not found"
    );

    let expired = create_invite(&pool, Some(admin.id), Duration::hours(-2)).await;
    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/admin/send-invite",
            json!({ "email": "friend@example.com", "inviteCode": expired }),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        parse_response_body(response).await["message"],
        "Invite code has expired"
    );
}

#[tokio::test]
async fn test_admin_lists_updates_and_removes_users() {
    let Some(pool) = test_pool().await else { return };
    let admin = create_user(&pool, Role::Admin).await;
    let member = create_user(&pool, Role::Member).await;
    let app = common::create_test_app(test_config(), pool);

    let response = app
        .clone()
        .oneshot(request_with_auth(Method::GET, "/api/admin/users", &admin.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(body["count"], data.len());
    assert!(data.iter().any(|u| u["id"] == member.id.to_string()));

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/admin/users/{}", member.id),
            json!({ "role": "Wizard" }),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/admin/users/{}", member.id),
            json!({ "role": "Head", "branch": "CSE" }),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["role"], "Head");
    assert_eq!(body["branch"], "CSE");

    let response = app
        .clone()
        .oneshot(request_with_auth(
            Method::DELETE,
            &format!("/api/admin/users/{}", member.id),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["message"], "User removed");

    let response = app
        .clone()
        .oneshot(request_with_auth(
            Method::DELETE,
            &format!("/api/admin/users/{}", member.id),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The removed user's token no longer authenticates.
    let response = app
        .oneshot(request_with_auth(Method::GET, "/api/auth/me", &member.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_head_cannot_manage_users() {
    let Some(pool) = test_pool().await else { return };
    let head = create_user(&pool, Role::Head).await;

    let response = common::create_test_app(test_config(), pool)
        .oneshot(request_with_auth(Method::GET, "/api/admin/users", &head.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
