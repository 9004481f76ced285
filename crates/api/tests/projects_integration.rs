//! Integration tests for projects and suggestion threads.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_user, json_request_with_auth, parse_response_body, request_with_auth, test_config,
    test_pool,
};
use domain::models::Role;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn project_body(lead: Option<Uuid>, team: &[Uuid]) -> Value {
    json!({
        "title": format!("Rover {}", Uuid::new_v4().simple()),
        "description": "Autonomous rover for the campus tech fest",
        "domain": "Tech",
        "lead": lead,
        "team": team,
    })
}

#[tokio::test]
async fn test_create_project_defaults_lead_and_dedups_team() {
    let Some(pool) = test_pool().await else { return };
    let head = create_user(&pool, Role::Head).await;
    let member = create_user(&pool, Role::Member).await;
    let app = common::create_test_app(test_config(), pool);

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/projects",
            project_body(None, &[member.id, member.id]),
            &head.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = parse_response_body(response).await;
    assert_eq!(body["lead"]["id"], head.id.to_string());
    assert_eq!(body["status"], "Ongoing");
    assert_eq!(body["team"].as_array().unwrap().len(), 1);
    assert_eq!(body["team"][0]["id"], member.id.to_string());
    assert_eq!(body["createdBy"], head.id.to_string());
}

#[tokio::test]
async fn test_member_cannot_create_project() {
    let Some(pool) = test_pool().await else { return };
    let member = create_user(&pool, Role::Member).await;

    let response = common::create_test_app(test_config(), pool)
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/projects",
            project_body(None, &[]),
            &member.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_title_conflicts() {
    let Some(pool) = test_pool().await else { return };
    let admin = create_user(&pool, Role::Admin).await;
    let app = common::create_test_app(test_config(), pool);

    let body = project_body(None, &[]);
    let first = app
        .clone()
        .oneshot(json_request_with_auth(Method::POST, "/api/projects", body.clone(), &admin.token))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(json_request_with_auth(Method::POST, "/api/projects", body, &admin.token))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_team_member_is_rejected() {
    let Some(pool) = test_pool().await else { return };
    let admin = create_user(&pool, Role::Admin).await;

    let response = common::create_test_app(test_config(), pool)
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/projects",
            project_body(None, &[Uuid::new_v4()]),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_creator_or_admin_can_update() {
    let Some(pool) = test_pool().await else { return };
    let creator = create_user(&pool, Role::Head).await;
    let other_head = create_user(&pool, Role::Head).await;
    let admin = create_user(&pool, Role::Admin).await;
    let app = common::create_test_app(test_config(), pool);

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/projects",
            project_body(None, &[]),
            &creator.token,
        ))
        .await
        .unwrap();
    let id = parse_response_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/projects/{}", id);

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::PUT,
            &uri,
            json!({ "status": "Completed" }),
            &other_head.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::PUT,
            &uri,
            json!({ "status": "Completed" }),
            &creator.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["status"], "Completed");

    let response = app
        .oneshot(json_request_with_auth(
            Method::PUT,
            &uri,
            json!({ "status": "Archived" }),
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_suggestions_newest_first() {
    let Some(pool) = test_pool().await else { return };
    let admin = create_user(&pool, Role::Admin).await;
    let alumni = create_user(&pool, Role::Alumni).await;
    let member = create_user(&pool, Role::Member).await;
    let app = common::create_test_app(test_config(), pool);

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/projects",
            project_body(None, &[]),
            &admin.token,
        ))
        .await
        .unwrap();
    let id = parse_response_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/projects/{}/suggestions", id);

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            &uri,
            json!({ "text": "Use LiDAR" }),
            &member.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    for text in ["Use LiDAR", "Add a camera mast"] {
        let response = app
            .clone()
            .oneshot(json_request_with_auth(
                Method::POST,
                &uri,
                json!({ "text": text }),
                &alumni.token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(request_with_auth(
            Method::GET,
            &format!("/api/projects/{}", id),
            &member.token,
        ))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0]["text"], "Add a camera mast");
    assert_eq!(suggestions[0]["author"]["id"], alumni.id.to_string());
}

#[tokio::test]
async fn test_only_admin_deletes_project() {
    let Some(pool) = test_pool().await else { return };
    let head = create_user(&pool, Role::Head).await;
    let admin = create_user(&pool, Role::Admin).await;
    let app = common::create_test_app(test_config(), pool);

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/projects",
            project_body(None, &[]),
            &head.token,
        ))
        .await
        .unwrap();
    let id = parse_response_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/projects/{}", id);

    let response = app
        .clone()
        .oneshot(request_with_auth(Method::DELETE, &uri, &head.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request_with_auth(Method::DELETE, &uri, &admin.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request_with_auth(Method::GET, &uri, &admin.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
