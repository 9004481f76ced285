//! Community feed routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use domain::models::post::{CreatePostRequest, DEFAULT_POST_TYPE};
use domain::models::Post;
use persistence::repositories::PostRepository;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiJson, CurrentUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", delete(delete_post))
        .route("/posts/:id/like", post(toggle_like))
}

fn post_not_found() -> ApiError {
    ApiError::NotFound("Post not found".to_string())
}

/// The community feed, newest first, with author summaries.
///
/// GET /api/community/posts
async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = PostRepository::new(state.pool.clone()).list().await?;
    Ok(Json(posts))
}

/// Publish a post.
///
/// POST /api/community/posts
///
/// Requires a session. `type` defaults to `General`.
async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    request.validate()?;

    let post_type = request
        .post_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_POST_TYPE);

    let repo = PostRepository::new(state.pool.clone());
    let id = repo
        .create(user.id, request.content.trim(), post_type)
        .await?;

    info!(post_id = %id, user_id = %user.id, post_type, "Post created");

    let post = repo.find(id).await?.ok_or_else(post_not_found)?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Delete a post.
///
/// DELETE /api/community/posts/:id
///
/// Requires a session; only the author or an Admin may delete.
async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let repo = PostRepository::new(state.pool.clone());

    let post = repo.find(id).await?.ok_or_else(post_not_found)?;
    if !post.can_delete(user.id, user.role) {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this post".to_string(),
        ));
    }

    if !repo.delete(id).await? {
        return Err(post_not_found());
    }

    info!(post_id = %id, user_id = %user.id, "Post removed");
    Ok(Json(json!({ "message": "Post removed" })))
}

/// Like the post, or take the like back if the caller already liked it.
///
/// POST /api/community/posts/:id/like
async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let post = PostRepository::new(state.pool.clone())
        .toggle_like(id, user.id)
        .await?
        .ok_or_else(post_not_found)?;

    info!(
        post_id = %id,
        user_id = %user.id,
        liked = post.is_liked_by(user.id),
        "Post like toggled"
    );
    Ok(Json(post))
}
