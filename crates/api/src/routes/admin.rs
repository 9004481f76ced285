//! Invite minting and user management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use domain::models::invite::{
    default_expiration, CreateInviteResponse, SendInviteRequest, SendInviteResponse,
};
use domain::models::user::{AdminUpdateUserRequest, ListUsersResponse};
use domain::models::{InviteCode, InviteState, User};
use persistence::repositories::{InviteCodeRepository, UserChanges, UserRepository};
use serde_json::{json, Value};
use shared::crypto::generate_invite_code;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiJson, Inviters, RoleGuard, UserAdmins};
use crate::middleware::metrics::record_invite_created;
use crate::services::email::invite_email;

/// Attempts before giving up on a colliding invite code.
const INVITE_CODE_ATTEMPTS: usize = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invite", post(create_invite))
        .route("/send-invite", post(send_invite))
        .route("/users", get(list_users))
        .route("/users/:id", put(update_user).delete(delete_user))
}

/// Mint a single-use invite code.
///
/// POST /api/admin/invite
///
/// Requires Admin or Head. Codes are 8 uppercase hex characters and expire
/// after `auth.invite_expiry_days`.
async fn create_invite(
    State(state): State<AppState>,
    guard: RoleGuard<Inviters>,
) -> Result<(StatusCode, Json<CreateInviteResponse>), ApiError> {
    let repo = InviteCodeRepository::new(state.pool.clone());
    let expires_at = default_expiration(Utc::now(), state.config.auth.invite_expiry_days);

    // Retry on the rare unique-code collision
    let mut attempt = 0;
    let invite = loop {
        attempt += 1;
        let code = generate_invite_code();
        match repo.create(&code, guard.user.id, expires_at).await {
            Ok(invite) => break invite,
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some("23505") && attempt < INVITE_CODE_ATTEMPTS =>
            {
                warn!(attempt, "Invite code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    };

    record_invite_created();
    info!(user_id = %guard.user.id, code = %invite.code, "Invite code created");

    Ok((
        StatusCode::CREATED,
        Json(CreateInviteResponse {
            code: invite.code,
            expires_at: invite.expires_at,
        }),
    ))
}

/// Email an existing invite code to a prospective member.
///
/// POST /api/admin/send-invite
///
/// Requires Admin or Head. Unknown, used and expired codes answer 404 with
/// their own message. A failed delivery is reported with `emailSent: false`
/// rather than an error.
async fn send_invite(
    State(state): State<AppState>,
    guard: RoleGuard<Inviters>,
    ApiJson(request): ApiJson<SendInviteRequest>,
) -> Result<Json<SendInviteResponse>, ApiError> {
    request.validate()?;

    let invite: InviteCode = InviteCodeRepository::new(state.pool.clone())
        .find_by_code(request.invite_code.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Invite code not found".to_string()))?
        .into();

    // Only a redeemable code is worth sending
    match invite.state_at(Utc::now()) {
        InviteState::Redeemable => {}
        InviteState::Used => {
            return Err(ApiError::NotFound("Invite code already used".to_string()))
        }
        InviteState::Expired => {
            return Err(ApiError::NotFound("Invite code has expired".to_string()))
        }
    }

    let email = request.email.trim().to_lowercase();
    let message = invite_email(&state.config.email, &email, &invite.code);

    let response = match state.mailer.send(message).await {
        Ok(()) => {
            info!(user_id = %guard.user.id, code = %invite.code, "Invite email sent");
            SendInviteResponse {
                message: format!("Invite sent to {}", email),
                email_sent: true,
            }
        }
        Err(e) => {
            warn!(code = %invite.code, error = %e, "Invite email failed");
            SendInviteResponse {
                message: format!("Invite code is valid but the email to {} could not be sent", email),
                email_sent: false,
            }
        }
    };

    Ok(Json(response))
}

/// List every account, newest first.
///
/// GET /api/admin/users
///
/// Requires Admin.
async fn list_users(
    State(state): State<AppState>,
    _guard: RoleGuard<UserAdmins>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let data: Vec<User> = UserRepository::new(state.pool.clone())
        .list()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let count = data.len();
    Ok(Json(ListUsersResponse { data, count }))
}

/// Partially update any account, including its role.
///
/// PUT /api/admin/users/:id
///
/// Requires Admin. An unknown role label is a 400.
async fn update_user(
    State(state): State<AppState>,
    guard: RoleGuard<UserAdmins>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<AdminUpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    request.validate()?;
    let role = request.parsed_role().map_err(ApiError::Validation)?;

    let changes = UserChanges {
        name: request.name.map(|n| n.trim().to_string()),
        email: request.email.map(|e| e.trim().to_lowercase()),
        college_id: request.college_id.map(|c| c.trim().to_string()),
        role,
        phone: request.phone,
        year: request.year,
        branch: request.branch,
        batch: request.batch,
        project_ideas: request.project_ideas,
    };

    let updated = UserRepository::new(state.pool.clone())
        .update(id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(admin_id = %guard.user.id, user_id = %id, "User updated by admin");
    Ok(Json(updated.into()))
}

/// Remove an account.
///
/// DELETE /api/admin/users/:id
///
/// Requires Admin. Existing tokens for the account stop working at once.
async fn delete_user(
    State(state): State<AppState>,
    guard: RoleGuard<UserAdmins>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let deleted = UserRepository::new(state.pool.clone()).delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(admin_id = %guard.user.id, user_id = %id, "User removed");
    Ok(Json(json!({ "message": "User removed" })))
}
