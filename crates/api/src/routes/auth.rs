//! Account routes: registration, login, verification and the caller's profile.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use domain::models::user::{
    AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
use domain::models::User;
use persistence::repositories::{UserChanges, UserRepository};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiJson, CurrentUser};
use crate::services::AuthService;

const VERIFY_EMAIL_PROMPT: &str =
    "Registration successful. Please check your email to verify your account.";

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verifyemail/:token", get(verify_email))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/profile", put(update_profile))
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.pool.clone(),
        state.jwt.clone(),
        state.config.auth.clone(),
        state.config.email.clone(),
        state.mailer.clone(),
    )
}

/// Create an account from an invite code.
///
/// POST /api/auth/register
///
/// Public. The invite is consumed in the same transaction that inserts the
/// user. With verification on, no token is returned until the email link is
/// opened; `emailSent` reports whether that link went out.
async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let registration = auth_service(&state).register(&request).await?;

    // Only a pending verification carries a prompt for the client
    let message = registration
        .email_sent
        .map(|_| VERIFY_EMAIL_PROMPT.to_string());

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: registration.user,
            token: registration.token,
            email_sent: registration.email_sent,
            message,
        }),
    ))
}

/// Exchange email and password for a session token.
///
/// POST /api/auth/login
///
/// Public. Wrong credentials give 401; an unverified account gives 403 when
/// verification is required.
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let (user, token) = auth_service(&state)
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(AuthResponse {
        user,
        token: Some(token),
        email_sent: None,
        message: None,
    }))
}

#[derive(Debug, Serialize)]
struct VerifyEmailResponse {
    success: bool,
    message: String,
}

/// Complete email verification.
///
/// GET /api/auth/verifyemail/:token
///
/// Public; this is the link sent in the verification email. Tokens are
/// single-use and expire after `auth.verification_token_ttl_hours`.
async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<VerifyEmailResponse>, ApiError> {
    auth_service(&state).verify_email(&token).await?;
    Ok(Json(VerifyEmailResponse {
        success: true,
        message: "Email verified successfully. You can now log in.".to_string(),
    }))
}

/// The caller's own profile.
///
/// GET /api/auth/me
async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// Update the caller's own profile fields.
///
/// PUT /api/auth/profile
///
/// Requires a session. Role, email and college id are not editable here.
async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    request.validate()?;

    let changes = UserChanges {
        name: request.name.map(|n| n.trim().to_string()),
        phone: request.phone,
        year: request.year,
        branch: request.branch,
        batch: request.batch,
        project_ideas: request.project_ideas,
        ..UserChanges::default()
    };

    let updated = UserRepository::new(state.pool.clone())
        .update(user.id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(updated.into()))
}
