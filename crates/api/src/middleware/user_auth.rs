//! Bearer session authentication.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use domain::models::User;
use persistence::repositories::UserRepository;
use shared::jwt::{JwtConfig, JwtError};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Verified token claims, stored in request extensions.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: Uuid,
    pub jti: String,
}

impl UserAuth {
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt_config.verify(token)?;
        Ok(UserAuth {
            user_id: claims.user_id()?,
            jti: claims.jti,
        })
    }
}

/// Reads the bearer token from the request head.
pub async fn bearer_token(parts: &mut Parts, state: &AppState) -> Result<String, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthorized("Not authorized, no token".to_string()))?;
    Ok(bearer.token().to_string())
}

/// Resolves a session token to its claims and the stored user.
///
/// Deleted users are rejected with 401. When verification is mandatory,
/// unverified users are rejected with 403.
pub async fn authenticate(state: &AppState, token: &str) -> Result<(UserAuth, User), ApiError> {
    let auth = UserAuth::validate(&state.jwt, token).map_err(|e| {
        tracing::debug!("JWT validation failed: {}", e);
        ApiError::from(e)
    })?;

    let user: User = UserRepository::new(state.pool.clone())
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?
        .into();

    if state.config.auth.require_email_verification && !user.is_verified {
        return Err(ApiError::Forbidden(
            "Please verify your email before continuing.".to_string(),
        ));
    }

    Ok((auth, user))
}

/// Rejects requests without a valid session and stores [`UserAuth`] and
/// [`CurrentUser`] in the request extensions.
pub async fn require_user_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let resolved = match bearer_token(&mut parts, &state).await {
        Ok(token) => authenticate(&state, &token).await,
        Err(e) => Err(e),
    };

    match resolved {
        Ok((auth, user)) => {
            parts.extensions.insert(auth);
            parts.extensions.insert(CurrentUser(user));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => e.into_response(),
    }
}
