//! The authenticated user as a handler argument.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::User;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::{authenticate, bearer_token};

/// The user behind the request's session token.
///
/// Taken from extensions when `require_user_auth` already ran, otherwise
/// resolved from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let token = bearer_token(parts, state).await?;
        let (auth, user) = authenticate(state, &token).await?;
        parts.extensions.insert(auth);
        Ok(CurrentUser(user))
    }
}
