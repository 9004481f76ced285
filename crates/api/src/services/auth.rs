//! Invite-gated registration, login and email verification.

use chrono::{Duration, Utc};
use domain::models::user::RegisterRequest;
use domain::models::{InviteCode, InviteState, Role, User};
use persistence::repositories::{DuplicateField, InviteCodeRepository, NewUser, UserRepository};
use shared::crypto::{generate_verification_token, sha256_hex};
use shared::jwt::{JwtConfig, JwtError};
use shared::password::{hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{AuthConfig, EmailConfig};
use crate::error::ApiError;
use crate::middleware::metrics::record_user_registered;
use crate::services::email::{verification_email, Mailer};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("A user with this email already exists.")]
    DuplicateEmail,

    #[error("A user with this College ID already exists.")]
    DuplicateCollegeId,

    #[error("Invalid or expired invitation code")]
    InvalidInvite,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Please verify your email before logging in.")]
    EmailNotVerified,

    #[error("Invalid or expired verification token")]
    InvalidOrExpiredToken,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DuplicateEmail
            | AuthError::DuplicateCollegeId
            | AuthError::InvalidInvite
            | AuthError::InvalidOrExpiredToken => ApiError::Validation(err.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::EmailNotVerified => ApiError::Forbidden(err.to_string()),
            AuthError::Token(e) => ApiError::Internal(e.to_string()),
            AuthError::Password(e) => ApiError::Internal(e.to_string()),
            AuthError::Database(e) => ApiError::from(e),
        }
    }
}

/// Outcome of a registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    /// Set when no verification is required.
    pub token: Option<String>,
    /// Set when a verification email was attempted.
    pub email_sent: Option<bool>,
}

pub struct AuthService {
    pool: PgPool,
    jwt: Arc<JwtConfig>,
    auth: AuthConfig,
    email: EmailConfig,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        jwt: Arc<JwtConfig>,
        auth: AuthConfig,
        email: EmailConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            pool,
            jwt,
            auth,
            email,
            mailer,
        }
    }

    /// Creates an account from an unused, unexpired invite code.
    ///
    /// The user insert and the invite claim commit together; a code claimed
    /// by a concurrent registration surfaces as `InvalidInvite`.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Registration, AuthError> {
        let users = UserRepository::new(self.pool.clone());
        let invites = InviteCodeRepository::new(self.pool.clone());

        let email = request.email.trim().to_lowercase();
        let college_id = request.college_id.trim();
        let invite_code = request.invite_code.trim();

        match users.find_duplicate(&email, college_id).await? {
            Some(DuplicateField::Email) => return Err(AuthError::DuplicateEmail),
            Some(DuplicateField::CollegeId) => return Err(AuthError::DuplicateCollegeId),
            None => {}
        }

        let invite: Option<InviteCode> = invites.find_by_code(invite_code).await?.map(Into::into);
        match invite.map(|i| i.state_at(Utc::now())) {
            Some(InviteState::Redeemable) => {}
            _ => return Err(AuthError::InvalidInvite),
        }

        let password_hash = hash_password(&request.password)?;

        let verification_token = self
            .auth
            .require_email_verification
            .then(generate_verification_token);
        let token_hash = verification_token.as_deref().map(sha256_hex);
        let token_expires_at = verification_token
            .as_ref()
            .map(|_| Utc::now() + Duration::hours(self.auth.verification_token_ttl_hours));

        let new_user = NewUser {
            name: request.name.trim(),
            email: &email,
            college_id,
            password_hash: &password_hash,
            role: Role::default(),
            is_verified: false,
            verification_token_hash: token_hash.as_deref(),
            verification_token_expires_at: token_expires_at,
        };

        let created = match users.create_with_invite(&new_user, invite_code).await {
            Ok(Some(entity)) => entity,
            Ok(None) => return Err(AuthError::InvalidInvite),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                return Err(match db_err.constraint() {
                    Some("users_college_id_key") => AuthError::DuplicateCollegeId,
                    _ => AuthError::DuplicateEmail,
                });
            }
            Err(e) => return Err(e.into()),
        };
        let user: User = created.into();

        record_user_registered();
        info!(user_id = %user.id, "User registered");

        match verification_token {
            Some(raw_token) => {
                let message = verification_email(
                    &self.email,
                    &user.email,
                    &user.name,
                    &raw_token,
                    self.auth.verification_token_ttl_hours,
                );
                let email_sent = match self.mailer.send(message).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(user_id = %user.id, error = %e, "Verification email failed");
                        false
                    }
                };
                Ok(Registration {
                    user,
                    token: None,
                    email_sent: Some(email_sent),
                })
            }
            None => {
                let token = self.jwt.issue(user.id)?.token;
                Ok(Registration {
                    user,
                    token: Some(token),
                    email_sent: None,
                })
            }
        }
    }

    /// Checks credentials and issues a session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let users = UserRepository::new(self.pool.clone());

        let user: User = users
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AuthError::InvalidCredentials)?
            .into();

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if self.auth.require_email_verification && !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let token = self.jwt.issue(user.id)?.token;
        info!(user_id = %user.id, "User logged in");
        Ok((user, token))
    }

    /// Consumes a raw verification token.
    pub async fn verify_email(&self, raw_token: &str) -> Result<User, AuthError> {
        let users = UserRepository::new(self.pool.clone());
        let user = users
            .verify_email(&sha256_hex(raw_token))
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;
        info!(user_id = %user.id, "Email verified");
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn status_of(err: AuthError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(
            AuthError::DuplicateEmail.to_string(),
            "A user with this email already exists."
        );
        assert_eq!(
            AuthError::DuplicateCollegeId.to_string(),
            "A user with this College ID already exists."
        );
        assert_eq!(
            AuthError::InvalidInvite.to_string(),
            "Invalid or expired invitation code"
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(status_of(AuthError::DuplicateEmail), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AuthError::InvalidInvite), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AuthError::InvalidOrExpiredToken),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AuthError::EmailNotVerified), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AuthError::Token(JwtError::Signing("bad key".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
