//! HTTP calls against the REST API.

use std::sync::Arc;
use std::time::Duration;

use domain::models::inventory::{IssueItemRequest, StockChangeResponse};
use domain::models::user::{AuthResponse, LoginRequest, RegisterRequest};
use domain::models::{Post, User};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::session::{Session, SessionManager, StoreError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error status. `message` comes from the
    /// `{message}` body when there is one.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Session storage failed: {0}")]
    Session(#[from] StoreError),

    #[error("Not signed in")]
    NotAuthenticated,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Builds a [`ClientError::Api`] from a failed response body.
fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Outcome of a registration.
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    /// A session was issued and stored.
    SignedIn(User),
    /// The account must confirm its email first. `email_sent` tells whether
    /// the confirmation email went out.
    VerificationPending { user: User, email_sent: bool },
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<SessionManager>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and decodes a success body.
    ///
    /// Any 401 drops the stored session.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response: Response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        if status == StatusCode::UNAUTHORIZED && self.session.is_authenticated() {
            warn!("Session rejected by server, signing out");
            self.session.clear()?;
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(api_error(status, &body))
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(method, path).json(body)).await
    }

    /// POST /api/auth/register
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterOutcome, ClientError> {
        let response: AuthResponse = self
            .send_json(Method::POST, "/api/auth/register", request)
            .await?;

        match response.token {
            Some(token) => {
                self.session.set(Session::new(token, response.user.clone()))?;
                debug!(user_id = %response.user.id, "Registered and signed in");
                Ok(RegisterOutcome::SignedIn(response.user))
            }
            None => Ok(RegisterOutcome::VerificationPending {
                user: response.user,
                email_sent: response.email_sent.unwrap_or(false),
            }),
        }
    }

    /// POST /api/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .send_json(Method::POST, "/api/auth/login", &request)
            .await?;

        let token = response.token.ok_or(ClientError::NotAuthenticated)?;
        self.session.set(Session::new(token, response.user.clone()))?;
        debug!(user_id = %response.user.id, "Signed in");
        Ok(response.user)
    }

    /// Sessions are stateless on the server; signing out only forgets the token.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.session.clear()?;
        Ok(())
    }

    /// GET /api/auth/me. Refreshes the cached profile.
    pub async fn me(&self) -> Result<User, ClientError> {
        if !self.session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        let user: User = self.send(self.request(Method::GET, "/api/auth/me")).await?;
        self.session.update_user(user.clone())?;
        Ok(user)
    }

    /// POST /api/inventory/issue
    pub async fn issue_item(
        &self,
        item_id: Uuid,
        quantity: i32,
        project: Option<&str>,
    ) -> Result<StockChangeResponse, ClientError> {
        let request = IssueItemRequest {
            item_id,
            quantity,
            project: project.map(str::to_string),
        };
        self.send_json(Method::POST, "/api/inventory/issue", &request)
            .await
    }

    /// POST /api/community/posts/:id/like
    pub async fn toggle_like(&self, post_id: Uuid) -> Result<Post, ClientError> {
        self.send(self.request(
            Method::POST,
            &format!("/api/community/posts/{}/like", post_id),
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_uses_message_field() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            br#"{"error":"validation_error","message":"Insufficient stock"}"#,
        );
        assert_eq!(err.to_string(), "Insufficient stock");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_api_error_falls_back_to_reason() {
        let err = api_error(StatusCode::BAD_GATEWAY, b"<html>oops</html>");
        assert_eq!(err.to_string(), "Bad Gateway");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new(
            "http://localhost:5000/",
            Arc::new(SessionManager::in_memory()),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
