//! Common test utilities for integration tests.
//!
//! Tests run against a real PostgreSQL database named by `TEST_DATABASE_URL`.
//! When the variable is unset, `test_pool` returns `None` and tests skip.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use cicr_connect_api::{
    app::{create_app, AppState},
    config::{
        AuthConfig, Config, DatabaseConfig, EmailConfig, InventoryConfig, JwtAuthConfig,
        LoggingConfig, SecurityConfig, ServerConfig, SummarizerConfig,
    },
    services::{EmailError, EmailMessage, Mailer, SummarizeError, Summarizer},
};
use domain::models::Role;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::Value;
use shared::jwt::JwtConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const TEST_PASSWORD: &str = "secret123";

/// Connects to the test database and applies migrations.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    persistence::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Test configuration: verification off, rate limiting off, returns off.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 0,
        },
        jwt: JwtAuthConfig {
            secret: TEST_JWT_SECRET.to_string(),
            token_expiry_secs: 3600,
            leeway_secs: 0,
        },
        auth: AuthConfig {
            require_email_verification: false,
            ..AuthConfig::default()
        },
        email: EmailConfig {
            base_url: "https://connect.test".to_string(),
            api_base_url: "https://api.connect.test".to_string(),
            ..EmailConfig::default()
        },
        inventory: InventoryConfig::default(),
        summarizer: SummarizerConfig::default(),
    }
}

/// Captures outgoing mail. Optionally fails every send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::SendFailed("smtp down".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Answers every prompt with a fixed reply and records the prompts.
pub struct StubSummarizer {
    pub reply: Result<String, u16>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubSummarizer {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(SummarizeError::Upstream {
                status: *status,
                body: "upstream error".to_string(),
            }),
        }
    }
}

pub fn test_state(config: Config, pool: PgPool) -> AppState {
    AppState::new(config, pool)
        .expect("Failed to build app state")
        .with_mailer(Arc::new(RecordingMailer::default()))
}

pub fn create_test_app(config: Config, pool: PgPool) -> Router {
    create_app(test_state(config, pool))
}

pub fn unique_email() -> String {
    format!("member_{}@example.com", Uuid::new_v4().simple())
}

pub fn unique_college_id() -> String {
    format!("TST{}", &Uuid::new_v4().simple().to_string()[..12])
}

/// A seeded, verified account with a session token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

/// Inserts a verified user directly and signs a token for them.
pub async fn create_user(pool: &PgPool, role: Role) -> TestUser {
    let name: String = Name().fake();
    let email = unique_email();
    let hash = shared::password::hash_password(TEST_PASSWORD).expect("hash");

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (name, email, college_id, password_hash, role, is_verified)
        VALUES ($1, $2, $3, $4, $5::user_role, true)
        RETURNING id
        "#,
    )
    .bind(&name)
    .bind(&email)
    .bind(unique_college_id())
    .bind(&hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .expect("Failed to insert user");

    TestUser {
        id,
        name,
        email,
        role,
        token: token_for(id),
    }
}

pub fn token_for(user_id: Uuid) -> String {
    JwtConfig::new(TEST_JWT_SECRET, 3600)
        .expect("jwt config")
        .issue(user_id)
        .expect("token")
        .token
}

/// Inserts an invite code. `expires_in` may be negative.
pub async fn create_invite(pool: &PgPool, created_by: Option<Uuid>, expires_in: Duration) -> String {
    let code = format!("T{}", &Uuid::new_v4().simple().to_string()[..15]).to_uppercase();
    sqlx::query("INSERT INTO invite_codes (code, created_by, expires_at) VALUES ($1, $2, $3)")
        .bind(&code)
        .bind(created_by)
        .bind(Utc::now() + expires_in)
        .execute(pool)
        .await
        .expect("Failed to insert invite");
    code
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn json_request_with_auth(method: Method, uri: &str, body: Value, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn request_with_auth(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
