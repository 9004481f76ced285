//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use persistence::db::ping;
use persistence::metrics::record_pool_metrics;
use serde::Serialize;

use crate::app::AppState;
use crate::config::Config;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub services: ServicesHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Which optional collaborators are wired up. Configuration only, no calls.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesHealth {
    pub email_enabled: bool,
    pub email_provider: String,
    pub summarizer_configured: bool,
    pub inventory_returns_enabled: bool,
}

impl ServicesHealth {
    fn from_config(config: &Config) -> Self {
        Self {
            email_enabled: config.email.enabled,
            email_provider: config.email.provider.clone(),
            summarizer_configured: !config.summarizer.api_key.is_empty(),
            inventory_returns_enabled: config.inventory.returns_enabled,
        }
    }
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check endpoint.
///
/// 503 when the database cannot be reached.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let latency_ms = ping(&state.pool).await.ok();
    record_pool_metrics(&state.pool);

    let connected = latency_ms.is_some();
    if !connected {
        tracing::warn!("Health check failed: database unreachable");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            connected,
            latency_ms,
        },
        services: ServicesHealth::from_config(&state.config),
    }))
}

/// Liveness probe endpoint.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 OK if the database accepts queries.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    match ping(&state.pool).await {
        Ok(_) => Ok(Json(StatusResponse {
            status: "ready".to_string(),
        })),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
