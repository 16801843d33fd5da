//! Health check handlers

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::error::sanitize_url;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response with dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Dependency statuses
    pub dependencies: HashMap<String, DependencyStatus>,
}

/// Individual dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Dependency is healthy
    pub healthy: bool,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Simple health check (liveness probe)
///
/// Always returns 200 OK if the service is running.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check (readiness probe)
///
/// Pings the document store. Returns 503 Service Unavailable when the ping
/// fails or exceeds the store operation timeout.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let timeout = state.config().store.operation_timeout();
    let status = match tokio::time::timeout(timeout, state.store().ping()).await {
        Ok(Ok(())) => DependencyStatus {
            healthy: true,
            message: Some("Connected".to_string()),
        },
        Ok(Err(e)) => {
            tracing::warn!(
                url = %sanitize_url(&state.config().store.url),
                "Document store readiness check failed: {}",
                e
            );
            DependencyStatus {
                healthy: false,
                message: Some(e.to_string()),
            }
        }
        Err(_) => {
            tracing::warn!(timeout = ?timeout, "Document store readiness check timed out");
            DependencyStatus {
                healthy: false,
                message: Some("Ping timed out".to_string()),
            }
        }
    };

    let ready = status.healthy;
    let mut dependencies = HashMap::new();
    dependencies.insert("store".to_string(), status);

    let response = ReadinessResponse {
        ready,
        service: state.config().service.name.clone(),
        dependencies,
    };

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}
