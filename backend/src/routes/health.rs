//! Health check endpoints
//!
//! - /health - process is up and serving
//! - /health/ready - credential store is reachable
//! - /health/live - always OK while the server runs

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Reported instead of the store error, which may carry connection details
const STORE_UNREACHABLE: &str = "store unreachable";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Dependency checks reported by the readiness probe
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub store: CheckStatus,
}

/// Status of an individual check
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthResponse {
    fn plain(status: &'static str) -> Self {
        Self {
            status,
            version: VERSION,
            checks: None,
        }
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::plain("healthy"))
}

/// Readiness probe
///
/// Returns 503 while the credential store cannot be reached.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store = match state.store().health_check().await {
        Ok(()) => CheckStatus {
            healthy: true,
            message: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            CheckStatus {
                healthy: false,
                message: Some(STORE_UNREACHABLE.to_string()),
            }
        }
    };

    let ready = store.healthy;
    let response = HealthResponse {
        status: if ready { "ready" } else { "not_ready" },
        version: VERSION,
        checks: Some(HealthChecks { store }),
    };

    if ready {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse::plain("alive"))
}
