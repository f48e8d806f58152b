//! Health check endpoints for load balancers and monitoring

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Basic health check - fast, no external dependencies
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness check - verifies the session store is reachable
pub async fn readyz(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    // Any HTTP answer counts as reachable; only transport failures
    // mark the store down.
    match state.probe.get(&state.config.session_store.base_url).send().await {
        Ok(_) => Ok(Json(ReadinessResponse {
            status: "ready".to_string(),
            checks: vec![HealthCheck {
                name: "session_store".to_string(),
                status: "ok".to_string(),
            }],
        })),
        Err(e) => {
            tracing::error!("Readiness check failed: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: Vec<HealthCheck>,
}

#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
}
