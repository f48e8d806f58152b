//! Agent Operator
//!
//! Ops-facing trigger service for the trading-agents runtime. Exposes
//! `POST /run_agent` for manual or scheduler-driven invocation and
//! optionally fires the trigger itself on a fixed interval. This service
//! owns the system's only retry policy; see `client`.

pub mod client;
pub mod config;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub use client::{TradingAgentsClient, TriggerError, TriggerSuccess};
pub use config::OperatorConfig;

/// Shared operator state
pub struct AppState {
    pub client: TradingAgentsClient,
    pub max_retries: u32,
}

/// Build the operator router
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/run_agent", post(run_agent))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// POST /run_agent - trigger one automated run downstream
async fn run_agent(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<TriggerReport>) {
    match state.client.run_agent_with_retry(state.max_retries).await {
        Ok(success) => (
            StatusCode::OK,
            Json(TriggerReport {
                status: "succeeded".to_string(),
                output: Some(success.output),
                session_id: Some(success.session_id),
                error: None,
            }),
        ),
        Err(e) => {
            let (code, kind, session_id) = match &e {
                TriggerError::Unreachable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "ServiceUnreachable".to_string(), None)
                }
                TriggerError::Run { kind, session_id, .. } => {
                    let code = if kind == "SessionStoreUnavailable" {
                        StatusCode::SERVICE_UNAVAILABLE
                    } else {
                        StatusCode::BAD_GATEWAY
                    };
                    (code, kind.clone(), session_id.clone())
                }
                TriggerError::Malformed(_) => {
                    (StatusCode::BAD_GATEWAY, "MalformedResponse".to_string(), None)
                }
            };
            (
                code,
                Json(TriggerReport {
                    status: "failed".to_string(),
                    output: None,
                    session_id,
                    error: Some(TriggerErrorReport {
                        kind,
                        message: e.to_string(),
                    }),
                }),
            )
        }
    }
}

/// Payload relayed to whoever invoked the operator
#[derive(Debug, Serialize)]
pub struct TriggerReport {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TriggerErrorReport>,
}

#[derive(Debug, Serialize)]
pub struct TriggerErrorReport {
    pub kind: String,
    pub message: String,
}
