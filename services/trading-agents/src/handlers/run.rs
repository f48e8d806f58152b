//! Trigger endpoint - parameterless automated agent run
//!
//! The production path sends no body at all, which guarantees a
//! controlled, reviewable task message is always used. An optional body
//! may carry a `session_id` to continue an existing conversation.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::warn;

use crate::error::{self, RunError};
use crate::types::{RunResult, TriggerRequest};
use crate::AppState;

/// POST /run_agent - orchestrate exactly one agent run
pub async fn run_agent(
    State(state): State<Arc<AppState>>,
    body: Result<Option<Json<TriggerRequest>>, JsonRejection>,
) -> (StatusCode, Json<RunResult>) {
    // A present-but-malformed body is still answered with the structured
    // failure payload; the endpoint is consumed by machines, not humans.
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = RunError::InvalidRequest(format!(
                "malformed trigger body: {}",
                rejection.body_text()
            ));
            return failure(&err, None);
        }
    };

    let session_id = body.and_then(|Json(req)| req.session_id);

    // The pass runs on its own task so a client disconnect does not
    // cancel an agent run that may already have caused tool side
    // effects; the response is simply dropped if undeliverable.
    let orchestrator = state.orchestrator.clone();
    let pass = tokio::spawn(async move { orchestrator.run(session_id).await });

    let result = match pass.await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "orchestrator pass aborted");
            let err = RunError::AgentExecutionFailed(format!("run task aborted: {}", e));
            return failure(&err, None);
        }
    };

    let status = match &result.error {
        None => StatusCode::OK,
        Some(detail) => error::status_for_kind(&detail.kind),
    };

    (status, Json(result))
}

fn failure(err: &RunError, session_id: Option<String>) -> (StatusCode, Json<RunResult>) {
    (
        error::status_for_kind(err.kind()),
        Json(RunResult::failed(err, session_id)),
    )
}
