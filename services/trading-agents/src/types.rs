//! Core run types
//!
//! These types define the contract between the trigger endpoint, the
//! orchestrator, and the operator service that calls us.

use serde::{Deserialize, Serialize};

use crate::error::RunError;

/// The unit of work handed to the agent runtime
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    /// Application identity registered with the session store
    pub app_id: String,
    /// User identity the session is scoped to
    pub user_id: String,
    /// Session the run executes against
    pub session_id: String,
    /// Task text submitted to the agent (never empty)
    pub message: String,
}

/// Outcome status of one orchestrator pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

/// Machine-parseable error detail in failure payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// One of the taxonomy kinds (e.g. "SessionStoreUnavailable")
    pub kind: String,
    pub message: String,
}

/// Normalized outcome of one agent run.
///
/// Exactly one of `output`/`error` is populated. `session_id` is present
/// whenever a session was resolved, so callers can correlate follow-ups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl RunResult {
    pub fn succeeded(output: String, session_id: String) -> Self {
        Self {
            status: RunStatus::Succeeded,
            output: Some(output),
            error: None,
            session_id: Some(session_id),
        }
    }

    pub fn failed(err: &RunError, session_id: Option<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            output: None,
            error: Some(ErrorDetail {
                kind: err.kind().to_string(),
                message: err.to_string(),
            }),
            session_id,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }
}

/// Optional trigger body; the production path sends none
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerRequest {
    /// Reuse an existing session instead of creating a fresh one
    pub session_id: Option<String>,
}
