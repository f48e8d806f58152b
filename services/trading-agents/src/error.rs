//! Error taxonomy for agent run orchestration
//!
//! Every failure surfaced by the service is classified into one of these
//! variants so callers (the operator in particular) can decide whether a
//! retry is safe. The service itself never retries.

use axum::http::StatusCode;
use thiserror::Error;

/// Classified failure of one orchestrator pass
#[derive(Debug, Error)]
pub enum RunError {
    /// Session store could not be reached (transient, caller may retry)
    #[error("session store unavailable: {0}")]
    SessionStoreUnavailable(String),

    /// Caller supplied a session id the store does not know
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Identity lacks the required role on the store or runtime (permanent)
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The agent run raised or returned an error
    #[error("agent execution failed: {0}")]
    AgentExecutionFailed(String),

    /// The agent run exceeded its bounded wait
    #[error("agent execution timed out after {secs}s")]
    AgentExecutionTimeout { secs: u64 },

    /// Malformed or empty request input (permanent)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RunError {
    /// Stable machine-parseable kind string for error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::SessionStoreUnavailable(_) => "SessionStoreUnavailable",
            RunError::SessionNotFound { .. } => "SessionNotFound",
            RunError::PermissionDenied(_) => "PermissionDenied",
            RunError::AgentExecutionFailed(_) => "AgentExecutionFailed",
            RunError::AgentExecutionTimeout { .. } => "AgentExecutionTimeout",
            RunError::InvalidRequest(_) => "InvalidRequest",
        }
    }

    /// Whether a blind re-invocation is safe for this failure class.
    ///
    /// Only store unavailability is transient; everything else either
    /// requires operator intervention or risks duplicating agent side
    /// effects.
    pub fn is_transient(&self) -> bool {
        matches!(self, RunError::SessionStoreUnavailable(_))
    }
}

/// Map an error kind to its HTTP status at the trigger endpoint.
///
/// Keyed on the kind string because the normalized result carries the
/// kind rather than the original error value.
pub fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "SessionStoreUnavailable" => StatusCode::SERVICE_UNAVAILABLE,
        "SessionNotFound" => StatusCode::NOT_FOUND,
        "PermissionDenied" => StatusCode::FORBIDDEN,
        "AgentExecutionFailed" => StatusCode::BAD_GATEWAY,
        "AgentExecutionTimeout" => StatusCode::GATEWAY_TIMEOUT,
        "InvalidRequest" => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings_match_taxonomy() {
        let errs = [
            RunError::SessionStoreUnavailable("down".into()),
            RunError::SessionNotFound { session_id: "s1".into() },
            RunError::PermissionDenied("no role".into()),
            RunError::AgentExecutionFailed("boom".into()),
            RunError::AgentExecutionTimeout { secs: 300 },
            RunError::InvalidRequest("empty message".into()),
        ];
        let kinds: Vec<_> = errs.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "SessionStoreUnavailable",
                "SessionNotFound",
                "PermissionDenied",
                "AgentExecutionFailed",
                "AgentExecutionTimeout",
                "InvalidRequest",
            ]
        );
    }

    #[test]
    fn test_status_mapping() {
        let expected = [
            ("SessionStoreUnavailable", StatusCode::SERVICE_UNAVAILABLE),
            ("SessionNotFound", StatusCode::NOT_FOUND),
            ("PermissionDenied", StatusCode::FORBIDDEN),
            ("AgentExecutionFailed", StatusCode::BAD_GATEWAY),
            ("AgentExecutionTimeout", StatusCode::GATEWAY_TIMEOUT),
            ("InvalidRequest", StatusCode::BAD_REQUEST),
        ];
        for (kind, code) in expected {
            assert_eq!(status_for_kind(kind), code, "{}", kind);
        }
        assert_eq!(status_for_kind("Unknown"), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_only_store_unavailable_is_transient() {
        assert!(RunError::SessionStoreUnavailable("x".into()).is_transient());
        assert!(!RunError::PermissionDenied("x".into()).is_transient());
        assert!(!RunError::AgentExecutionFailed("x".into()).is_transient());
        assert!(!RunError::AgentExecutionTimeout { secs: 1 }.is_transient());
        assert!(!RunError::SessionNotFound { session_id: "s".into() }.is_transient());
    }
}
