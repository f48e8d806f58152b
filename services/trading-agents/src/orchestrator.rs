//! Run orchestrator
//!
//! One invocation is a single sequential pass: resolve a session, then
//! dispatch exactly one agent run against it. There is no internal retry
//! loop anywhere in this module; retry policy belongs to the operator,
//! which can see the failure class and the schedule.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::agent::AgentRuntime;
use crate::error::RunError;
use crate::session::{Session, SessionStore};
use crate::types::{RunRequest, RunResult};

/// Orchestrates session resolution and run dispatch
pub struct Orchestrator {
    store: Arc<dyn SessionStore>,
    runtime: Arc<dyn AgentRuntime>,
    app_id: String,
    user_id: String,
    task_message: String,
    /// Concurrent runs against one session are serialized here; the
    /// external store does not guarantee ordering for shared sessions.
    session_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        runtime: Arc<dyn AgentRuntime>,
        app_id: String,
        user_id: String,
        task_message: String,
    ) -> Self {
        Self {
            store,
            runtime,
            app_id,
            user_id,
            task_message,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Execute one orchestrator pass.
    ///
    /// With no `session_id` a fresh session is created; a supplied id is
    /// resolved against the store and reused. Every failure is classified
    /// and surfaced, never swallowed.
    pub async fn run(&self, session_id: Option<String>) -> RunResult {
        // INIT -> SESSION_RESOLVED. A store failure here is fatal for the
        // pass: blind retries could create duplicate sessions, and a run
        // without a concrete session handle is impossible.
        let session = match self.resolve_session(session_id.as_deref()).await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, kind = e.kind(), "session resolution failed");
                return RunResult::failed(&e, session_id);
            }
        };

        let request = RunRequest {
            app_id: self.app_id.clone(),
            user_id: self.user_id.clone(),
            session_id: session.session_id.clone(),
            message: self.task_message.clone(),
        };

        if request.message.trim().is_empty() {
            let e = RunError::InvalidRequest("run message must not be empty".into());
            return RunResult::failed(&e, Some(session.session_id));
        }

        // SESSION_RESOLVED -> RUN_DISPATCHED. The lock serializes runs
        // that target the same session id.
        let lock = self.session_lock(&session.session_id);
        let outcome = {
            let _guard = lock.lock().await;

            info!(
                session_id = %session.session_id,
                app_id = %self.app_id,
                "dispatching agent run"
            );

            self.runtime.run(&request).await
        };
        self.release_session_lock(&session.session_id, lock);

        match outcome {
            Ok(output) => {
                info!(
                    session_id = %session.session_id,
                    output_len = output.len(),
                    "agent run succeeded"
                );
                RunResult::succeeded(output, session.session_id)
            }
            Err(e) => {
                error!(
                    session_id = %session.session_id,
                    error = %e,
                    kind = e.kind(),
                    "agent run failed"
                );
                RunResult::failed(&e, Some(session.session_id))
            }
        }
    }

    async fn resolve_session(&self, session_id: Option<&str>) -> Result<Session, RunError> {
        match session_id {
            // A stale id is not retried with the same identifier; the
            // caller must trigger again without one.
            Some(id) => self.store.get_session(&self.app_id, &self.user_id, id).await,
            None => self.store.create_session(&self.app_id, &self.user_id).await,
        }
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop the map entry for a session once no pass holds its lock.
    ///
    /// Every parameterless trigger uses a fresh session id, so without
    /// cleanup the map grows by one entry per scheduled run for the
    /// lifetime of the process. Waiters hold an `Arc` clone taken under
    /// the map mutex, so a strong count of 1 inside that mutex means
    /// nobody else can be waiting.
    fn release_session_lock(&self, session_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(lock);
        if let Some(entry) = locks.get(session_id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(session_id);
            }
        }
    }

    #[cfg(test)]
    fn session_lock_count(&self) -> usize {
        self.session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
