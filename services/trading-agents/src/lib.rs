//! Trading Agents service
//!
//! Executes an agent against a managed conversational session on demand:
//! 1. The trigger endpoint receives a parameterless call
//! 2. The orchestrator obtains a session from the external store
//! 3. The agent runtime adapter drives one run against that session
//! 4. The normalized result flows back to the caller

pub mod agent;
pub mod config;
pub mod error;
pub mod handlers {
    pub mod run;
}
pub mod health;
pub mod orchestrator;
pub mod session;
pub mod types;


use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServiceConfig;
pub use error::RunError;
pub use orchestrator::Orchestrator;
pub use session::{Session, SessionStore};
pub use types::{RunRequest, RunResult, RunStatus};

/// Application state shared across handlers
pub struct AppState {
    pub config: ServiceConfig,
    pub orchestrator: Arc<Orchestrator>,
    /// Short-timeout client for readiness probes
    pub probe: reqwest::Client,
}

impl AppState {
    /// Assemble state from a config and the two external capabilities.
    ///
    /// The store and runtime are injected as trait objects so tests can
    /// swap in deterministic fakes.
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn session::SessionStore>,
        runtime: Arc<dyn agent::AgentRuntime>,
    ) -> anyhow::Result<Self> {
        let orchestrator = Arc::new(Orchestrator::new(
            store,
            runtime,
            config.app_id.clone(),
            config.user_id.clone(),
            config.task_message.clone(),
        ));

        let probe = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            config,
            orchestrator,
            probe,
        })
    }
}

/// Build the API router
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/run_agent", post(handlers::run::run_agent))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
