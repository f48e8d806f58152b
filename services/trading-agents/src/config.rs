//! Service configuration
//!
//! Loaded once from the environment at startup and passed by reference
//! into the store/runtime constructors. Business logic never reads env
//! vars directly, which keeps the orchestrator testable with fakes.

use std::time::Duration;

/// Default task submitted by the parameterless production trigger
pub const DEFAULT_TASK_MESSAGE: &str = "Help me to manage my portfolio.";

/// Session store calls are expected to be fast
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Agent runs are long-running relative to normal request latency
const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// Configuration for the trading-agents service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    /// Application identity registered with the session store
    pub app_id: String,
    /// User identity automated runs execute as
    pub user_id: String,
    /// Predefined task text for the automated trigger
    pub task_message: String,
    pub session_store: SessionStoreConfig,
    pub agent_runtime: AgentRuntimeConfig,
}

/// Session store endpoint configuration
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    pub base_url: String,
    /// Bearer credential for the managed store, if required. Never logged.
    pub token: Option<String>,
    pub timeout: Duration,
}

/// Agent runtime endpoint configuration
#[derive(Debug, Clone)]
pub struct AgentRuntimeConfig {
    pub base_url: String,
    /// Bearer credential for the runtime, if required. Never logged.
    pub token: Option<String>,
    /// Bounded wait for one agent run
    pub run_timeout: Duration,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let app_id = std::env::var("APP_ID").unwrap_or_else(|_| "agents".to_string());
        let user_id = std::env::var("AGENT_USER_ID").unwrap_or_else(|_| "tester".to_string());
        let task_message = std::env::var("TASK_MESSAGE")
            .unwrap_or_else(|_| DEFAULT_TASK_MESSAGE.to_string());

        if task_message.trim().is_empty() {
            anyhow::bail!("TASK_MESSAGE must not be empty");
        }

        let session_store_url = std::env::var("SESSION_STORE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let store_timeout_secs: u64 = std::env::var("SESSION_STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS);

        let agent_runtime_url = std::env::var("AGENT_RUNTIME_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let run_timeout_secs: u64 = std::env::var("AGENT_RUN_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RUN_TIMEOUT_SECS);

        Ok(Self {
            port,
            app_id,
            user_id,
            task_message,
            session_store: SessionStoreConfig {
                base_url: session_store_url.trim_end_matches('/').to_string(),
                token: std::env::var("SESSION_STORE_TOKEN").ok(),
                timeout: Duration::from_secs(store_timeout_secs),
            },
            agent_runtime: AgentRuntimeConfig {
                base_url: agent_runtime_url.trim_end_matches('/').to_string(),
                token: std::env::var("AGENT_RUNTIME_TOKEN").ok(),
                run_timeout: Duration::from_secs(run_timeout_secs),
            },
        })
    }
}
