//! Trading Agents API client
//!
//! Issues the production trigger call and carries the only retry policy
//! in the system. The executing service never retries internally, so
//! deciding what is safe to re-invoke happens here, where the failure
//! class and the schedule are both visible.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::OperatorConfig;

/// Default backoff before the first retry, doubled per attempt
const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Outcome of a successful trigger
#[derive(Debug, Clone)]
pub struct TriggerSuccess {
    pub output: String,
    pub session_id: String,
}

/// Classified trigger failure
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The trading-agents service itself could not be reached
    #[error("trading agents service unreachable: {0}")]
    Unreachable(String),

    /// The service answered with a classified run failure
    #[error("agent run failed ({kind}): {message}")]
    Run {
        kind: String,
        message: String,
        session_id: Option<String>,
    },

    /// The service answered with something unparseable
    #[error("malformed trigger response: {0}")]
    Malformed(String),
}

impl TriggerError {
    /// Whether a retry with backoff is safe for this failure.
    ///
    /// Permission and malformed-request failures are permanent; agent
    /// execution failures may have had side effects through tool calls,
    /// so blind re-runs are disallowed. Only store outages and an
    /// unreachable service qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            TriggerError::Unreachable(_) => true,
            TriggerError::Run { kind, .. } => kind == "SessionStoreUnavailable",
            TriggerError::Malformed(_) => false,
        }
    }
}

/// Client for the trading-agents trigger endpoint
pub struct TradingAgentsClient {
    client: Client,
    base_url: String,
    backoff: Duration,
}

impl TradingAgentsClient {
    /// Create a new client; the timeout must outlast one full agent run
    pub fn new(config: &OperatorConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.trigger_timeout)
            .build()?;

        info!(
            "Trading agents client initialized: url={}, timeout={:?}",
            config.trading_agents_url, config.trigger_timeout
        );

        Ok(Self {
            client,
            base_url: config.trading_agents_url.clone(),
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Override the retry backoff base (for testing)
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Trigger exactly one automated agent run
    pub async fn run_agent(&self) -> Result<TriggerSuccess, TriggerError> {
        let url = format!("{}/run_agent", self.base_url);

        // The production trigger is parameterless by design.
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| TriggerError::Unreachable(e.to_string()))?;

        let status = response.status();
        let payload: TriggerPayload = response
            .json()
            .await
            .map_err(|e| TriggerError::Malformed(format!("status {}: {}", status, e)))?;

        match (payload.output, payload.error) {
            (Some(output), None) if status.is_success() => Ok(TriggerSuccess {
                output,
                session_id: payload.session_id.unwrap_or_default(),
            }),
            (_, Some(detail)) => Err(TriggerError::Run {
                kind: detail.kind,
                message: detail.message,
                session_id: payload.session_id,
            }),
            _ => Err(TriggerError::Malformed(format!(
                "status {} with neither output nor error",
                status
            ))),
        }
    }

    /// Trigger a run, retrying transient failures with exponential
    /// backoff up to `max_retries` attempts in total.
    pub async fn run_agent_with_retry(
        &self,
        max_retries: u32,
    ) -> Result<TriggerSuccess, TriggerError> {
        let attempts = max_retries.max(1);
        let mut backoff = self.backoff;

        for attempt in 1..=attempts {
            match self.run_agent().await {
                Ok(success) => {
                    info!(
                        attempt,
                        session_id = %success.session_id,
                        "agent run triggered"
                    );
                    return Ok(success);
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(attempt, error = %e, "transient trigger failure, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("retry loop always returns")
    }
}

// Mirror of the trading-agents run payload

#[derive(Debug, Deserialize)]
struct TriggerPayload {
    #[allow(dead_code)]
    status: String,
    output: Option<String>,
    error: Option<ErrorDetail>,
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    kind: String,
    message: String,
}
