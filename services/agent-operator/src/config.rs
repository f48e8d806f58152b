//! Operator configuration

use std::time::Duration;

/// Agent runs are long-running; the trigger call must wait them out
const DEFAULT_TRIGGER_TIMEOUT_SECS: u64 = 330;

/// Bounded retry budget for transient trigger failures
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration loaded from environment
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub port: u16,
    /// Base URL of the trading-agents service
    pub trading_agents_url: String,
    /// Wall-clock bound for one trigger call, including the agent run
    pub trigger_timeout: Duration,
    /// Scheduled triggering interval; absent means trigger once and exit
    pub trigger_interval: Option<Duration>,
    /// Max attempts per trigger for transient failures
    pub max_retries: u32,
}

impl OperatorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8081);

        let trading_agents_url = std::env::var("TRADING_AGENTS_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let trigger_timeout_secs: u64 = std::env::var("TRIGGER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TRIGGER_TIMEOUT_SECS);

        let trigger_interval = std::env::var("TRIGGER_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        let max_retries: u32 = std::env::var("TRIGGER_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);

        Ok(Self {
            port,
            trading_agents_url: trading_agents_url.trim_end_matches('/').to_string(),
            trigger_timeout: Duration::from_secs(trigger_timeout_secs),
            trigger_interval,
            max_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_exceed_agent_run_budget() {
        // The trigger wait must outlast the executing service's default
        // 300s run bound, or every long run would look like an outage.
        assert!(DEFAULT_TRIGGER_TIMEOUT_SECS > 300);
        assert!(DEFAULT_MAX_RETRIES >= 1);
    }
}
