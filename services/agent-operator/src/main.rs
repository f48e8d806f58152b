//! Agent Operator - triggers automated runs against trading-agents
//!
//! Serves `POST /run_agent` for scheduler/ops-initiated triggers and,
//! when `TRIGGER_INTERVAL_SECS` is set, fires the trigger itself on a
//! fixed schedule.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, Level};

use agent_operator::{app, AppState, OperatorConfig, TradingAgentsClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting Agent Operator...");

    // Load configuration from environment
    let config = OperatorConfig::from_env()?;
    info!("Trading agents service: {}", config.trading_agents_url);

    let client = TradingAgentsClient::new(&config)?;
    let state = Arc::new(AppState {
        client,
        max_retries: config.max_retries,
    });

    // Scheduled triggering, if configured
    if let Some(period) = config.trigger_interval {
        info!("Scheduled triggering every {:?}", period);
        tokio::spawn(trigger_loop(state.clone(), period));
    }

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Agent Operator listening on port {}", config.port);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Fire the trigger on a fixed schedule.
///
/// Each tick is one independent invocation; a failed run is logged and
/// the schedule simply moves on to the next tick.
async fn trigger_loop(state: Arc<AppState>, period: Duration) {
    let mut ticker = interval(period);
    // The first tick fires immediately; skip it so startup and the
    // first scheduled trigger do not coincide.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match state.client.run_agent_with_retry(state.max_retries).await {
            Ok(success) => {
                info!(
                    session_id = %success.session_id,
                    output_len = success.output.len(),
                    "scheduled run completed"
                );
            }
            Err(e) => {
                error!(error = %e, "scheduled run failed");
            }
        }
    }
}
