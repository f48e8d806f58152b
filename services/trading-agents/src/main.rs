use std::sync::Arc;
use tracing::{info, Level};

use trading_agents::agent::HttpAgentRuntime;
use trading_agents::session::HttpSessionStore;
use trading_agents::{app, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting Trading Agents service...");

    // Load configuration from environment
    let config = ServiceConfig::from_env()?;
    info!(
        "App: {}, session store: {}, agent runtime: {}",
        config.app_id, config.session_store.base_url, config.agent_runtime.base_url
    );

    // Wire the two external capabilities
    let store = Arc::new(HttpSessionStore::new(&config.session_store)?);
    let runtime = Arc::new(HttpAgentRuntime::new(&config.agent_runtime)?);

    let port = config.port;
    let state = Arc::new(AppState::new(config, store, runtime)?);

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Trading Agents service listening on port {}", port);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
