//! Agent runtime adapter
//!
//! Wraps the external agent execution capability behind a narrow `run`
//! contract. A run is long-running relative to normal request latency
//! (the agent may take many internal reasoning/tool-use steps), so the
//! adapter blocks the caller until the runtime signals completion or the
//! bounded wait elapses. The adapter never retries: only the caller
//! knows whether re-running against the same session is safe.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::AgentRuntimeConfig;
use crate::error::RunError;
use crate::types::RunRequest;

/// The single capability the orchestrator needs from the agent runtime
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Drive one agent run to completion and return its output text
    async fn run(&self, request: &RunRequest) -> Result<String, RunError>;
}

/// HTTP adapter for the agent runtime's `/run` endpoint
pub struct HttpAgentRuntime {
    client: Client,
    base_url: String,
    token: Option<String>,
    run_timeout: Duration,
}

impl HttpAgentRuntime {
    pub fn new(config: &AgentRuntimeConfig) -> anyhow::Result<Self> {
        // The reqwest-level timeout sits slightly above the run bound so
        // classification happens in our timeout wrapper, not the socket.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.run_timeout + Duration::from_secs(10))
            .build()?;

        info!(
            "Agent runtime adapter initialized: url={}, run_timeout={:?}",
            config.base_url, config.run_timeout
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            run_timeout: config.run_timeout,
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn execute(&self, request: &RunRequest) -> Result<String, RunError> {
        let url = format!("{}/run", self.base_url);

        let payload = RunPayload {
            app_name: &request.app_id,
            user_id: &request.user_id,
            session_id: &request.session_id,
            new_message: NewMessage {
                role: "user",
                parts: vec![MessagePart {
                    text: &request.message,
                }],
            },
        };

        let response = self
            .authorize(self.client.post(&url).json(&payload))
            .send()
            .await
            .map_err(|e| {
                RunError::AgentExecutionFailed(format!("agent runtime request failed: {}", e))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(RunError::PermissionDenied(format!(
                "agent runtime rejected credentials ({})",
                status
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RunError::AgentExecutionFailed(format!(
                "agent runtime returned {}: {}",
                status, text
            )));
        }

        let events: Vec<RunEvent> = response.json().await.map_err(|e| {
            RunError::AgentExecutionFailed(format!("failed to parse agent response: {}", e))
        })?;

        // The runtime streams events; the run output is the concatenation
        // of all text parts.
        let output: String = events
            .iter()
            .filter_map(|e| e.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();

        debug!(
            session_id = %request.session_id,
            events = events.len(),
            output_len = output.len(),
            "agent run completed"
        );

        Ok(output)
    }
}

#[async_trait]
impl AgentRuntime for HttpAgentRuntime {
    async fn run(&self, request: &RunRequest) -> Result<String, RunError> {
        match timeout(self.run_timeout, self.execute(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    session_id = %request.session_id,
                    timeout_secs = self.run_timeout.as_secs(),
                    "agent run exceeded its bounded wait"
                );
                Err(RunError::AgentExecutionTimeout {
                    secs: self.run_timeout.as_secs(),
                })
            }
        }
    }
}

// --- Wire types for the runtime's /run endpoint ---

#[derive(Debug, Serialize)]
struct RunPayload<'a> {
    #[serde(rename = "appName")]
    app_name: &'a str,
    #[serde(rename = "userId")]
    user_id: &'a str,
    #[serde(rename = "sessionId")]
    session_id: &'a str,
    #[serde(rename = "newMessage")]
    new_message: NewMessage<'a>,
}

#[derive(Debug, Serialize)]
struct NewMessage<'a> {
    role: &'a str,
    parts: Vec<MessagePart<'a>>,
}

#[derive(Debug, Serialize)]
struct MessagePart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunEvent {
    content: Option<EventContent>,
}

#[derive(Debug, Deserialize)]
struct EventContent {
    #[serde(default)]
    parts: Vec<EventPart>,
}

#[derive(Debug, Deserialize)]
struct EventPart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn test_request() -> RunRequest {
        RunRequest {
            app_id: "agents".into(),
            user_id: "tester".into(),
            session_id: "s-1".into(),
            message: "Help me to manage my portfolio.".into(),
        }
    }

    fn runtime_config(base_url: &str, run_timeout: Duration) -> AgentRuntimeConfig {
        AgentRuntimeConfig {
            base_url: base_url.to_string(),
            token: None,
            run_timeout,
        }
    }

    #[test]
    fn test_run_payload_wire_shape() {
        let req = test_request();
        let payload = RunPayload {
            app_name: &req.app_id,
            user_id: &req.user_id,
            session_id: &req.session_id,
            new_message: NewMessage {
                role: "user",
                parts: vec![MessagePart { text: &req.message }],
            },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["appName"], "agents");
        assert_eq!(json["userId"], "tester");
        assert_eq!(json["sessionId"], "s-1");
        assert_eq!(json["newMessage"]["role"], "user");
        assert_eq!(
            json["newMessage"]["parts"][0]["text"],
            "Help me to manage my portfolio."
        );
    }

    #[test]
    fn test_event_text_concatenation() {
        let raw = serde_json::json!([
            { "content": { "parts": [ { "text": "Reviewed " } ] } },
            { "content": null },
            { "content": { "parts": [ { "text": null }, { "text": "positions." } ] } }
        ]);
        let events: Vec<RunEvent> = serde_json::from_value(raw).unwrap();
        let output: String = events
            .iter()
            .filter_map(|e| e.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();
        assert_eq!(output, "Reviewed positions.");
    }

    #[tokio::test]
    async fn test_hung_runtime_classified_as_timeout() {
        // Accept connections but never answer, simulating a stuck run.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    // Hold the socket open without responding.
                    let _socket = socket;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                });
            }
        });

        let runtime = HttpAgentRuntime::new(&runtime_config(
            &format!("http://{}", addr),
            Duration::from_millis(200),
        ))
        .unwrap();

        let start = Instant::now();
        let err = runtime.run(&test_request()).await.unwrap_err();
        assert_eq!(err.kind(), "AgentExecutionTimeout");
        // Returned within the configured window, not hanging indefinitely.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_runtime_error_classified_as_failed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    use tokio::io::{AsyncReadExt, AsyncWriteExt};
                    let mut buf = [0u8; 2048];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 500 Internal Server Error\r\nconnection: close\r\ncontent-length: 4\r\n\r\nboom",
                        )
                        .await;
                });
            }
        });

        let runtime = HttpAgentRuntime::new(&runtime_config(
            &format!("http://{}", addr),
            Duration::from_secs(2),
        ))
        .unwrap();

        let err = runtime.run(&test_request()).await.unwrap_err();
        assert_eq!(err.kind(), "AgentExecutionFailed");
    }
}
