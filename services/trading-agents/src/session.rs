//! Session store client
//!
//! Thin client for the external managed session service. Sessions are
//! addressed by `(app_id, user_id, session_id)`; the store owns the
//! session for its whole life and this service never caches or deletes
//! one. Multiple producers may share a session, so the store stays the
//! single source of truth.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SessionStoreConfig;
use crate::error::RunError;

/// A conversational context owned by the external store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub app_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Narrow contract to the managed session service.
///
/// Two implementations exist: the HTTP client below and deterministic
/// fakes in tests.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Request a new session scoped to `(app_id, user_id)`
    async fn create_session(&self, app_id: &str, user_id: &str) -> Result<Session, RunError>;

    /// Resolve an existing session by identifier
    async fn get_session(
        &self,
        app_id: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Session, RunError>;
}

/// HTTP client for the managed session store
pub struct HttpSessionStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSessionStore {
    /// Create a new store client with a short request timeout;
    /// session store calls are expected to be fast.
    pub fn new(config: &SessionStoreConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        info!(
            "Session store client initialized: url={}, timeout={:?}",
            config.base_url, config.timeout
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    fn session_url(&self, app_id: &str, user_id: &str, session_id: &str) -> String {
        format!(
            "{}/apps/{}/users/{}/sessions/{}",
            self.base_url, app_id, user_id, session_id
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn transport_error(e: reqwest::Error) -> RunError {
        RunError::SessionStoreUnavailable(format!("session store request failed: {}", e))
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn create_session(&self, app_id: &str, user_id: &str) -> Result<Session, RunError> {
        // The store assigns no id on its own; a fresh v4 UUID is chosen
        // per session and never reused.
        let session_id = Uuid::new_v4().to_string();
        let url = self.session_url(app_id, user_id, &session_id);

        debug!(app_id, user_id, session_id = %session_id, "creating session");

        let response = self
            .authorize(self.client.post(&url))
            .send()
            .await
            .map_err(Self::transport_error)?;

        match response.status() {
            s if s.is_success() => {
                info!(session_id = %session_id, "session created");
                Ok(Session {
                    session_id,
                    app_id: app_id.to_string(),
                    user_id: user_id.to_string(),
                    created_at: Utc::now(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RunError::PermissionDenied(format!(
                    "session store rejected credentials ({})",
                    response.status()
                )))
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(RunError::SessionStoreUnavailable(format!(
                    "session create returned {}: {}",
                    status, text
                )))
            }
        }
    }

    async fn get_session(
        &self,
        app_id: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Session, RunError> {
        let url = self.session_url(app_id, user_id, session_id);

        debug!(app_id, user_id, session_id, "resolving session");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(Self::transport_error)?;

        match response.status() {
            s if s.is_success() => {
                // The store echoes the session document; created_at is
                // optional in older store versions.
                let doc: SessionDocument = response.json().await.map_err(|e| {
                    RunError::SessionStoreUnavailable(format!(
                        "malformed session document: {}",
                        e
                    ))
                })?;
                Ok(Session {
                    session_id: doc.id.unwrap_or_else(|| session_id.to_string()),
                    app_id: app_id.to_string(),
                    user_id: user_id.to_string(),
                    created_at: doc.created_at.unwrap_or_else(Utc::now),
                })
            }
            StatusCode::NOT_FOUND => Err(RunError::SessionNotFound {
                session_id: session_id.to_string(),
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RunError::PermissionDenied(format!(
                    "session store rejected credentials ({})",
                    response.status()
                )))
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(RunError::SessionStoreUnavailable(format!(
                    "session get returned {}: {}",
                    status, text
                )))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionDocument {
    id: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(base_url: &str) -> SessionStoreConfig {
        SessionStoreConfig {
            base_url: base_url.to_string(),
            token: None,
            timeout: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_session_url_shape() {
        let store = HttpSessionStore::new(&test_config("http://store:8000")).unwrap();
        assert_eq!(
            store.session_url("agents", "tester", "s-1"),
            "http://store:8000/apps/agents/users/tester/sessions/s-1"
        );
    }

    #[tokio::test]
    async fn test_unreachable_store_is_transient() {
        // Bind then drop a listener so the port is closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = HttpSessionStore::new(&test_config(&format!("http://{}", addr))).unwrap();
        let err = store.create_session("agents", "tester").await.unwrap_err();
        assert_eq!(err.kind(), "SessionStoreUnavailable");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_create_generates_distinct_ids() {
        // Minimal store stub that accepts every create.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    use tokio::io::{AsyncReadExt, AsyncWriteExt};
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 200 OK\r\nconnection: close\r\ncontent-length: 2\r\n\r\n{}",
                        )
                        .await;
                });
            }
        });

        let store = HttpSessionStore::new(&test_config(&format!("http://{}", addr))).unwrap();
        let first = store.create_session("agents", "tester").await.unwrap();
        let second = store.create_session("agents", "tester").await.unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(first.app_id, "agents");
        assert_eq!(first.user_id, "tester");
    }
}
