//! WhatsApp bridge HTTP client.

use crate::error::SessionError;
use crate::receiver::EventListener;
use crate::session::MessagingSession;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Session backed by a WhatsApp Web bridge sidecar.
///
/// One instance owns at most one event listener task. `destroy` stops it and
/// `initialize` starts a fresh one, so the instance can be cycled any number
/// of times.
pub struct BridgeSession {
    client: Client,
    poll_client: Client,
    base_url: String,
    events: mpsc::Sender<SessionEvent>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl BridgeSession {
    /// Create a new bridge session. Nothing is contacted until `initialize`.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        poll_timeout: Duration,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Self, SessionError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        let poll_client = Client::builder().timeout(poll_timeout).build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            poll_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            events,
            listener: Mutex::new(None),
        })
    }

    /// Get the bridge base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the bridge is reachable.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn post_lifecycle(&self, path: &str) -> Result<(), SessionError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .send()
            .await?;

        if !response.status().is_success() {
            let msg = error_message(response).await;
            return Err(SessionError::Bridge(msg));
        }

        Ok(())
    }
}

/// Extract the bridge's error message, falling back to the raw body.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<BridgeErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => format!("bridge returned {}", status),
        Err(_) => body,
    }
}

#[async_trait]
impl MessagingSession for BridgeSession {
    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<(), SessionError> {
        let mut listener = self.listener.lock().await;
        if let Some(stale) = listener.take() {
            stale.abort();
        }

        // Listen before init so the first pairing code is not missed.
        let handle = EventListener::new(self.poll_client.clone(), &self.base_url)
            .spawn(self.events.clone());

        if let Err(e) = self.post_lifecycle("session/init").await {
            handle.abort();
            return Err(e);
        }

        *listener = Some(handle);
        debug!("Session initialization started");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn destroy(&self) -> Result<(), SessionError> {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
        }

        self.post_lifecycle("session/destroy").await?;
        debug!("Session destroyed");
        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_text(&self, address: &str, text: &str) -> Result<(), SessionError> {
        let request = SendTextRequest {
            chat_id: address.to_string(),
            text: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let msg = error_message(response).await;
            warn!("Send failed: {}", msg);
            return Err(SessionError::Rejected(msg));
        }

        debug!("Sent message to {}", address);
        Ok(())
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}
