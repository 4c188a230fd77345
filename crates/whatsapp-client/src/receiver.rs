//! Session event listener with long polling.

use crate::error::SessionError;
use crate::types::{BridgeEvent, SessionEvent};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

const EVENT_CHANNEL_CAPACITY: usize = 32;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Create the channel a session publishes its lifecycle events on.
pub fn event_channel() -> (mpsc::Sender<SessionEvent>, mpsc::Receiver<SessionEvent>) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

/// Listener that long-polls the bridge for lifecycle events.
pub(crate) struct EventListener {
    client: Client,
    poll_url: String,
}

impl EventListener {
    /// Create a listener. `client` should carry the long-poll timeout.
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            poll_url: format!("{}/events/poll", base_url.trim_end_matches('/')),
        }
    }

    async fn poll(&self) -> Result<Vec<SessionEvent>, SessionError> {
        let response = self.client.get(&self.poll_url).send().await?;

        if !response.status().is_success() {
            return Err(SessionError::Bridge(format!(
                "event poll returned {}",
                response.status()
            )));
        }

        let batch: Vec<serde_json::Value> = response.json().await?;
        Ok(decode_batch(batch))
    }

    /// Start receiving events as an async stream.
    fn stream(self) -> impl Stream<Item = SessionEvent> {
        async_stream::stream! {
            let mut backoff = INITIAL_BACKOFF;
            loop {
                match self.poll().await {
                    Ok(events) => {
                        backoff = INITIAL_BACKOFF;
                        for event in events {
                            debug!(event = event.name(), "Received session event");
                            yield event;
                        }
                    }
                    // An expired long poll just means nothing happened.
                    Err(SessionError::Http(ref e)) if e.is_timeout() => continue,
                    Err(e) => {
                        warn!(error = %e, ?backoff, "Event poll failed, backing off");
                        sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        }
    }

    /// Forward the event stream into `events` on a background task.
    ///
    /// The task ends when the receiving side of the channel is dropped.
    pub fn spawn(self, events: mpsc::Sender<SessionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut stream = Box::pin(self.stream());
            while let Some(event) = stream.next().await {
                if events.send(event).await.is_err() {
                    debug!("Event receiver dropped, stopping listener");
                    break;
                }
            }
        })
    }
}

/// Decode a poll batch entry by entry, skipping entries that do not parse.
fn decode_batch(batch: Vec<serde_json::Value>) -> Vec<SessionEvent> {
    batch
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<BridgeEvent>(raw.clone()) {
            Ok(event) => event.into_session_event(),
            Err(e) => {
                warn!(error = %e, event = %raw, "Skipping malformed bridge event");
                None
            }
        })
        .collect()
}
