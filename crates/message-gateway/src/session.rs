//! Session lifecycle supervision.
//!
//! The supervisor owns the single messaging session for the life of the
//! process. Lifecycle events arrive on a channel and are applied one at a
//! time, so teardown and re-initialization after a disconnect never overlap.

use chrono::{DateTime, Utc};
use qrcode::{render::unicode, QrCode};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use whatsapp_client::{MessagingSession, SessionEvent};

/// Lifecycle state of the messaging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    AwaitingAuthentication,
    Ready,
    AuthFailed,
    Disconnected,
}

impl SessionState {
    /// State the session moves to when `event` arrives.
    pub fn on_event(self, event: &SessionEvent) -> SessionState {
        match event {
            SessionEvent::PairingChallenge { .. } => SessionState::AwaitingAuthentication,
            SessionEvent::Ready => SessionState::Ready,
            SessionEvent::AuthFailure { .. } => SessionState::AuthFailed,
            SessionEvent::Disconnected { .. } => SessionState::Disconnected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::AwaitingAuthentication => "awaiting_authentication",
            SessionState::Ready => "ready",
            SessionState::AuthFailed => "auth_failed",
            SessionState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published view of the session state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub changed_at: DateTime<Utc>,
    /// Last failure or disconnect reason, if any.
    pub detail: Option<String>,
    /// Pairing code waiting to be scanned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
}

impl SessionSnapshot {
    pub fn new(state: SessionState) -> Self {
        Self {
            state,
            changed_at: Utc::now(),
            detail: None,
            pairing_code: None,
        }
    }
}

/// Render a pairing code as a QR code for a terminal.
fn render_pairing_code(code: &str) -> Option<String> {
    match QrCode::new(code.as_bytes()) {
        Ok(qr) => Some(
            qr.render::<unicode::Dense1x2>()
                .dark_color(unicode::Dense1x2::Light)
                .light_color(unicode::Dense1x2::Dark)
                .build(),
        ),
        Err(e) => {
            warn!(error = %e, "Pairing code cannot be rendered as a QR code");
            None
        }
    }
}

/// Owns the messaging session and drives it through its lifecycle.
pub struct SessionSupervisor {
    session: Arc<dyn MessagingSession>,
    events: mpsc::Receiver<SessionEvent>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionSupervisor {
    /// Create a supervisor for `session`, which publishes on the sending half of `events`.
    pub fn new(session: Arc<dyn MessagingSession>, events: mpsc::Receiver<SessionEvent>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::new(SessionState::Uninitialized));
        Self {
            session,
            events,
            state,
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().state
    }

    /// Begin establishing the session.
    pub async fn start(&self) {
        info!("Initializing messaging session");
        self.initialize().await;
    }

    /// Apply events until the event channel closes.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            self.handle_event(event).await;
        }
        info!("Session event channel closed, supervisor stopping");
    }

    /// Run `start` and `run` on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.start().await;
            self.run().await;
        })
    }

    async fn handle_event(&self, event: SessionEvent) {
        let next = self.state().on_event(&event);

        match event {
            SessionEvent::PairingChallenge { code } => {
                info!("Please scan the QR code to link the WhatsApp session");
                match render_pairing_code(&code) {
                    Some(qr) => info!("\n{}", qr),
                    None => info!(pairing_code = %code, "Pairing challenge received"),
                }
                self.publish(SessionSnapshot {
                    pairing_code: Some(code),
                    ..SessionSnapshot::new(next)
                });
            }
            SessionEvent::Ready => {
                info!("WhatsApp session is ready");
                self.transition(next, None);
            }
            SessionEvent::AuthFailure { reason } => {
                error!(%reason, "WhatsApp authentication failed");
                self.transition(next, Some(reason));
            }
            SessionEvent::Disconnected { reason } => {
                warn!(%reason, "WhatsApp session was disconnected");
                self.transition(next, Some(reason));
                self.reinitialize().await;
            }
        }
    }

    /// Tear the session down, then bring the same instance back up.
    async fn reinitialize(&self) {
        if let Err(e) = self.session.destroy().await {
            warn!(error = %e, "Session teardown failed, re-initializing anyway");
        }
        self.transition(SessionState::Uninitialized, None);
        self.initialize().await;
    }

    async fn initialize(&self) {
        match self.session.initialize().await {
            Ok(()) => self.transition(SessionState::AwaitingAuthentication, None),
            Err(e) => {
                error!(error = %e, "Session initialization failed");
                self.transition(SessionState::Uninitialized, Some(e.to_string()));
            }
        }
    }

    fn transition(&self, to: SessionState, detail: Option<String>) {
        self.publish(SessionSnapshot {
            detail,
            ..SessionSnapshot::new(to)
        });
    }

    fn publish(&self, snapshot: SessionSnapshot) {
        let from = self.state();
        if from != snapshot.state {
            info!(%from, to = %snapshot.state, "Session state changed");
        }

        self.state.send_replace(snapshot);
    }
}
