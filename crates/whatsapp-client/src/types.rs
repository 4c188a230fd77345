//! Bridge wire types and session events.

use serde::{Deserialize, Serialize};

/// Lifecycle event emitted by a messaging session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A pairing code (rendered as a QR code by the phone app) must be scanned.
    PairingChallenge { code: String },
    /// The session is authenticated and able to send.
    Ready,
    /// Authentication was rejected.
    AuthFailure { reason: String },
    /// The connection to the messaging network was lost.
    Disconnected { reason: String },
}

impl SessionEvent {
    /// Short event name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::PairingChallenge { .. } => "pairing_challenge",
            SessionEvent::Ready => "ready",
            SessionEvent::AuthFailure { .. } => "auth_failure",
            SessionEvent::Disconnected { .. } => "disconnected",
        }
    }
}

/// Event as delivered by the bridge's `/events/poll` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    Qr {
        code: String,
    },
    Ready,
    AuthFailure {
        #[serde(default)]
        message: Option<String>,
    },
    Disconnected {
        #[serde(default)]
        reason: Option<String>,
    },
    /// Anything the gateway does not act on (incoming messages, loading screens...).
    #[serde(other)]
    Other,
}

impl BridgeEvent {
    /// Convert into a session event, dropping events the gateway ignores.
    pub fn into_session_event(self) -> Option<SessionEvent> {
        match self {
            BridgeEvent::Qr { code } => Some(SessionEvent::PairingChallenge { code }),
            BridgeEvent::Ready => Some(SessionEvent::Ready),
            BridgeEvent::AuthFailure { message } => Some(SessionEvent::AuthFailure {
                reason: message.unwrap_or_else(|| "unknown".into()),
            }),
            BridgeEvent::Disconnected { reason } => Some(SessionEvent::Disconnected {
                reason: reason.unwrap_or_else(|| "unknown".into()),
            }),
            BridgeEvent::Other => None,
        }
    }
}

/// Outgoing text message request.
#[derive(Debug, Clone, Serialize)]
pub struct SendTextRequest {
    #[serde(rename = "chatId")]
    pub chat_id: String,
    pub text: String,
}

/// Error body returned by the bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeErrorBody {
    pub error: String,
}
