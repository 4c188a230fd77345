//! Send request handling.

use crate::address::AddressNormalizer;
use crate::session::{SessionSnapshot, SessionState};
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use whatsapp_client::MessagingSession;

/// Validation message for absent or empty fields.
pub const MISSING_FIELDS: &str = "Contact and message are required";

/// Inbound send request. Fields stay optional so absence is a validation
/// failure rather than a body parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendRequest {
    pub contact: Option<String>,
    pub message: Option<String>,
}

impl SendRequest {
    pub fn new(contact: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            contact: Some(contact.into()),
            message: Some(message.into()),
        }
    }
}

/// Why a send did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    DeliveryFailed,
    SessionNotReady,
}

impl FailureKind {
    pub fn status(&self) -> StatusCode {
        match self {
            FailureKind::Validation => StatusCode::BAD_REQUEST,
            FailureKind::DeliveryFailed => StatusCode::INTERNAL_SERVER_ERROR,
            FailureKind::SessionNotReady => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Outcome of a send request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResult {
    Success(String),
    Failure { kind: FailureKind, detail: String },
}

impl SendResult {
    fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        SendResult::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SendResult::Success(_) => StatusCode::OK,
            SendResult::Failure { kind, .. } => kind.status(),
        }
    }
}

/// Delivery policy knobs.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// Upper bound on a single send
    pub send_timeout: Duration,
    /// Refuse to send unless the session is ready
    pub require_ready: bool,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(30),
            require_ready: false,
        }
    }
}

/// Validates send requests and hands them to the messaging session.
///
/// Cheap to clone; every request handler task gets its own copy.
#[derive(Clone)]
pub struct Dispatcher {
    session: Arc<dyn MessagingSession>,
    normalizer: Arc<AddressNormalizer>,
    state: watch::Receiver<SessionSnapshot>,
    policy: DeliveryPolicy,
}

impl Dispatcher {
    pub fn new(
        session: Arc<dyn MessagingSession>,
        normalizer: AddressNormalizer,
        state: watch::Receiver<SessionSnapshot>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            session,
            normalizer: Arc::new(normalizer),
            state,
            policy,
        }
    }

    /// Handle one send request.
    pub async fn handle(&self, request: SendRequest) -> SendResult {
        let (contact, message) = match (request.contact, request.message) {
            (Some(c), Some(m)) if !c.is_empty() && !m.is_empty() => (c, m),
            _ => {
                debug!("Rejecting send request with missing fields");
                return SendResult::failure(FailureKind::Validation, MISSING_FIELDS);
            }
        };

        info!(%contact, "Received send request");
        debug!(length = message.len(), "Message body");

        let address = match self.normalizer.normalize(&contact) {
            Ok(address) => address,
            Err(e) => return SendResult::failure(FailureKind::Validation, e.to_string()),
        };
        info!(%address, "Formatted number");

        if self.policy.require_ready {
            let state = self.state.borrow().state;
            if state != SessionState::Ready {
                warn!(%state, "Refusing send, session not ready");
                return SendResult::failure(FailureKind::SessionNotReady, state.as_str());
            }
        }

        let send = self.session.send_text(address.as_str(), &message);
        match tokio::time::timeout(self.policy.send_timeout, send).await {
            Ok(Ok(())) => {
                info!(%address, "Message sent");
                SendResult::Success(format!("Message sent to {}", contact))
            }
            Ok(Err(e)) => {
                error!(%address, error = %e, "Error sending message");
                SendResult::failure(FailureKind::DeliveryFailed, e.to_string())
            }
            Err(_) => {
                error!(%address, timeout = ?self.policy.send_timeout, "Send timed out");
                SendResult::failure(
                    FailureKind::DeliveryFailed,
                    format!("send timed out after {:?}", self.policy.send_timeout),
                )
            }
        }
    }
}
