//! Common test utilities for integration tests.

use async_trait::async_trait;
use axum::Router;
use message_gateway::{
    api::{create_router, AppState},
    AddressNormalizer, DeliveryPolicy, Dispatcher, FaultReporter, SessionSnapshot, SessionState,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use whatsapp_client::{MessagingSession, SessionError};

/// How the fake session answers sends.
#[derive(Clone, Default)]
pub enum Outcome {
    #[default]
    Deliver,
    Reject(String),
    Hang,
    Panic,
}

/// Session that records every send.
#[derive(Default)]
pub struct FakeSession {
    pub sent: Mutex<Vec<(String, String)>>,
    pub outcome: Outcome,
}

impl FakeSession {
    pub fn with_outcome(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            ..Default::default()
        })
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingSession for FakeSession {
    async fn initialize(&self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn destroy(&self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn send_text(&self, address: &str, text: &str) -> Result<(), SessionError> {
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), text.to_string()));

        match &self.outcome {
            Outcome::Deliver => Ok(()),
            Outcome::Reject(msg) => Err(SessionError::Rejected(msg.clone())),
            Outcome::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            Outcome::Panic => panic!("bridge exploded"),
        }
    }
}

/// Options for building a test app.
pub struct TestApp {
    pub session: Arc<FakeSession>,
    pub state: SessionState,
    pub policy: DeliveryPolicy,
    pub node_env: &'static str,
}

impl TestApp {
    pub fn new(session: Arc<FakeSession>) -> Self {
        Self {
            session,
            state: SessionState::Ready,
            policy: DeliveryPolicy::default(),
            node_env: "production",
        }
    }

    /// Build the router. The returned sender keeps the session state alive.
    pub fn router(self) -> (Router, watch::Sender<SessionSnapshot>) {
        let (tx, rx) = watch::channel(SessionSnapshot::new(self.state));
        let dispatcher = Dispatcher::new(
            self.session,
            AddressNormalizer::default(),
            rx.clone(),
            self.policy,
        );
        let state = AppState::new(
            dispatcher,
            rx,
            FaultReporter::for_environment(self.node_env),
        );
        (create_router(state), tx)
    }
}
