//! HTTP API for the message gateway.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, with_security_headers};
pub use types::*;

use crate::dispatch::Dispatcher;
use crate::error::FaultReporter;
use crate::session::SessionSnapshot;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::any::Any;
use tokio::sync::watch;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Send request handling
    pub dispatcher: Dispatcher,
    /// Published session state
    pub session_state: watch::Receiver<SessionSnapshot>,
    /// Fault rendering for the deployment mode
    pub faults: FaultReporter,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        dispatcher: Dispatcher,
        session_state: watch::Receiver<SessionSnapshot>,
        faults: FaultReporter,
    ) -> Self {
        Self {
            dispatcher,
            session_state,
            faults,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let faults = state.faults;

    let router = Router::new()
        .route("/", get(handlers::root).fallback(handlers::not_found))
        .route(
            "/api/v1/send-message",
            post(handlers::send_message).fallback(handlers::not_found),
        )
        .route(
            "/api/v1/session",
            get(handlers::session_status).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn(logging_middleware));

    with_security_headers(router)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn Any + Send + 'static>| faults.panic_response(panic),
        ))
        .with_state(state)
}
