//! Error types for the message gateway.

use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::any::Any;
use thiserror::Error;

/// Stand-in for fault traces in production.
pub const REDACTED_STACK: &str = "🥞";

/// Gateway error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Not Found")]
    NotFound,

    /// Anything that escaped normal request handling.
    #[error("{message}")]
    Fault {
        status: StatusCode,
        message: String,
        stack: String,
    },
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Fault response body.
#[derive(Debug, Serialize)]
pub struct FaultResponse {
    pub message: String,
    pub stack: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Not Found".to_string(),
                }),
            )
                .into_response(),
            GatewayError::Fault {
                status,
                message,
                stack,
            } => (status, Json(FaultResponse { message, stack })).into_response(),
        }
    }
}

/// Turns unhandled failures into fault responses.
///
/// Outside production the full error chain goes back to the client.
#[derive(Debug, Clone, Copy)]
pub struct FaultReporter {
    expose_stack: bool,
}

impl FaultReporter {
    pub fn new(expose_stack: bool) -> Self {
        Self { expose_stack }
    }

    /// Reporter for a `NODE_ENV`-style deployment mode.
    pub fn for_environment(node_env: &str) -> Self {
        Self::new(node_env != crate::config::PRODUCTION)
    }

    /// Fault for an error, keeping `status` (500 if it is not an error status).
    pub fn fault(&self, status: StatusCode, error: &anyhow::Error) -> GatewayError {
        let status = if status.is_client_error() || status.is_server_error() {
            status
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        GatewayError::Fault {
            status,
            message: error.to_string(),
            stack: self.stack(|| format!("{:?}", error)),
        }
    }

    /// Fault for a body that is not valid JSON for the request type.
    ///
    /// Nothing has set a status by the time the body is parsed, so this is
    /// always a 500.
    pub fn rejection(&self, rejection: JsonRejection) -> GatewayError {
        let message = rejection.body_text();
        self.fault(
            StatusCode::INTERNAL_SERVER_ERROR,
            &anyhow::Error::new(rejection).context(message),
        )
    }

    /// Fault for a body that could not be read at all.
    pub fn unreadable_body(&self, rejection: BytesRejection) -> GatewayError {
        let message = rejection.body_text();
        self.fault(
            StatusCode::INTERNAL_SERVER_ERROR,
            &anyhow::Error::new(rejection).context(message),
        )
    }

    /// Response for a panicking handler.
    pub fn panic_response(&self, panic: Box<dyn Any + Send + 'static>) -> Response {
        let message = if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = panic.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "handler panicked".to_string()
        };

        tracing::error!(%message, "Request handler panicked");

        GatewayError::Fault {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            stack: self.stack(|| format!("panic: {}", message)),
            message,
        }
        .into_response()
    }

    fn stack(&self, full: impl FnOnce() -> String) -> String {
        if self.expose_stack {
            full()
        } else {
            REDACTED_STACK.to_string()
        }
    }
}
