//! API request and response types.

use crate::dispatch::{FailureKind, SendResult};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub use crate::dispatch::SendRequest;

/// Liveness banner.
#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub message: String,
}

/// Successful send.
#[derive(Debug, Serialize)]
pub struct SendSuccessResponse {
    pub success: String,
}

/// Failed send.
#[derive(Debug, Serialize)]
pub struct SendFailureResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for SendResult {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            SendResult::Success(success) => {
                (status, Json(SendSuccessResponse { success })).into_response()
            }
            SendResult::Failure { kind, detail } => {
                let body = match kind {
                    FailureKind::Validation => SendFailureResponse {
                        error: detail,
                        details: None,
                    },
                    FailureKind::DeliveryFailed => SendFailureResponse {
                        error: "Failed to send message".to_string(),
                        details: Some(detail),
                    },
                    FailureKind::SessionNotReady => SendFailureResponse {
                        error: "Messaging session is not ready".to_string(),
                        details: Some(detail),
                    },
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
