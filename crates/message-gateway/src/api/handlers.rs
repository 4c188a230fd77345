//! HTTP request handlers.

use super::types::{BannerResponse, SendRequest};
use super::AppState;
use crate::dispatch::SendResult;
use crate::error::GatewayError;
use crate::session::SessionSnapshot;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap},
    Json,
};

/// Liveness banner.
pub async fn root() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "🦄🌈✨👋 Server is running 🌍✨🌈🦄".to_string(),
    })
}

/// Send a text message to a contact.
///
/// A body that is empty or not declared as JSON carries no fields and is
/// left to request validation.
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<SendResult, GatewayError> {
    let body = body.map_err(|rejection| state.faults.unreadable_body(rejection))?;

    let request = if body.is_empty() || !is_json(&headers) {
        SendRequest::default()
    } else {
        let Json(request) = Json::<SendRequest>::from_bytes(&body)
            .map_err(|rejection| state.faults.rejection(rejection))?;
        request
    };

    Ok(state.dispatcher.handle(request).await)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Current messaging session state.
pub async fn session_status(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session_state.borrow().clone())
}

/// Fallback for unmatched routes and methods.
pub async fn not_found() -> GatewayError {
    GatewayError::NotFound
}
