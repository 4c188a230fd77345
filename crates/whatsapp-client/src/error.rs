//! WhatsApp session errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bridge error: {0}")]
    Bridge(String),

    /// The session refused to deliver a message. Displays the bare reason.
    #[error("{0}")]
    Rejected(String),
}
