//! The messaging session contract.

use crate::error::SessionError;
use async_trait::async_trait;

/// A messaging session that can be (re)established and used to deliver text.
///
/// Lifecycle events are not returned from these calls. Implementations push
/// them as [`crate::SessionEvent`]s onto the channel they were built with, so
/// `initialize` returns as soon as establishment has *started*.
#[async_trait]
pub trait MessagingSession: Send + Sync {
    /// Begin establishing the session.
    async fn initialize(&self) -> Result<(), SessionError>;

    /// Tear the session down. The same instance may be initialized again.
    async fn destroy(&self) -> Result<(), SessionError>;

    /// Deliver `text` to a canonical network address such as `8562055551234@c.us`.
    async fn send_text(&self, address: &str, text: &str) -> Result<(), SessionError>;
}
