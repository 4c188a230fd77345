//! WhatsApp Web bridge client.
//!
//! The bridge sidecar owns the actual WhatsApp Web session. This crate drives
//! its lifecycle over HTTP, turns its long-polled events into [`SessionEvent`]s
//! and delivers text messages to canonical `<digits>@c.us` addresses.

mod client;
mod error;
mod receiver;
mod session;
mod types;

pub use client::BridgeSession;
pub use error::SessionError;
pub use receiver::event_channel;
pub use session::MessagingSession;
pub use types::*;
