//! Message Gateway - HTTP front door for a supervised WhatsApp session.
//!
//! The gateway:
//! - Normalizes loosely typed local phone numbers into network addresses
//! - Forwards text messages to the messaging session with a bounded wait
//! - Keeps the session alive, re-initializing it whenever it disconnects

pub mod address;
pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod session;

pub use address::{AddressError, AddressNormalizer, CanonicalAddress};
pub use config::Config;
pub use dispatch::{DeliveryPolicy, Dispatcher, FailureKind, SendRequest, SendResult};
pub use error::{FaultReporter, GatewayError};
pub use session::{SessionSnapshot, SessionState, SessionSupervisor};
