//! Configuration for the message gateway.

use crate::address::{AddressNormalizer, DEFAULT_COUNTRY_CODE, DEFAULT_SUFFIX};
use crate::dispatch::DeliveryPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Deployment mode that hides fault traces from clients.
pub const PRODUCTION: &str = "production";

/// Gateway configuration.
///
/// `PORT` and `NODE_ENV` are read as flat variables; everything else is nested
/// with a `__` separator (e.g. `DELIVERY__SEND_TIMEOUT=10s`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment mode
    #[serde(default = "default_node_env")]
    pub node_env: String,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp bridge configuration
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Delivery policy configuration
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Address normalization configuration
    #[serde(default)]
    pub address: AddressConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    /// Bridge sidecar base URL
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Timeout for lifecycle and send requests to the bridge
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Long-poll timeout for session events
    #[serde(default = "default_poll_timeout", with = "humantime_serde")]
    pub poll_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Upper bound on a single send
    #[serde(default = "default_send_timeout", with = "humantime_serde")]
    pub send_timeout: Duration,

    /// Refuse sends while the session is not ready
    #[serde(default)]
    pub require_ready: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressConfig {
    /// Country calling code substituted for the trunk prefix
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Network address suffix
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            request_timeout: default_request_timeout(),
            poll_timeout: default_poll_timeout(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            send_timeout: default_send_timeout(),
            require_ready: false,
        }
    }
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self {
            country_code: default_country_code(),
            suffix: default_suffix(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    8087
}

fn default_node_env() -> String {
    PRODUCTION.into()
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:3001".into()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_send_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.into()
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.normalizer()?;
        Ok(config)
    }

    /// Build the address normalizer from the `address` section.
    pub fn normalizer(&self) -> Result<AddressNormalizer> {
        AddressNormalizer::new(&self.address.country_code, &self.address.suffix)
            .context("Invalid address configuration")
    }

    /// Delivery policy from the `delivery` section.
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            send_timeout: self.delivery.send_timeout,
            require_ready: self.delivery.require_ready,
        }
    }
}
