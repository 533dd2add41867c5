//! Gateway configuration.

use std::time::Duration;

use clap::Parser;
use webhub_core::{DuplicatePolicy, HubConfig};

/// Default maximum inbound request body size (64 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// webhub gateway command line arguments.
#[derive(Debug, Parser)]
#[command(name = "webhub-gateway")]
#[command(about = "Webhook publish/subscribe hub")]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Length of verification challenges.
    #[arg(long, default_value_t = 10)]
    pub challenge_length: usize,

    /// Timeout (ms) for the verification handshake with a callback.
    #[arg(long, default_value_t = 10_000)]
    pub verification_timeout_ms: u64,

    /// Timeout (ms) for each delivery to a subscriber.
    #[arg(long, default_value_t = 10_000)]
    pub delivery_timeout_ms: u64,

    /// TCP connect timeout (ms) for outbound requests.
    #[arg(long, default_value_t = 5_000)]
    pub connect_timeout_ms: u64,

    /// Replace an existing (topic, callback) subscription instead of adding another.
    #[arg(long)]
    pub replace_duplicates: bool,

    /// Maximum accepted request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on for HTTP requests.
    pub listen_addr: String,
    /// Length of verification challenges.
    pub challenge_length: usize,
    /// Timeout for the verification handshake.
    pub verification_timeout: Duration,
    /// Timeout for each delivery.
    pub delivery_timeout: Duration,
    /// TCP connect timeout for outbound requests.
    pub connect_timeout: Duration,
    /// Handling of repeated (topic, callback) subscriptions.
    pub duplicate_policy: DuplicatePolicy,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl GatewayConfig {
    /// Core hub configuration derived from the gateway settings.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig::new()
            .with_challenge_length(self.challenge_length)
            .with_verification_timeout(self.verification_timeout)
            .with_delivery_timeout(self.delivery_timeout)
            .with_connect_timeout(self.connect_timeout)
            .with_duplicate_policy(self.duplicate_policy)
    }
}

impl From<&Args> for GatewayConfig {
    fn from(args: &Args) -> Self {
        Self {
            listen_addr: args.listen.clone(),
            challenge_length: args.challenge_length,
            verification_timeout: Duration::from_millis(args.verification_timeout_ms),
            delivery_timeout: Duration::from_millis(args.delivery_timeout_ms),
            connect_timeout: Duration::from_millis(args.connect_timeout_ms),
            duplicate_policy: if args.replace_duplicates {
                DuplicatePolicy::Replace
            } else {
                DuplicatePolicy::Allow
            },
            max_body_bytes: args.max_body_bytes,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let hub = HubConfig::default();
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            challenge_length: hub.challenge_length,
            verification_timeout: hub.verification_timeout,
            delivery_timeout: hub.delivery_timeout,
            connect_timeout: hub.connect_timeout,
            duplicate_policy: hub.duplicate_policy,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}
