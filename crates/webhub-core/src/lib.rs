//! webhub core - subscription registry, intent verification and signed fan-out.
//!
//! A hub sits between publishers and subscribers. Subscribers register a
//! callback URL for a topic; the hub confirms the request with a
//! challenge/response handshake before storing it. Publishers announce a
//! message for a topic and the hub POSTs it to every registered callback,
//! signing the body with HMAC-SHA256 when the subscriber supplied a secret.
//!
//! The HTTP surface lives in `webhub-gateway`; this crate only sees
//! already-decoded fields.

pub mod challenge;
pub mod config;
pub mod error;
pub mod hub;
pub mod notifier;
pub mod registry;
pub mod signer;
pub mod types;
pub mod verifier;

pub use config::{DuplicatePolicy, HubConfig};
pub use error::{Error, Result};
pub use hub::{Hub, SharedHub};
pub use notifier::Notifier;
pub use registry::{AddOutcome, SubscriptionRegistry};
pub use types::{
    DeliveryOutcome, DeliveryReport, PublishMessage, PublishReport, SubscribeRequest,
    Subscription, VerificationOutcome, SUBSCRIBE_MODE,
};
pub use verifier::IntentVerifier;

pub use reqwest::Url;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
