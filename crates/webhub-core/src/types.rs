//! Subscription records, publish messages and outcome types.

use std::fmt;

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

/// The only `hub.mode` value the hub handles.
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// A verified subscription.
///
/// Identity is the (topic, callback) pair. An empty secret means deliveries
/// are sent unsigned.
#[derive(Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Topic the subscriber listens to.
    pub topic: String,
    /// Endpoint receiving verification and delivery requests.
    pub callback: Url,
    /// Shared HMAC secret, possibly empty.
    pub secret: String,
}

impl Subscription {
    /// Create a new subscription record.
    pub fn new(topic: impl Into<String>, callback: Url, secret: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            callback,
            secret: secret.into(),
        }
    }

    /// Whether deliveries to this subscriber carry a signature header.
    pub fn is_signed(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Whether this record has the same (topic, callback) identity as another.
    pub fn same_identity(&self, other: &Subscription) -> bool {
        self.topic == other.topic && self.callback == other.callback
    }
}

// Keeps secrets out of logs.
impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("callback", &self.callback.as_str())
            .field("signed", &self.is_signed())
            .finish()
    }
}

/// Decoded subscribe request fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeRequest {
    /// `hub.mode`.
    pub mode: String,
    /// `hub.topic`.
    pub topic: String,
    /// `hub.callback`.
    pub callback: String,
    /// `hub.secret`, empty when absent.
    pub secret: String,
}

impl SubscribeRequest {
    /// Create a subscribe-mode request without a secret.
    pub fn new(topic: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            mode: SUBSCRIBE_MODE.to_string(),
            topic: topic.into(),
            callback: callback.into(),
            secret: String::new(),
        }
    }

    /// Set the mode.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Set the shared secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }
}

/// A message announced by a publisher.
///
/// Serializes as `{"message": .., "topic": ..}`; the field order is part of
/// the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMessage {
    /// Message content.
    pub message: String,
    /// Topic it was published to.
    pub topic: String,
}

impl PublishMessage {
    /// Create a new publish message.
    pub fn new(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            topic: topic.into(),
        }
    }

    /// Serialize to the delivery body.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Result of an intent verification handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The callback echoed the challenge with a 2xx status.
    Verified,
    /// The callback answered, but wrongly.
    Rejected {
        /// Why the answer was refused.
        reason: String,
    },
    /// No usable answer: connection error or timeout.
    Unreachable {
        /// Transport error description.
        reason: String,
    },
}

impl VerificationOutcome {
    /// Whether the handshake succeeded.
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified)
    }
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The subscriber answered with a 2xx status.
    Delivered {
        /// Response status.
        status: StatusCode,
    },
    /// The subscriber answered with a non-2xx status.
    Rejected {
        /// Response status.
        status: StatusCode,
    },
    /// The request failed before a response arrived.
    Failed {
        /// Transport error description.
        reason: String,
    },
}

impl DeliveryOutcome {
    /// Whether the subscriber accepted the delivery.
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Outcome of one delivery, keyed by its callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Callback the delivery was sent to.
    pub callback: Url,
    /// What happened.
    pub outcome: DeliveryOutcome,
}

/// Outcome of a publish fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Topic that was published to.
    pub topic: String,
    /// One entry per subscriber, in completion order.
    pub deliveries: Vec<DeliveryReport>,
}

impl PublishReport {
    /// Create an empty report for a topic.
    pub fn empty(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            deliveries: Vec::new(),
        }
    }

    /// Number of delivery attempts.
    pub fn attempted(&self) -> usize {
        self.deliveries.len()
    }

    /// Number of deliveries acknowledged with 2xx.
    pub fn delivered(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| d.outcome.is_delivered())
            .count()
    }

    /// Number of deliveries that were rejected or failed.
    pub fn failed(&self) -> usize {
        self.attempted() - self.delivered()
    }
}
