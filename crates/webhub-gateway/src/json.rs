//! JSON response types for the HTTP gateway.

use serde::Serialize;
use webhub_core::{PublishReport, Subscription};

/// Scheme, host, port and path of a callback.
///
/// Query strings and userinfo often carry capability tokens, so they are
/// never echoed to other callers.
pub fn redacted_callback(callback: &webhub_core::Url) -> String {
    format!("{}{}", callback.origin().ascii_serialization(), callback.path())
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Gateway version.
    pub version: String,
    /// Topics with at least one subscriber.
    pub topics: usize,
    /// Registered subscriptions.
    pub subscriptions: usize,
}

/// Acknowledgement of a verified subscription.
#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    /// Success flag.
    pub success: bool,
    /// Verification outcome.
    pub outcome: String,
    /// Subscribed topic.
    pub topic: String,
    /// Registered callback.
    pub callback: String,
}

impl From<&Subscription> for SubscribeResponse {
    fn from(subscription: &Subscription) -> Self {
        Self {
            success: true,
            outcome: "verified".to_string(),
            topic: subscription.topic.clone(),
            callback: subscription.callback.to_string(),
        }
    }
}

/// Summary of a publish fan-out.
///
/// Callbacks are not listed; publishers are not authenticated.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    /// Success flag.
    pub success: bool,
    /// Topic published to.
    pub topic: String,
    /// Delivery attempts.
    pub subscribers: usize,
    /// Deliveries acknowledged with 2xx.
    pub delivered: usize,
    /// Deliveries rejected or failed.
    pub failed: usize,
}

impl From<PublishReport> for PublishResponse {
    fn from(report: PublishReport) -> Self {
        Self {
            success: true,
            subscribers: report.attempted(),
            delivered: report.delivered(),
            failed: report.failed(),
            topic: report.topic,
        }
    }
}

/// Subscribers of a topic, without secrets.
#[derive(Debug, Serialize)]
pub struct SubscriptionsResponse {
    /// Topic queried.
    pub topic: String,
    /// Redacted callbacks in registration order.
    pub callbacks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_callback_drops_tokens() {
        let url = webhub_core::Url::parse("https://user:pw@example.com:8443/hooks/cb?token=abc#frag")
            .unwrap();
        assert_eq!(redacted_callback(&url), "https://example.com:8443/hooks/cb");

        let plain = webhub_core::Url::parse("http://127.0.0.1:9000/callback").unwrap();
        assert_eq!(redacted_callback(&plain), "http://127.0.0.1:9000/callback");
    }
}
