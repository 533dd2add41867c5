//! Hub facade tying verification, registration and fan-out together.

use std::sync::Arc;

use reqwest::{Client, Url};

use crate::config::HubConfig;
use crate::error::{Error, Result};
use crate::notifier::Notifier;
use crate::registry::{AddOutcome, SubscriptionRegistry};
use crate::types::{
    PublishMessage, PublishReport, SubscribeRequest, Subscription, VerificationOutcome,
    SUBSCRIBE_MODE,
};
use crate::verifier::IntentVerifier;

/// The publish/subscribe hub.
///
/// One HTTP client is shared by the verifier and the notifier.
pub struct Hub {
    config: HubConfig,
    registry: Arc<SubscriptionRegistry>,
    verifier: IntentVerifier,
    notifier: Notifier,
}

impl Hub {
    /// Create a hub with an empty registry.
    ///
    /// Fails with [`Error::InvalidConfig`] when a timeout or the challenge
    /// length is zero.
    pub fn new(config: HubConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let registry = Arc::new(SubscriptionRegistry::with_policy(config.duplicate_policy));
        let verifier = IntentVerifier::from_config(client.clone(), &config);
        let notifier = Notifier::from_config(client, Arc::clone(&registry), &config);

        Ok(Self {
            config,
            registry,
            verifier,
            notifier,
        })
    }

    /// Hub configuration.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// The subscription registry.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Snapshot of the subscribers of `topic`.
    pub fn subscriptions(&self, topic: &str) -> Vec<Subscription> {
        self.registry.list(topic)
    }

    /// Verify a subscribe request and register it on success.
    ///
    /// Nothing is stored unless the callback echoed the challenge.
    pub async fn subscribe(&self, request: SubscribeRequest) -> Result<Subscription> {
        if request.mode != SUBSCRIBE_MODE {
            return Err(Error::UnsupportedMode(request.mode));
        }
        if request.callback.is_empty() {
            return Err(Error::EmptyCallback);
        }
        let callback = parse_callback(&request.callback)?;

        match self
            .verifier
            .check(&request.mode, &request.topic, &callback)
            .await
        {
            VerificationOutcome::Verified => {}
            VerificationOutcome::Rejected { reason } => {
                return Err(Error::VerificationRejected(reason))
            }
            VerificationOutcome::Unreachable { reason } => {
                return Err(Error::CallbackUnreachable(reason))
            }
        }

        let subscription = Subscription::new(request.topic, callback, request.secret);
        let outcome = self.registry.add(subscription.clone());

        tracing::info!(
            topic = %subscription.topic,
            callback = %subscription.callback,
            signed = subscription.is_signed(),
            replaced = outcome == AddOutcome::Replaced,
            "subscription registered"
        );

        Ok(subscription)
    }

    /// Deliver a message to every subscriber of its topic.
    pub async fn publish(&self, message: PublishMessage) -> Result<PublishReport> {
        self.notifier.publish(&message).await
    }
}

/// Shared hub handle.
pub type SharedHub = Arc<Hub>;

/// Parse a callback into an absolute http(s) URL.
fn parse_callback(callback: &str) -> Result<Url> {
    let url = Url::parse(callback).map_err(|e| Error::InvalidCallback(format!("{}: {}", callback, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidCallback(format!(
            "unsupported scheme {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn hub() -> Hub {
        Hub::new(HubConfig::default()).unwrap()
    }

    #[test]
    fn test_zero_timeouts_are_refused() {
        let zero_delivery = HubConfig::default().with_delivery_timeout(Duration::ZERO);
        assert!(matches!(Hub::new(zero_delivery), Err(Error::InvalidConfig(_))));

        let mut zero_verification = HubConfig::default();
        zero_verification.verification_timeout = Duration::ZERO;
        assert!(matches!(Hub::new(zero_verification), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_callback() {
        assert!(parse_callback("http://localhost:8080/cb").is_ok());
        assert!(parse_callback("https://example.com/cb?x=1").is_ok());
        assert!(matches!(
            parse_callback("ftp://example.com/cb"),
            Err(Error::InvalidCallback(_))
        ));
        assert!(matches!(
            parse_callback("/relative/path"),
            Err(Error::InvalidCallback(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_callback_is_refused_without_state() {
        let hub = hub();
        let err = hub
            .subscribe(SubscribeRequest::new("/a/topic", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyCallback));
        assert!(hub.subscriptions("/a/topic").is_empty());
    }

    #[tokio::test]
    async fn test_other_modes_are_refused() {
        let hub = hub();
        let err = hub
            .subscribe(SubscribeRequest::new("/a/topic", "http://localhost:1/cb").with_mode("unsubscribe"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMode(mode) if mode == "unsubscribe"));
        assert_eq!(hub.registry().subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_callback_is_refused() {
        let hub = hub();
        let err = hub
            .subscribe(SubscribeRequest::new("/a/topic", "not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCallback(_)));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let report = hub()
            .publish(PublishMessage::new("/a/topic", "hej"))
            .await
            .unwrap();
        assert_eq!(report.attempted(), 0);
    }
}
