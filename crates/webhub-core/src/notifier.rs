//! Signed fan-out of published messages.
//!
//! A publish serializes `{"message": .., "topic": ..}` once and POSTs the same
//! bytes to every subscriber of the topic. Each delivery runs as its own tokio
//! task with its own timeout, so a slow or failing subscriber only affects its
//! own entry in the report, and deliveries already started keep running if
//! the caller stops waiting for the report. There is no retry: delivery is
//! best-effort and at-most-once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::HubConfig;
use crate::error::{describe_transport, Result};
use crate::registry::SubscriptionRegistry;
use crate::signer;
use crate::types::{DeliveryOutcome, DeliveryReport, PublishMessage, PublishReport, Subscription};
use crate::SIGNATURE_HEADER;

/// Delivers published messages to the subscribers of a topic.
///
/// Publishing spawns tasks and must run inside a tokio runtime.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    registry: Arc<SubscriptionRegistry>,
    timeout: Duration,
}

impl Notifier {
    /// Create a notifier reading subscribers from `registry`.
    pub fn new(client: Client, registry: Arc<SubscriptionRegistry>, timeout: Duration) -> Self {
        Self {
            client,
            registry,
            timeout,
        }
    }

    /// Create a notifier from hub configuration.
    pub fn from_config(client: Client, registry: Arc<SubscriptionRegistry>, config: &HubConfig) -> Self {
        Self::new(client, registry, config.delivery_timeout)
    }

    /// Fan `message` out to every subscriber of `topic`.
    pub async fn notify(&self, topic: &str, message: &str) -> Result<PublishReport> {
        self.publish(&PublishMessage::new(topic, message)).await
    }

    /// Fan a publish message out to every subscriber of its topic.
    ///
    /// Every delivery is spawned before the first one is awaited. Dropping the
    /// returned future only discards the report.
    pub async fn publish(&self, message: &PublishMessage) -> Result<PublishReport> {
        let subscribers = self.registry.list(&message.topic);
        if subscribers.is_empty() {
            tracing::debug!(topic = %message.topic, "no subscribers for topic");
            return Ok(PublishReport::empty(&message.topic));
        }

        let payload = Bytes::from(message.to_payload()?);

        let pending: Vec<_> = subscribers
            .into_iter()
            .map(|subscription| self.spawn_delivery(subscription, payload.clone()))
            .collect();
        let deliveries = join_all(pending).await;

        let report = PublishReport {
            topic: message.topic.clone(),
            deliveries,
        };

        tracing::info!(
            topic = %report.topic,
            attempted = report.attempted(),
            delivered = report.delivered(),
            failed = report.failed(),
            "publish fan-out complete"
        );

        Ok(report)
    }

    /// Start delivering to one subscriber on its own task.
    fn spawn_delivery(
        &self,
        subscription: Subscription,
        payload: Bytes,
    ) -> impl Future<Output = DeliveryReport> {
        let notifier = self.clone();
        let callback = subscription.callback.clone();
        let handle = tokio::spawn(async move { notifier.deliver(&subscription, payload).await });

        async move {
            handle.await.unwrap_or_else(|err| {
                tracing::error!(callback = %callback, error = %err, "delivery task failed");
                DeliveryReport {
                    callback,
                    outcome: DeliveryOutcome::Failed {
                        reason: format!("delivery task failed: {}", err),
                    },
                }
            })
        }
    }

    /// POST `payload` to one subscriber, signing it when the subscriber has a secret.
    pub async fn deliver(&self, subscription: &Subscription, payload: Bytes) -> DeliveryReport {
        let outcome = self.send(subscription, payload).await;

        match &outcome {
            DeliveryOutcome::Delivered { status } => {
                tracing::trace!(callback = %subscription.callback, %status, "delivered");
            }
            DeliveryOutcome::Rejected { status } => {
                tracing::warn!(callback = %subscription.callback, %status, "delivery rejected by subscriber");
            }
            DeliveryOutcome::Failed { reason } => {
                tracing::warn!(callback = %subscription.callback, reason = %reason, "delivery failed");
            }
        }

        DeliveryReport {
            callback: subscription.callback.clone(),
            outcome,
        }
    }

    async fn send(&self, subscription: &Subscription, payload: Bytes) -> DeliveryOutcome {
        let signature = signer::signature_header(&subscription.secret, &payload);

        let mut request = self
            .client
            .post(subscription.callback.clone())
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .body(payload);

        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => DeliveryOutcome::Delivered {
                status: response.status(),
            },
            Ok(response) => DeliveryOutcome::Rejected {
                status: response.status(),
            },
            Err(err) => DeliveryOutcome::Failed {
                reason: describe_transport(&err),
            },
        }
    }
}
