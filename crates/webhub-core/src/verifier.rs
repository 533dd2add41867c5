//! Intent verification handshake.
//!
//! Before a subscription is stored the hub sends
//! `GET <callback>?hub.mode=..&hub.topic=..&hub.challenge=..` and expects a
//! 2xx answer whose body is exactly the challenge. Anything else, including
//! transport errors and timeouts, counts as a failed verification.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::challenge;
use crate::config::HubConfig;
use crate::error::describe_transport;
use crate::types::VerificationOutcome;

/// Performs the challenge/response handshake against candidate callbacks.
#[derive(Debug, Clone)]
pub struct IntentVerifier {
    client: Client,
    challenge_length: usize,
    timeout: Duration,
}

impl IntentVerifier {
    /// Create a verifier.
    pub fn new(client: Client, challenge_length: usize, timeout: Duration) -> Self {
        Self {
            client,
            challenge_length,
            timeout,
        }
    }

    /// Create a verifier from hub configuration.
    pub fn from_config(client: Client, config: &HubConfig) -> Self {
        Self::new(client, config.challenge_length, config.verification_timeout)
    }

    /// Length of the challenges this verifier generates.
    pub fn challenge_length(&self) -> usize {
        self.challenge_length
    }

    /// Run the handshake; true iff the callback echoed the challenge.
    pub async fn verify(&self, mode: &str, topic: &str, callback: &Url) -> bool {
        self.check(mode, topic, callback).await.is_verified()
    }

    /// Run the handshake with a freshly generated challenge.
    pub async fn check(&self, mode: &str, topic: &str, callback: &Url) -> VerificationOutcome {
        let challenge = challenge::generate(self.challenge_length);
        self.check_with_challenge(mode, topic, callback, &challenge)
            .await
    }

    /// Run the handshake with the given challenge.
    pub async fn check_with_challenge(
        &self,
        mode: &str,
        topic: &str,
        callback: &Url,
        challenge: &str,
    ) -> VerificationOutcome {
        let outcome = self.handshake(mode, topic, callback, challenge).await;

        match &outcome {
            VerificationOutcome::Verified => {
                tracing::debug!(topic, callback = %callback, "intent verified");
            }
            VerificationOutcome::Rejected { reason } => {
                tracing::warn!(topic, callback = %callback, reason = %reason, "intent verification rejected");
            }
            VerificationOutcome::Unreachable { reason } => {
                tracing::warn!(topic, callback = %callback, reason = %reason, "callback unreachable during verification");
            }
        }

        outcome
    }

    async fn handshake(
        &self,
        mode: &str,
        topic: &str,
        callback: &Url,
        challenge: &str,
    ) -> VerificationOutcome {
        let request = self
            .client
            .get(callback.clone())
            .query(&[
                ("hub.mode", mode),
                ("hub.topic", topic),
                ("hub.challenge", challenge),
            ])
            .timeout(self.timeout);

        let mut response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                return VerificationOutcome::Unreachable {
                    reason: describe_transport(&err),
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            return VerificationOutcome::Rejected {
                reason: format!("callback answered {}", status),
            };
        }

        // Read no more than the challenge length; a longer body cannot match.
        let expected = challenge.as_bytes();
        let mut body = Vec::with_capacity(expected.len());
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > expected.len() {
                        return VerificationOutcome::Rejected {
                            reason: "response body longer than challenge".to_string(),
                        };
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(err) => {
                    return VerificationOutcome::Unreachable {
                        reason: describe_transport(&err),
                    }
                }
            }
        }

        if body == expected {
            VerificationOutcome::Verified
        } else {
            VerificationOutcome::Rejected {
                reason: "challenge mismatch".to_string(),
            }
        }
    }
}
