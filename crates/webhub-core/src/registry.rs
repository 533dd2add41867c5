//! Topic -> subscriber registry.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::config::DuplicatePolicy;
use crate::types::Subscription;

/// What `add` did with a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new entry was appended.
    Added,
    /// An entry with the same (topic, callback) had its secret replaced.
    Replaced,
}

/// In-memory registry of verified subscriptions, keyed by topic.
///
/// All reads and writes go through one lock. `list` hands out copies so a
/// fan-out never iterates the live structure.
pub struct SubscriptionRegistry {
    /// Subscriptions by topic, in registration order.
    topics: RwLock<HashMap<String, Vec<Subscription>>>,
    /// Handling of repeated (topic, callback) registrations.
    policy: DuplicatePolicy,
}

impl SubscriptionRegistry {
    /// Create an empty registry that keeps duplicate registrations.
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::Allow)
    }

    /// Create an empty registry with the given duplicate policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// The duplicate policy in effect.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register a subscription under its topic.
    pub fn add(&self, subscription: Subscription) -> AddOutcome {
        let mut topics = self.topics.write();
        let entries = topics.entry(subscription.topic.clone()).or_default();

        if self.policy == DuplicatePolicy::Replace {
            if let Some(existing) = entries.iter_mut().find(|s| s.same_identity(&subscription)) {
                *existing = subscription;
                return AddOutcome::Replaced;
            }
        }

        entries.push(subscription);
        AddOutcome::Added
    }

    /// Snapshot of the subscribers of `topic`.
    pub fn list(&self, topic: &str) -> Vec<Subscription> {
        self.topics
            .read()
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Topics with at least one subscriber.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Number of topics with at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }

    /// Total number of registered subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.topics.read().values().map(Vec::len).sum()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
