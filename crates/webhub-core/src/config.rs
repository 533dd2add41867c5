//! Hub configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default challenge length in characters.
pub const DEFAULT_CHALLENGE_LENGTH: usize = 10;

/// Default timeout for the verification handshake.
pub const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a single delivery.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default TCP connect timeout for outbound requests.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// What the registry does when the same (topic, callback) pair is verified twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Append another entry; the callback then receives one delivery per entry.
    #[default]
    Allow,
    /// Replace the existing entry in place, keeping its position.
    Replace,
}

/// Hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Length of generated challenge strings.
    pub challenge_length: usize,

    /// Timeout for the whole verification request, body included.
    pub verification_timeout: Duration,

    /// Timeout for each delivery request.
    pub delivery_timeout: Duration,

    /// TCP connect timeout shared by all outbound requests.
    pub connect_timeout: Duration,

    /// Handling of repeated (topic, callback) registrations.
    pub duplicate_policy: DuplicatePolicy,

    /// User-Agent sent on outbound requests.
    pub user_agent: String,
}

impl HubConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            challenge_length: DEFAULT_CHALLENGE_LENGTH,
            verification_timeout: DEFAULT_VERIFICATION_TIMEOUT,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            duplicate_policy: DuplicatePolicy::default(),
            user_agent: format!("webhub/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the challenge length. Zero is raised to one.
    pub fn with_challenge_length(mut self, length: usize) -> Self {
        self.challenge_length = length.max(1);
        self
    }

    /// Set the verification timeout.
    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = timeout;
        self
    }

    /// Set the delivery timeout.
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the duplicate policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Set the User-Agent header value.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Refuse zero timeouts and a zero challenge length, including values
    /// assigned to the fields directly.
    pub fn validate(&self) -> Result<()> {
        if self.challenge_length == 0 {
            return Err(Error::InvalidConfig("challenge_length must be at least 1".into()));
        }
        let timeouts = [
            ("verification_timeout", self.verification_timeout),
            ("delivery_timeout", self.delivery_timeout),
            ("connect_timeout", self.connect_timeout),
        ];
        for (name, timeout) in timeouts {
            if timeout.is_zero() {
                return Err(Error::InvalidConfig(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::new()
    }
}
