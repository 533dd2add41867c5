//! Core error types.

use thiserror::Error;

/// Result alias used across the core crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Hub errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Only `subscribe` is accepted as `hub.mode`.
    #[error("unsupported mode: {0:?}")]
    UnsupportedMode(String),

    /// The subscribe request carried no callback.
    #[error("callback is empty")]
    EmptyCallback,

    /// The callback is not an absolute http(s) URL.
    #[error("invalid callback: {0}")]
    InvalidCallback(String),

    /// The callback answered, but not with the challenge.
    #[error("verification rejected: {0}")]
    VerificationRejected(String),

    /// The callback could not be reached within the timeout.
    #[error("callback unreachable: {0}")]
    CallbackUnreachable(String),

    /// Payload serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client construction error.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    /// A configuration value that would make the hub unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether the error was caused by the request contents rather than the
    /// callback or the hub itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedMode(_) | Error::EmptyCallback | Error::InvalidCallback(_)
        )
    }
}

/// Short description of an outbound transport failure for logs and reports.
pub(crate) fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}
