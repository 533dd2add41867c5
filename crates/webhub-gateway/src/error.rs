//! Error handling for the gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Internal server error.
    Internal(String),
    /// Bad request.
    BadRequest(String),
    /// Request body over the configured limit.
    PayloadTooLarge(String),
    /// The callback did not echo the challenge.
    VerificationRejected(String),
    /// The callback could not be reached.
    CallbackUnreachable(String),
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error flag.
    pub error: bool,
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            AppError::VerificationRejected(msg) => {
                (StatusCode::FORBIDDEN, "VERIFICATION_REJECTED", msg)
            }
            AppError::CallbackUnreachable(msg) => {
                (StatusCode::BAD_GATEWAY, "CALLBACK_UNREACHABLE", msg)
            }
        };

        let body = ErrorResponse {
            error: true,
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<webhub_core::Error> for AppError {
    fn from(err: webhub_core::Error) -> Self {
        use webhub_core::Error;

        match err {
            Error::VerificationRejected(reason) => AppError::VerificationRejected(reason),
            Error::CallbackUnreachable(reason) => AppError::CallbackUnreachable(reason),
            err if err.is_client_error() => AppError::BadRequest(err.to_string()),
            err => AppError::Internal(err.to_string()),
        }
    }
}
