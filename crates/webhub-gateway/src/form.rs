//! Form field extraction.
//!
//! Fields may arrive in the query string, in an
//! `application/x-www-form-urlencoded` body, or both. Body values win over
//! query values; within one source the first occurrence wins. Bodies with any
//! other content type are ignored.

use axum::async_trait;
use axum::extract::{Form, FromRequest, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};

use crate::error::AppError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Decoded form fields of a request.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: Vec<(String, String)>,
}

impl FormFields {
    /// Build from (name, value) pairs in precedence order.
    pub fn from_pairs(values: Vec<(String, String)>) -> Self {
        Self { values }
    }

    /// First value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First value of `name`, or an empty string.
    pub fn value(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }
}

fn is_form_body(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().starts_with(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

#[async_trait]
impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query: Vec<(String, String)> = if req.uri().query().is_some() {
            Query::try_from_uri(req.uri())
                .map_err(|e| AppError::BadRequest(e.body_text()))?
                .0
        } else {
            Vec::new()
        };

        let mut values: Vec<(String, String)> = if is_form_body(req.headers()) {
            match Form::<Vec<(String, String)>>::from_request(req, state).await {
                Ok(Form(values)) => values,
                Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    return Err(AppError::PayloadTooLarge(rejection.body_text()))
                }
                Err(rejection) => return Err(AppError::BadRequest(rejection.body_text())),
            }
        } else {
            Vec::new()
        };

        values.extend(query);
        Ok(Self::from_pairs(values))
    }
}
