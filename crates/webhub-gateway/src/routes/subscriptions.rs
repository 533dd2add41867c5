//! Subscription listing endpoint.

use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppError;
use crate::form::FormFields;
use crate::json::{redacted_callback, SubscriptionsResponse};
use crate::AppState;

/// Subscription listing routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/subscriptions", get(handle_list))
}

/// List the subscribers of `?topic=`.
///
/// Callbacks are shown without query string, fragment or credentials.
async fn handle_list(
    State(state): State<AppState>,
    fields: FormFields,
) -> Result<Json<SubscriptionsResponse>, AppError> {
    let topic = fields
        .get("topic")
        .ok_or_else(|| AppError::BadRequest("missing field: topic".to_string()))?
        .to_string();

    let callbacks = state
        .hub
        .subscriptions(&topic)
        .iter()
        .map(|s| redacted_callback(&s.callback))
        .collect();

    Ok(Json(SubscriptionsResponse { topic, callbacks }))
}
