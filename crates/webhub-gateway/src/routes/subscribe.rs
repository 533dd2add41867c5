//! Subscription endpoint.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use webhub_core::SubscribeRequest;

use crate::error::AppError;
use crate::form::FormFields;
use crate::json::SubscribeResponse;
use crate::AppState;

/// Subscription routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(handle_subscribe))
}

/// Handle a subscribe request.
///
/// Verification runs before the response is sent, so the status tells the
/// subscriber whether it was registered.
async fn handle_subscribe(
    State(state): State<AppState>,
    fields: FormFields,
) -> Result<(StatusCode, Json<SubscribeResponse>), AppError> {
    let request = SubscribeRequest {
        mode: fields.value("hub.mode"),
        topic: fields.value("hub.topic"),
        callback: fields.value("hub.callback"),
        secret: fields.value("hub.secret"),
    };

    let subscription = state.hub.subscribe(request).await?;
    Ok((StatusCode::ACCEPTED, Json(SubscribeResponse::from(&subscription))))
}
