//! Publish endpoint.

use axum::{extract::State, routing::post, Json, Router};
use webhub_core::PublishMessage;

use crate::error::AppError;
use crate::form::FormFields;
use crate::json::PublishResponse;
use crate::AppState;

/// Publish routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/publisher", post(handle_publish))
}

/// Handle a publish request.
///
/// e.g. `curl -X POST "http://localhost:8080/publisher?topic=/a/topic&message=hej"`
async fn handle_publish(
    State(state): State<AppState>,
    fields: FormFields,
) -> Result<Json<PublishResponse>, AppError> {
    let topic = fields
        .get("topic")
        .ok_or_else(|| AppError::BadRequest("missing field: topic".to_string()))?
        .to_string();
    let message = PublishMessage::new(topic, fields.value("message"));

    let report = state.hub.publish(message).await?;
    Ok(Json(report.into()))
}
