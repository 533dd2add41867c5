//! webhub HTTP gateway.
//!
//! Exposes the hub over HTTP: `POST /` for subscriptions, `POST /publisher`
//! for publishing, plus read-only `GET /subscriptions` and `GET /health`.

pub mod config;
pub mod error;
pub mod form;
pub mod json;
pub mod routes;

pub use config::{Args, GatewayConfig};
pub use error::AppError;

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use webhub_core::{Hub, SharedHub};

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// The hub.
    pub hub: SharedHub,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new application state.
    pub fn new(hub: Hub, config: GatewayConfig) -> Self {
        Self {
            hub: Arc::new(hub),
            config,
        }
    }

    /// Build the hub from the gateway configuration.
    pub fn from_config(config: GatewayConfig) -> Result<Self, webhub_core::Error> {
        let hub = Hub::new(config.hub_config())?;
        Ok(Self::new(hub, config))
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .merge(routes::health::routes())
        .merge(routes::subscribe::routes())
        .merge(routes::publish::routes())
        .merge(routes::subscriptions::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
        .with_state(state)
}
