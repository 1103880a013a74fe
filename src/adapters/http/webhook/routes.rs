//! Axum router configuration for the webhook endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{health, receive_update, WebhookAppState};

/// Create the webhook router.
///
/// # Routes
///
/// - `POST {path}` - Telegram updates, checked against the shared secret
/// - `GET /health` - Liveness probe
pub fn webhook_router(path: &str, state: WebhookAppState) -> Router {
    Router::new()
        .route(path, post(receive_update))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
