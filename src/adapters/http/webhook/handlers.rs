//! HTTP handlers for the Telegram webhook.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::adapters::telegram::decode_update_json;
use crate::application::Dispatcher;
use crate::domain::foundation::Timestamp;

/// Header Telegram echoes the registered secret in.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub secret: Arc<SecretString>,
    pub dispatcher: Arc<Dispatcher>,
}

impl WebhookAppState {
    pub fn new(secret: SecretString, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            secret: Arc::new(secret),
            dispatcher,
        }
    }
}

/// POST {webhook path} - Receive one update
///
/// Always answers 200 once the secret matches, so the platform never
/// redelivers a slow or undecodable update. Handling runs on its own task.
pub async fn receive_update(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if !secret_matches(&headers, &state.secret) {
        tracing::warn!("Webhook call with missing or wrong secret");
        return StatusCode::UNAUTHORIZED;
    }

    match decode_update_json(&body) {
        Ok(Some(event)) => {
            let dispatcher = state.dispatcher.clone();
            tokio::spawn(async move {
                dispatcher.dispatch(event, Timestamp::now()).await;
            });
        }
        Ok(None) => tracing::debug!("Update ignored"),
        Err(e) => tracing::warn!(error = %e, bytes = body.len(), "Undecodable update dropped"),
    }

    StatusCode::OK
}

/// GET /health - Liveness probe
pub async fn health() -> &'static str {
    "ok"
}

fn secret_matches(headers: &HeaderMap, expected: &SecretString) -> bool {
    let Some(given) = headers.get(SECRET_HEADER) else {
        return false;
    };
    given
        .as_bytes()
        .ct_eq(expected.expose_secret().as_bytes())
        .into()
}
