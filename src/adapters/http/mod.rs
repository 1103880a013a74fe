//! HTTP adapters.
//!
//! The only inbound HTTP surface is the Telegram webhook.

pub mod webhook;

pub use webhook::{webhook_router, WebhookAppState};
