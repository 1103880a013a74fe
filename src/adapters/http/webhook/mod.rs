//! Webhook HTTP surface.
//!
//! Receives Telegram updates and hands decoded events to the dispatcher.

mod handlers;
mod routes;

pub use handlers::{WebhookAppState, SECRET_HEADER};
pub use routes::webhook_router;
