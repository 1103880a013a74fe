//! Telegram Bot API adapters.
//!
//! - `TelegramClient` - Outbound actions (`ChatPlatform`)
//! - `decode_update_json` - Inbound webhook updates to `InboundEvent`

mod client;
mod decode;
mod types;

pub use client::{TelegramClient, TelegramConfig};
pub use decode::{decode_update, decode_update_json};
pub use types::Update;
