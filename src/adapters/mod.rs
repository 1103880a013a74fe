//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `sqlite` - Durable subscription store
//! - `memory` - In-memory subscription store (tests, local runs)
//! - `telegram` - Bot API client and update decoding
//! - `http` - Webhook endpoint
//! - `recording` - Recording chat platform for tests

pub mod http;
pub mod memory;
pub mod recording;
pub mod sqlite;
pub mod telegram;

pub use memory::InMemorySubscriptionStore;
pub use recording::RecordingPlatform;
pub use sqlite::SqliteSubscriptionStore;
pub use telegram::{TelegramClient, TelegramConfig};
