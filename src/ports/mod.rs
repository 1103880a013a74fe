//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionStore` - Durable subscription table
//! - `ChatPlatform` - Outbound action API of the chat platform

mod chat_platform;
mod subscription_store;

pub use chat_platform::{
    ButtonTarget, ChatPlatform, InlineButton, InlineKeyboard, InviteLink, MessageRef,
    PlatformError, PlatformErrorCode,
};
pub use subscription_store::SubscriptionStore;
