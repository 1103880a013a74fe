//! Inbound event model.
//!
//! Everything the platform can deliver is decoded into these types at the
//! adapter boundary.

mod callback;
mod command;
mod event;

pub use callback::{AdminAction, CallbackAction};
pub use command::{Command, ADDSUB_USAGE, APPROVE_USAGE, MAX_GRANT_DAYS, REMOVESUB_USAGE};
pub use event::{InboundEvent, MediaKind, Sender};
