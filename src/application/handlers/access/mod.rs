//! Access handlers.
//!
//! Group membership enforcement for incoming join requests.

mod join_request;

pub use join_request::{HandleJoinRequestCommand, HandleJoinRequestHandler, JoinDecision};
