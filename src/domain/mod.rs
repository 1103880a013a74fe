//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, state machine)
//! - `subscription` - Access lifecycle, tiers, renewal and sweep rules
//! - `inbound` - Decoded inbound events, button actions, and commands

pub mod foundation;
pub mod inbound;
pub mod subscription;
