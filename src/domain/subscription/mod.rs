//! Subscription domain module.
//!
//! Handles the paid access lifecycle: tiers, the per-user subscription
//! record, the status state machine, and the rules the sweep applies.
//!
//! # Module Structure
//!
//! - `aggregate` - Subscription record and renewal rule
//! - `status` - SubscriptionStatus state machine
//! - `tier` - Plans and their durations
//! - `lifecycle` - Sweep decisions (grace, reminder, expiry)
//! - `pending_proof` - Ephemeral "I paid" marker
//! - `errors` - Workflow error taxonomy

mod aggregate;
mod errors;
mod lifecycle;
mod pending_proof;
mod status;
mod tier;

pub use aggregate::Subscription;
pub use errors::SubscriptionError;
pub use lifecycle::{LifecycleAction, LifecyclePolicy};
pub use pending_proof::PendingProof;
pub use status::SubscriptionStatus;
pub use tier::Tier;
