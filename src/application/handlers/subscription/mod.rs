//! Subscription handlers.
//!
//! ## Commands
//! - Approving and directly granting subscriptions
//! - Removing a subscription and the member
//! - Purging expired rows
//! - Resending invite links to every subscriber
//!
//! ## Queries
//! - Status counters (admin)
//! - Subscriber list (admin)

mod approve_subscription;
mod get_subscription_stats;
mod list_subscribers;
mod purge_expired;
mod remove_subscription;
mod resend_invites;

// Commands
pub use approve_subscription::{
    ApproveSubscriptionCommand, ApproveSubscriptionHandler, ApproveSubscriptionResult,
};
pub use purge_expired::PurgeExpiredHandler;
pub use remove_subscription::{
    RemoveSubscriptionCommand, RemoveSubscriptionHandler, RemoveSubscriptionResult,
};
pub use resend_invites::{ResendInvitesHandler, ResendReport};

// Queries
pub use get_subscription_stats::{GetSubscriptionStatsHandler, StatusCounts};
pub use list_subscribers::ListSubscribersHandler;
