//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod access;
pub mod payment;
pub mod subscription;

pub use access::{HandleJoinRequestCommand, HandleJoinRequestHandler, JoinDecision};
pub use payment::{
    MarkPaidCommand, MarkPaidHandler, ProofOutcome, SubmitProofCommand, SubmitProofHandler,
};
pub use subscription::{
    ApproveSubscriptionCommand, ApproveSubscriptionHandler, ApproveSubscriptionResult,
    GetSubscriptionStatsHandler, ListSubscribersHandler, PurgeExpiredHandler,
    RemoveSubscriptionCommand, RemoveSubscriptionHandler, RemoveSubscriptionResult,
    ResendInvitesHandler, ResendReport, StatusCounts,
};
