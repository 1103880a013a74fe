//! Payment handlers.
//!
//! The two user-side steps between choosing a tier and approval: announcing
//! a payment, then sending the receipt.

mod mark_paid;
mod submit_proof;

pub use mark_paid::{MarkPaidCommand, MarkPaidHandler};
pub use submit_proof::{ProofOutcome, SubmitProofCommand, SubmitProofHandler};
