//! Application layer - workflows, handlers, and background jobs.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! The dispatcher is the entry point for inbound events; the scheduler runs
//! the wall-clock jobs.

pub mod backup;
pub mod dispatcher;
pub mod handlers;
pub mod invite_issuer;
pub mod lifecycle_engine;
pub mod pending_proofs;
pub mod presenter;
pub mod scheduler;
pub mod settings;

pub use backup::BackupExporter;
pub use dispatcher::Dispatcher;
pub use invite_issuer::InviteIssuer;
pub use lifecycle_engine::{LifecycleEngine, SweepOutcome, SweepReport};
pub use pending_proofs::PendingProofRegistry;
pub use scheduler::{Job, Schedule, Scheduler};
pub use settings::{BotSettings, PaymentDetails};
