//! OrchestratorCore and its supporting pieces (C4-C7): job lifecycle
//! stages, rule advancement, the startup-recovery sweep, the stale-pending
//! finalizer, and the single-run serialization queue.

mod concurrency;
mod core;
mod queue;
mod recovery;
mod rule_advancement;
mod stages;
mod stale_finalizer;
mod types;

pub use core::OrchestratorCore;
pub use queue::{CurrentRun, OrchestrationQueue, QueueOutcome};
pub use recovery::RecoveryResult;
pub use stages::advance_rule_and_account;
pub use types::{
    BulkVerifyResult, CredentialVerificationResult, JobCreationResult, ProgressCallback,
    ScrapeResult, SingleRebillResult, StalePendingResult, StatusCheckResult, StatusCheckSelection,
    SubstepCallback,
};
