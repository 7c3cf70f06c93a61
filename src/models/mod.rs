//! # Data Models
//!
//! SeaORM entity models for the invoice-retrieval orchestrator's persisted
//! state (spec §3).

pub mod account;
pub mod account_rule;
pub mod blacklist_entry;
pub mod client;
pub mod configuration;
pub mod job;
pub mod job_execution;
pub mod orchestration_run;

pub use account::Entity as Account;
pub use account_rule::Entity as AccountRule;
pub use blacklist_entry::Entity as BlacklistEntry;
pub use client::Entity as Client;
pub use configuration::Entity as Configuration;
pub use job::Entity as Job;
pub use job_execution::Entity as JobExecution;
pub use orchestration_run::Entity as OrchestrationRun;

/// The audit label written to `created_by`/`modified_by` by rows the
/// orchestrator itself writes (as opposed to a human operator override).
pub const SYSTEM_ACTOR: &str = "System Created";
