//! Result types and shared callback signatures for the public orchestrator
//! API (spec §6).

use crate::error::ItemFailure;

/// `(current, total)`. The setup/mark-in-progress phase reports negative
/// `current` (magnitude = rows processed during marking); manual
/// status-check's database-apply phase reports values `< -1_000_000`. Both
/// conventions must be preserved by every caller (spec §6).
pub type ProgressCallback<'a> = dyn FnMut(i64, i64) + Send + 'a;

/// Named phase, reported by operations that have sub-steps worth labeling
/// separately from raw progress counts (mirrors `sync::SyncSubstep`).
pub type SubstepCallback<'a> = dyn FnMut(&str) + Send + 'a;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCheckSelection {
    Scheduled,
    Manual,
}

#[derive(Debug, Clone, Default)]
pub struct JobCreationResult {
    pub jobs_created: u64,
    pub skipped_blacklisted: u64,
    pub skipped_no_rule: u64,
    pub skipped_existing: u64,
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct CredentialVerificationResult {
    pub verified: u64,
    pub failed: u64,
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct ScrapeResult {
    pub completed: u64,
    pub requested: u64,
    pub failed: u64,
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusCheckResult {
    pub completed: u64,
    pub needs_review: u64,
    pub credential_verified: u64,
    pub credential_failed: u64,
    pub scrape_failed: u64,
    pub no_invoice_found: u64,
    pub still_pending: u64,
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct StalePendingResult {
    pub cancelled: u64,
}

#[derive(Debug, Clone, Default)]
pub struct BulkVerifyResult {
    pub verified: u64,
    pub failed: u64,
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone)]
pub struct SingleRebillResult {
    pub success: bool,
    pub message: Option<String>,
}
