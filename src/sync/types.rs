//! Types shared by the account-sync engine.

use chrono::NaiveDate;

use crate::error::ItemFailure;

/// One row returned by the external invoice-aggregation feed (spec §6
/// "Inputs from the external invoice-aggregation database"). Cadence
/// classifications the view computes are intentionally not modeled here —
/// C1 recomputes them from `last_invoice_date`/`invoice_count` and the view's
/// own numbers are discarded.
#[derive(Debug, Clone)]
pub struct ExternalAccountRow {
    pub vm_account_id: i64,
    pub credential_id: i32,
    pub client_id: Option<i32>,
    pub client_name: Option<String>,
    pub vendor_code: Option<String>,
    pub vm_account_number: String,
    pub interface_account_id: Option<String>,
    pub last_invoice_date: Option<NaiveDate>,
    pub invoice_count: i32,
}

/// Outcome of one `sync_accounts` invocation.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub total_rows: u64,
    pub clients_upserted: u64,
    pub accounts_created: u64,
    pub accounts_updated: u64,
    pub accounts_soft_deleted: u64,
    pub rules_created: u64,
    pub rules_updated: u64,
    pub rules_skipped_overridden: u64,
    pub row_errors: Vec<ItemFailure>,
    pub cancelled: bool,
}

/// Named phase of the sync pipeline, reported via `substep_cb` (spec §6
/// `sync_accounts(progress_cb, substep_cb, cancel)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSubstep {
    Count,
    ClientUpsert,
    LoadExistingAccounts,
    StreamRows,
    SoftDeleteVanished,
    RuleSync,
}

impl SyncSubstep {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncSubstep::Count => "count",
            SyncSubstep::ClientUpsert => "client_upsert",
            SyncSubstep::LoadExistingAccounts => "load_existing_accounts",
            SyncSubstep::StreamRows => "stream_rows",
            SyncSubstep::SoftDeleteVanished => "soft_delete_vanished",
            SyncSubstep::RuleSync => "rule_sync",
        }
    }
}
