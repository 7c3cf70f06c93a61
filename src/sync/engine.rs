//! AccountSync (C3): streams the external invoice-aggregation feed and
//! upserts `Client`/`Account`/`AccountRule` rows, grounded on the
//! claim/apply batching and per-item error containment of the teacher's
//! `sync_executor::claim_and_run_jobs`.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use futures::StreamExt;
use sea_orm::{ConnectionTrait, DatabaseConnection, QueryResult, Statement, StreamTrait};
use tokio_util::sync::CancellationToken;

use crate::billing::{self, PeriodType};
use crate::error::{ItemFailure, OrchestratorError};
use crate::models::account;
use crate::repositories::account::NaturalKey;
use crate::repositories::{AccountRepository, AccountRuleRepository, ClientRepository};

use super::types::{ExternalAccountRow, SyncResult, SyncSubstep};

/// Progress is reported every `FLUSH_INTERVAL` processed rows (spec §4.4
/// step 4 "flush every 5000").
const FLUSH_INTERVAL: u64 = 5000;

const COUNT_QUERY: &str = "SELECT COUNT(*) AS row_count FROM invoice_aggregation_feed";
const ROWS_QUERY: &str = "SELECT vm_account_id, credential_id, client_id, client_name, \
    vendor_code, vm_account_number, interface_account_id, last_invoice_date, invoice_count \
    FROM invoice_aggregation_feed";

pub struct AccountSync<'a> {
    db: &'a DatabaseConnection,
    external_db: &'a DatabaseConnection,
}

enum RowOutcome {
    Created,
    Updated,
}

impl<'a> AccountSync<'a> {
    pub fn new(db: &'a DatabaseConnection, external_db: &'a DatabaseConnection) -> Self {
        Self { db, external_db }
    }

    #[tracing::instrument(skip_all)]
    pub async fn run(
        &self,
        mut progress_cb: impl FnMut(i64, i64) + Send,
        mut substep_cb: impl FnMut(SyncSubstep) + Send,
        cancel: &CancellationToken,
    ) -> Result<SyncResult, OrchestratorError> {
        let mut result = SyncResult::default();
        let today = Utc::now().date_naive();

        substep_cb(SyncSubstep::Count);
        let total = self.count_external_rows().await?;
        result.total_rows = total;
        progress_cb(0, total as i64);

        if cancel.is_cancelled() {
            result.cancelled = true;
            return Ok(result);
        }

        substep_cb(SyncSubstep::ClientUpsert);
        let client_repo = ClientRepository::new(self.db);
        let mut clients = client_repo.load_existing().await?;

        substep_cb(SyncSubstep::LoadExistingAccounts);
        let account_repo = AccountRepository::new(self.db);
        let mut existing_accounts = account_repo.load_active_by_natural_key().await?;

        substep_cb(SyncSubstep::StreamRows);
        let mut seen: HashSet<NaturalKey> = HashSet::new();
        let mut processed: u64 = 0;

        let stmt = Statement::from_string(
            self.external_db.get_database_backend(),
            ROWS_QUERY.to_string(),
        );
        let mut stream = self
            .external_db
            .stream(stmt)
            .await
            .map_err(OrchestratorError::Database)?;

        while let Some(row) = stream.next().await {
            if cancel.is_cancelled() {
                result.cancelled = true;
                return Ok(result);
            }

            let row = match row {
                Ok(r) => r,
                Err(err) => {
                    result.row_errors.push(ItemFailure {
                        item_id: -1,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            match parse_external_row(&row) {
                Ok(external) => {
                    let key = (external.vm_account_id, external.vm_account_number.clone());
                    match self
                        .apply_row(&mut clients, &mut existing_accounts, &client_repo, &external, today)
                        .await
                    {
                        Ok(outcome) => {
                            seen.insert(key);
                            match outcome {
                                RowOutcome::Created => result.accounts_created += 1,
                                RowOutcome::Updated => result.accounts_updated += 1,
                            }
                        }
                        Err(message) => {
                            result.row_errors.push(ItemFailure {
                                item_id: external.vm_account_id,
                                message,
                            });
                        }
                    }
                }
                Err(message) => {
                    result.row_errors.push(ItemFailure { item_id: -1, message });
                }
            }

            processed += 1;
            if processed % FLUSH_INTERVAL == 0 {
                progress_cb(processed as i64, total as i64);
            }
        }
        progress_cb(processed as i64, total as i64);
        result.clients_upserted = clients.len() as u64;

        if cancel.is_cancelled() {
            result.cancelled = true;
            return Ok(result);
        }

        substep_cb(SyncSubstep::SoftDeleteVanished);
        result.accounts_soft_deleted = account_repo
            .soft_delete_vanished(&seen, &existing_accounts)
            .await?;

        substep_cb(SyncSubstep::RuleSync);
        let rule_repo = AccountRuleRepository::new(self.db);
        let rules = rule_repo.load_by_account().await?;

        for key in seen.iter() {
            if cancel.is_cancelled() {
                result.cancelled = true;
                return Ok(result);
            }
            let Some(account_model) = existing_accounts.get(key) else {
                continue;
            };
            let existing_rule = rules.get(&account_model.id);
            if existing_rule.is_some_and(|r| r.is_manually_overridden) {
                result.rules_skipped_overridden += 1;
                continue;
            }

            let (Some(period_type_str), Some(next_run_at), Some(range_start), Some(range_end)) = (
                account_model.period_type.clone(),
                account_model.next_run_at,
                account_model.next_range_start_at,
                account_model.next_range_end_at,
            ) else {
                continue;
            };
            let period_type = PeriodType::parse(&period_type_str).unwrap_or(PeriodType::Monthly);

            let was_existing = existing_rule.is_some();
            rule_repo
                .upsert_schedule(
                    existing_rule,
                    account_model.id,
                    &period_type_str,
                    Some(period_type.period_days()),
                    next_run_at,
                    range_start,
                    range_end,
                )
                .await?;

            if was_existing {
                result.rules_updated += 1;
            } else {
                result.rules_created += 1;
            }
        }

        Ok(result)
    }

    async fn count_external_rows(&self) -> Result<u64, OrchestratorError> {
        let stmt = Statement::from_string(
            self.external_db.get_database_backend(),
            COUNT_QUERY.to_string(),
        );
        let row = self
            .external_db
            .query_one(stmt)
            .await
            .map_err(OrchestratorError::Database)?;
        let count = row
            .and_then(|r| r.try_get::<i64>("", "row_count").ok())
            .unwrap_or(0);
        Ok(count.max(0) as u64)
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_row(
        &self,
        clients: &mut HashMap<i32, crate::models::client::Model>,
        existing_accounts: &mut HashMap<NaturalKey, account::Model>,
        client_repo: &ClientRepository<'_>,
        external: &ExternalAccountRow,
        today: NaiveDate,
    ) -> Result<RowOutcome, String> {
        let internal_client_id = match (external.client_id, &external.client_name) {
            (Some(client_id), Some(name)) => Some(
                client_repo
                    .upsert(clients, client_id, name)
                    .await
                    .map_err(|e| e.to_string())?,
            ),
            _ => None,
        };

        let key = (external.vm_account_id, external.vm_account_number.clone());
        let is_new = !existing_accounts.contains_key(&key);
        if is_new && internal_client_id.is_none() {
            return Err("row has no resolvable client_id/client_name; account skipped".to_string());
        }
        let previous_last_invoice = existing_accounts.get(&key).and_then(|a| a.last_invoice_at);

        let derived = derive_scheduling(previous_last_invoice, external.last_invoice_date, today);

        let now = Utc::now().fixed_offset();
        if let Some(current) = existing_accounts.get(&key).cloned() {
            let mut active: account::ActiveModel = current.into();
            use sea_orm::Set;
            active.interface_account_id = Set(external.interface_account_id.clone());
            if let Some(internal_client_id) = internal_client_id {
                active.client_id = Set(internal_client_id);
            }
            active.client_name = Set(external.client_name.clone());
            active.credential_id = Set(external.credential_id);
            active.vendor_code = Set(external.vendor_code.clone());
            active.median_days = Set(Some(derived.median_days));
            active.invoice_count = Set(external.invoice_count);
            active.last_invoice_at = Set(external.last_invoice_date);
            active.expected_next_at = Set(derived.expected_next_at);
            active.expected_range_start_at = Set(derived.range_start);
            active.expected_range_end_at = Set(derived.range_end);
            active.days_until_next_run = Set(derived.days_until_next_run);
            active.next_run_status = Set(Some(derived.next_run_status.as_str().to_string()));
            active.historical_billing_status =
                Set(Some(derived.historical_billing_status.as_str().to_string()));
            active.next_run_at = Set(derived.expected_next_at);
            active.next_range_start_at = Set(derived.range_start);
            active.next_range_end_at = Set(derived.range_end);
            active.period_type = Set(Some(derived.period_type.as_str().to_string()));
            active.modified_at = Set(now);
            active.modified_by = Set(crate::models::SYSTEM_ACTOR.to_string());

            let updated = sea_orm::ActiveModelTrait::update(active, self.db)
                .await
                .map_err(|e| e.to_string())?;
            existing_accounts.insert(key, updated);
            Ok(RowOutcome::Updated)
        } else {
            use sea_orm::Set;
            let active = account::ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                vm_account_id: Set(external.vm_account_id),
                vm_account_number: Set(external.vm_account_number.clone()),
                interface_account_id: Set(external.interface_account_id.clone()),
                client_id: Set(internal_client_id.unwrap_or_default()),
                client_name: Set(external.client_name.clone()),
                credential_id: Set(external.credential_id),
                vendor_code: Set(external.vendor_code.clone()),
                primary_vendor_code: Set(None),
                master_vendor_code: Set(None),
                median_days: Set(Some(derived.median_days)),
                invoice_count: Set(external.invoice_count),
                last_invoice_at: Set(external.last_invoice_date),
                expected_next_at: Set(derived.expected_next_at),
                expected_range_start_at: Set(derived.range_start),
                expected_range_end_at: Set(derived.range_end),
                days_until_next_run: Set(derived.days_until_next_run),
                next_run_status: Set(Some(derived.next_run_status.as_str().to_string())),
                historical_billing_status: Set(Some(
                    derived.historical_billing_status.as_str().to_string(),
                )),
                last_successful_download_date: Set(None),
                next_run_at: Set(derived.expected_next_at),
                next_range_start_at: Set(derived.range_start),
                next_range_end_at: Set(derived.range_end),
                period_type: Set(Some(derived.period_type.as_str().to_string())),
                created_at: Set(now),
                created_by: Set(crate::models::SYSTEM_ACTOR.to_string()),
                modified_at: Set(now),
                modified_by: Set(crate::models::SYSTEM_ACTOR.to_string()),
                is_deleted: Set(false),
            };
            let inserted = sea_orm::ActiveModelTrait::insert(active, self.db)
                .await
                .map_err(|e| e.to_string())?;
            existing_accounts.insert(key, inserted);
            Ok(RowOutcome::Created)
        }
    }
}

struct DerivedScheduling {
    median_days: f64,
    period_type: PeriodType,
    expected_next_at: Option<NaiveDate>,
    range_start: Option<NaiveDate>,
    range_end: Option<NaiveDate>,
    days_until_next_run: Option<i32>,
    historical_billing_status: account::BillingStatus,
    next_run_status: account::BillingStatus,
}

/// Recomputes the billing schedule via C1. When no `last_invoice_date` has
/// ever been observed, the account is immediately `Missing`/due with no
/// concrete next-run date (spec §4.1 leaves the "never synced" case
/// unspecified; treating it as due-now is the conservative choice).
fn derive_scheduling(
    previous_last_invoice: Option<NaiveDate>,
    last_invoice_date: Option<NaiveDate>,
    today: NaiveDate,
) -> DerivedScheduling {
    let Some(last_invoice) = last_invoice_date else {
        return DerivedScheduling {
            median_days: 30.0,
            period_type: PeriodType::Monthly,
            expected_next_at: None,
            range_start: None,
            range_end: None,
            days_until_next_run: None,
            historical_billing_status: account::BillingStatus::Missing,
            next_run_status: account::BillingStatus::Missing,
        };
    };

    let history: Vec<NaiveDate> = match previous_last_invoice {
        Some(previous) if previous < last_invoice => vec![previous, last_invoice],
        _ => vec![last_invoice],
    };
    let median_days = billing::median_inter_invoice_days(&history);
    let period_type = billing::classify_cadence(median_days);
    let anchor = billing::anchor_day_of_month(last_invoice);
    let expected_next = billing::next_run_from_last_invoice(last_invoice, period_type, anchor, today);
    let (window_before, window_after) = period_type.default_window();
    let (range_start, range_end) = billing::window(expected_next, window_before, window_after);

    let days_until_expected = (expected_next - today).num_days();
    let historical = billing::historical_billing_status(
        days_until_expected,
        period_type.period_days(),
        window_before,
    );
    let next_run = billing::next_run_status(historical, days_until_expected, period_type.period_days(), window_before);

    DerivedScheduling {
        median_days,
        period_type,
        expected_next_at: Some(expected_next),
        range_start: Some(range_start),
        range_end: Some(range_end),
        days_until_next_run: Some(days_until_expected as i32),
        historical_billing_status: historical,
        next_run_status: next_run,
    }
}

fn parse_external_row(row: &QueryResult) -> Result<ExternalAccountRow, String> {
    let vm_account_id: i64 = row
        .try_get("", "vm_account_id")
        .map_err(|e| format!("vm_account_id: {e}"))?;
    let credential_id: i32 = row
        .try_get("", "credential_id")
        .map_err(|e| format!("credential_id: {e}"))?;
    let vm_account_number: String = row
        .try_get("", "vm_account_number")
        .map_err(|e| format!("vm_account_number: {e}"))?;

    Ok(ExternalAccountRow {
        vm_account_id,
        credential_id,
        client_id: row.try_get("", "client_id").ok(),
        client_name: row.try_get("", "client_name").ok(),
        vendor_code: row.try_get("", "vendor_code").ok(),
        vm_account_number,
        interface_account_id: row.try_get("", "interface_account_id").ok(),
        last_invoice_date: row.try_get("", "last_invoice_date").ok(),
        invoice_count: row.try_get("", "invoice_count").unwrap_or(0),
    })
}
