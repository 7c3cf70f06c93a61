//! The four OrchestratorCore stages (spec §4.3): each follows the
//! mark-in-progress / remote-call / apply-results split, grounded on the
//! teacher's `sync_executor::claim_and_run_jobs` three-phase shape.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tokio_util::sync::CancellationToken;

use crate::adr::client::AdrClient;
use crate::adr::status;
use crate::adr::types::IngestAdrRequest;
use crate::billing::PeriodType;
use crate::blacklist::{AccountMatchFields, BlacklistFilter};
use crate::error::ItemFailure;
use crate::error::OrchestratorError;
use crate::models::account::{self, BillingStatus};
use crate::models::account_rule::{self, DOWNLOAD_INVOICE_JOB_TYPE_ID};
use crate::models::blacklist_entry::ExclusionType;
use crate::models::configuration::OrchestratorDefaults;
use crate::models::job::{self, JobStatus};
use crate::models::job_execution::{self, AdrRequestType};
use crate::models::SYSTEM_ACTOR;

use super::concurrency::bounded_map;
use super::rule_advancement::{advance_rule, next_last_successful_download_date};
use super::types::{
    CredentialVerificationResult, JobCreationResult, ProgressCallback, ScrapeResult,
    StatusCheckResult, StatusCheckSelection,
};

const MARK_BATCH: usize = 500;

fn build_request(
    adr_request_type_id: i32,
    job: &job::Model,
    account: &account::Model,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    is_last_attempt: bool,
    adr: &AdrClient,
) -> IngestAdrRequest {
    IngestAdrRequest {
        adr_request_type_id,
        credential_id: job.credential_id,
        start_date: IngestAdrRequest::format_date(start),
        end_date: IngestAdrRequest::format_date(end),
        source_application_name: adr.source_application_name().to_string(),
        recipient_email: adr.recipient_email().to_string(),
        job_id: job.id,
        account_id: account.vm_account_id,
        interface_account_id: account.interface_account_id.clone(),
        is_last_attempt,
    }
}

/// Stage 1 — CreateJobs. No remote calls: a due rule either gets a job or
/// it doesn't.
pub async fn create_jobs(
    db: &DatabaseConnection,
    batch_size: usize,
    progress_cb: &mut ProgressCallback<'_>,
    cancel: &CancellationToken,
) -> Result<JobCreationResult, OrchestratorError> {
    let today = Utc::now().date_naive();
    let mut result = JobCreationResult::default();

    let blacklist = BlacklistFilter::load(db, today, ExclusionType::Download).await;

    let due_rules = account_rule::Entity::find()
        .filter(account_rule::Column::JobTypeId.eq(DOWNLOAD_INVOICE_JOB_TYPE_ID))
        .filter(account_rule::Column::IsEnabled.eq(true))
        .filter(account_rule::Column::IsDeleted.eq(false))
        .filter(account_rule::Column::NextRunAt.lte(today))
        .all(db)
        .await?;

    let total = due_rules.len();
    let now = Utc::now().fixed_offset();

    for (index, rule) in due_rules.into_iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }

        let account = match account::Entity::find_by_id(rule.account_id).one(db).await? {
            Some(a) if !a.is_deleted => a,
            _ => {
                result.skipped_no_rule += 1;
                continue;
            }
        };

        let match_fields = AccountMatchFields {
            primary_vendor_code: account.primary_vendor_code.as_deref(),
            master_vendor_code: account.master_vendor_code.as_deref(),
            vm_account_id: account.vm_account_id,
            vm_account_number: &account.vm_account_number,
            credential_id: account.credential_id,
        };
        if blacklist.is_blacklisted(&match_fields) {
            result.skipped_blacklisted += 1;
            continue;
        }

        let exists = job::Entity::find()
            .filter(job::Column::AccountId.eq(account.id))
            .filter(job::Column::BillingPeriodStartAt.eq(rule.next_range_start_at))
            .filter(job::Column::BillingPeriodEndAt.eq(rule.next_range_end_at))
            .one(db)
            .await?;
        if exists.is_some() {
            result.skipped_existing += 1;
            continue;
        }

        let is_missing = account.historical_billing_status.as_deref()
            == Some(BillingStatus::Missing.as_str());

        let active = job::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            account_id: Set(account.id),
            account_rule_id: Set(Some(rule.id)),
            credential_id: Set(account.credential_id),
            period_type: Set(rule.period_type.clone()),
            billing_period_start_at: Set(rule.next_range_start_at),
            billing_period_end_at: Set(rule.next_range_end_at),
            next_run_at: Set(rule.next_run_at),
            next_range_start_at: Set(rule.next_range_start_at),
            next_range_end_at: Set(rule.next_range_end_at),
            status: Set(JobStatus::Pending.as_str().to_string()),
            adr_status_id: Set(None),
            adr_status_description: Set(None),
            adr_index_id: Set(None),
            is_missing: Set(is_missing),
            retry_count: Set(0),
            credential_verified_at: Set(None),
            scraping_completed_at: Set(None),
            error_message: Set(None),
            last_status_check_response: Set(None),
            last_status_check_at: Set(None),
            created_at: Set(now),
            created_by: Set(SYSTEM_ACTOR.to_string()),
            modified_at: Set(now),
            modified_by: Set(SYSTEM_ACTOR.to_string()),
            is_deleted: Set(false),
        };
        active.insert(db).await?;
        result.jobs_created += 1;

        if (index + 1) % batch_size == 0 || index + 1 == total {
            progress_cb((index + 1) as i64, total as i64);
        }
    }

    Ok(result)
}

/// Stage 2 — VerifyCredentials.
pub async fn verify_credentials(
    db: &DatabaseConnection,
    adr: &AdrClient,
    defaults: &OrchestratorDefaults,
    progress_cb: &mut ProgressCallback<'_>,
    cancel: &CancellationToken,
) -> Result<CredentialVerificationResult, OrchestratorError> {
    let today = Utc::now().date_naive();
    let lead_cutoff = today + chrono::Duration::days(defaults.credential_check_lead_days as i64);

    let mut jobs = job::Entity::find()
        .filter(job::Column::IsDeleted.eq(false))
        .filter(job::Column::Status.eq(JobStatus::Pending.as_str()))
        .filter(job::Column::NextRunAt.lte(lead_cutoff))
        .all(db)
        .await?;

    let total = jobs.len();
    progress_cb(-(total as i64), total as i64);

    let now = Utc::now().fixed_offset();
    for (index, job_model) in jobs.iter_mut().enumerate() {
        let mut active: job::ActiveModel = job_model.clone().into();
        active.status = Set(JobStatus::CredentialCheckInProgress.as_str().to_string());
        active.modified_at = Set(now);
        active.modified_by = Set(SYSTEM_ACTOR.to_string());
        *job_model = active.update(db).await?;

        let execution = job_execution::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            job_id: Set(job_model.id),
            request_type_id: Set(AdrRequestType::AttemptLogin as i32),
            start_at: Set(now),
            end_at: Set(None),
            http_status: Set(None),
            adr_status_id: Set(None),
            adr_status_description: Set(None),
            adr_index_id: Set(None),
            is_success: Set(false),
            is_error: Set(false),
            is_final: Set(false),
            error_message: Set(None),
            api_response: Set(None),
            request_payload: Set(None),
            created_at: Set(now),
            created_by: Set(SYSTEM_ACTOR.to_string()),
            modified_at: Set(now),
            modified_by: Set(SYSTEM_ACTOR.to_string()),
            is_deleted: Set(false),
        };
        execution.insert(db).await?;

        if (index + 1) % MARK_BATCH == 0 {
            progress_cb(-((index + 1) as i64), total as i64);
        }
    }

    if cancel.is_cancelled() {
        return Ok(CredentialVerificationResult::default());
    }

    let mut accounts = std::collections::HashMap::new();
    for job_model in &jobs {
        if let std::collections::hash_map::Entry::Vacant(e) = accounts.entry(job_model.account_id) {
            if let Some(a) = account::Entity::find_by_id(job_model.account_id).one(db).await? {
                e.insert(a);
            }
        }
    }

    let calls: Vec<_> = jobs
        .iter()
        .filter_map(|j| accounts.get(&j.account_id).map(|a| (j.clone(), a.clone())))
        .collect();

    let outcomes = bounded_map(calls, defaults.max_parallel_requests as usize, |(job_model, account_model)| {
        let adr = adr.clone();
        async move {
            let request = build_request(
                AdrRequestType::AttemptLogin as i32,
                &job_model,
                &account_model,
                None,
                None,
                false,
                &adr,
            );
            let outcome = adr.ingest(&request).await;
            (job_model, outcome)
        }
    })
    .await;

    let mut result = CredentialVerificationResult::default();
    let now = Utc::now().fixed_offset();

    for (processed, (job_model, outcome)) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(response) => {
                let mut active: job::ActiveModel = job_model.clone().into();
                active.status = Set(JobStatus::CredentialVerified.as_str().to_string());
                active.credential_verified_at = Set(Some(now));
                active.adr_status_id = Set(response.status_id);
                active.adr_status_description = Set(response.status_description.clone());
                active.adr_index_id = Set(response.index_id);
                active.modified_at = Set(now);
                active.modified_by = Set(SYSTEM_ACTOR.to_string());
                active.update(db).await?;
                result.verified += 1;
            }
            Err((error, index_id)) => {
                let mut active: job::ActiveModel = job_model.clone().into();
                active.status = Set(JobStatus::CredentialFailed.as_str().to_string());
                active.retry_count = Set(job_model.retry_count + 1);
                active.error_message = Set(Some(error.to_string()));
                active.adr_index_id = Set(index_id);
                active.modified_at = Set(now);
                active.modified_by = Set(SYSTEM_ACTOR.to_string());
                active.update(db).await?;
                result.failed += 1;
                result.errors.push(ItemFailure {
                    item_id: job_model.id,
                    message: error.to_string(),
                });
            }
        }

        if (processed + 1) % MARK_BATCH == 0 {
            progress_cb((processed + 1) as i64, total as i64);
        }
    }

    progress_cb(total as i64, total as i64);
    Ok(result)
}

/// Stage 3 — Scrape.
pub async fn scrape(
    db: &DatabaseConnection,
    adr: &AdrClient,
    defaults: &OrchestratorDefaults,
    progress_cb: &mut ProgressCallback<'_>,
    cancel: &CancellationToken,
) -> Result<ScrapeResult, OrchestratorError> {
    let today = Utc::now().date_naive();

    let mut jobs = job::Entity::find()
        .filter(job::Column::IsDeleted.eq(false))
        .filter(job::Column::Status.eq(JobStatus::CredentialVerified.as_str()))
        .filter(job::Column::NextRunAt.lte(today))
        .all(db)
        .await?;

    let total = jobs.len();
    progress_cb(-(total as i64), total as i64);

    let now = Utc::now().fixed_offset();
    for (index, job_model) in jobs.iter_mut().enumerate() {
        let mut active: job::ActiveModel = job_model.clone().into();
        active.status = Set(JobStatus::ScrapeInProgress.as_str().to_string());
        active.modified_at = Set(now);
        active.modified_by = Set(SYSTEM_ACTOR.to_string());
        *job_model = active.update(db).await?;

        let execution = job_execution::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            job_id: Set(job_model.id),
            request_type_id: Set(AdrRequestType::DownloadInvoice as i32),
            start_at: Set(now),
            end_at: Set(None),
            http_status: Set(None),
            adr_status_id: Set(None),
            adr_status_description: Set(None),
            adr_index_id: Set(None),
            is_success: Set(false),
            is_error: Set(false),
            is_final: Set(false),
            error_message: Set(None),
            api_response: Set(None),
            request_payload: Set(None),
            created_at: Set(now),
            created_by: Set(SYSTEM_ACTOR.to_string()),
            modified_at: Set(now),
            modified_by: Set(SYSTEM_ACTOR.to_string()),
            is_deleted: Set(false),
        };
        execution.insert(db).await?;

        if (index + 1) % MARK_BATCH == 0 {
            progress_cb(-((index + 1) as i64), total as i64);
        }
    }

    if cancel.is_cancelled() {
        return Ok(ScrapeResult::default());
    }

    let mut accounts = std::collections::HashMap::new();
    for job_model in &jobs {
        if let std::collections::hash_map::Entry::Vacant(e) = accounts.entry(job_model.account_id) {
            if let Some(a) = account::Entity::find_by_id(job_model.account_id).one(db).await? {
                e.insert(a);
            }
        }
    }

    let calls: Vec<_> = jobs
        .iter()
        .filter_map(|j| accounts.get(&j.account_id).map(|a| (j.clone(), a.clone())))
        .collect();

    let outcomes = bounded_map(calls, defaults.max_parallel_requests as usize, |(job_model, account_model)| {
        let adr = adr.clone();
        async move {
            let is_last_attempt = today >= job_model.next_range_end_at;
            let request = build_request(
                AdrRequestType::DownloadInvoice as i32,
                &job_model,
                &account_model,
                Some(job_model.next_range_start_at),
                Some(job_model.next_range_end_at),
                is_last_attempt,
                &adr,
            );
            let outcome = adr.ingest(&request).await;
            (job_model, outcome)
        }
    })
    .await;

    let mut result = ScrapeResult::default();
    let now = Utc::now().fixed_offset();

    for (processed, (job_model, outcome)) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(response) => {
                let is_complete = response.status_id == Some(status::STATUS_DOCUMENT_RETRIEVAL_COMPLETE)
                    && response.is_final.unwrap_or_else(|| {
                        response
                            .status_id
                            .map(status::derive_is_final)
                            .unwrap_or(false)
                    });

                if is_complete {
                    complete_scrape_job(db, &job_model, now, &response).await?;
                    result.completed += 1;
                } else {
                    let mut active: job::ActiveModel = job_model.clone().into();
                    active.status = Set(JobStatus::ScrapeRequested.as_str().to_string());
                    active.adr_status_id = Set(response.status_id);
                    active.adr_status_description = Set(response.status_description.clone());
                    active.adr_index_id = Set(response.index_id);
                    active.modified_at = Set(now);
                    active.modified_by = Set(SYSTEM_ACTOR.to_string());
                    active.update(db).await?;
                    result.requested += 1;
                }
            }
            Err((error, index_id)) => {
                let mut active: job::ActiveModel = job_model.clone().into();
                active.status = Set(JobStatus::ScrapeFailed.as_str().to_string());
                active.retry_count = Set(job_model.retry_count + 1);
                active.error_message = Set(Some(error.to_string()));
                active.adr_index_id = Set(index_id);
                active.modified_at = Set(now);
                active.modified_by = Set(SYSTEM_ACTOR.to_string());
                active.update(db).await?;
                result.failed += 1;
                result.errors.push(ItemFailure {
                    item_id: job_model.id,
                    message: error.to_string(),
                });
            }
        }

        if (processed + 1) % MARK_BATCH == 0 {
            progress_cb((processed + 1) as i64, total as i64);
        }
    }

    progress_cb(total as i64, total as i64);
    Ok(result)
}

async fn complete_scrape_job(
    db: &DatabaseConnection,
    job_model: &job::Model,
    now: chrono::DateTime<chrono::FixedOffset>,
    response: &crate::adr::types::IngestAdrResponse,
) -> Result<(), OrchestratorError> {
    let mut active: job::ActiveModel = job_model.clone().into();
    active.status = Set(JobStatus::Completed.as_str().to_string());
    active.scraping_completed_at = Set(Some(now));
    active.adr_status_id = Set(response.status_id);
    active.adr_status_description = Set(response.status_description.clone());
    active.adr_index_id = Set(response.index_id);
    active.modified_at = Set(now);
    active.modified_by = Set(SYSTEM_ACTOR.to_string());
    active.update(db).await?;

    advance_rule_and_account(db, job_model, now).await
}

/// Shared by the scrape-completion path and the window-exhaustion /
/// status-check-completion paths (spec §4.3 "Rule advancement").
pub async fn advance_rule_and_account(
    db: &DatabaseConnection,
    job_model: &job::Model,
    now: chrono::DateTime<chrono::FixedOffset>,
) -> Result<(), OrchestratorError> {
    let Some(rule_id) = job_model.account_rule_id else {
        return Ok(());
    };
    let Some(rule) = account_rule::Entity::find_by_id(rule_id).one(db).await? else {
        return Ok(());
    };
    if rule.is_manually_overridden {
        return Ok(());
    }

    let period_type = PeriodType::parse(&rule.period_type).unwrap_or(PeriodType::Monthly);
    let advanced = advance_rule(
        period_type,
        job_model.next_run_at,
        rule.next_range_start_at,
        rule.next_range_end_at,
        rule.window_days_before,
        rule.window_days_after,
    );

    let account_id = rule.account_id;
    let mut rule_active: account_rule::ActiveModel = rule.clone().into();
    rule_active.next_run_at = Set(advanced.next_run_at);
    rule_active.next_range_start_at = Set(advanced.range_start_at);
    rule_active.next_range_end_at = Set(advanced.range_end_at);
    rule_active.modified_at = Set(now);
    rule_active.modified_by = Set(SYSTEM_ACTOR.to_string());
    rule_active.update(db).await?;

    if let Some(account_model) = account::Entity::find_by_id(account_id).one(db).await? {
        let job_date = job_model.next_run_at;
        let new_last_success = next_last_successful_download_date(
            account_model.last_successful_download_date,
            job_date,
            period_type,
            job_model.next_run_at,
        );

        let today = now.date_naive();
        let days_until_next_run = (advanced.next_run_at - today).num_days() as i32;
        let (window_before, _) = period_type.default_window();
        let next_run_status = crate::billing::next_run_status(
            account_model
                .historical_billing_status
                .as_deref()
                .and_then(parse_billing_status)
                .unwrap_or(BillingStatus::Future),
            days_until_next_run as i64,
            period_type.period_days(),
            window_before,
        );

        let mut account_active: account::ActiveModel = account_model.into();
        account_active.last_successful_download_date = Set(Some(new_last_success));
        account_active.next_run_at = Set(Some(advanced.next_run_at));
        account_active.next_range_start_at = Set(Some(advanced.range_start_at));
        account_active.next_range_end_at = Set(Some(advanced.range_end_at));
        account_active.days_until_next_run = Set(Some(days_until_next_run));
        account_active.next_run_status = Set(Some(next_run_status.as_str().to_string()));
        account_active.modified_at = Set(now);
        account_active.modified_by = Set(SYSTEM_ACTOR.to_string());
        account_active.update(db).await?;
    }

    Ok(())
}

fn parse_billing_status(s: &str) -> Option<BillingStatus> {
    match s {
        "Missing" => Some(BillingStatus::Missing),
        "Overdue" => Some(BillingStatus::Overdue),
        "Due Now" => Some(BillingStatus::DueNow),
        "Due Soon" => Some(BillingStatus::DueSoon),
        "Upcoming" => Some(BillingStatus::Upcoming),
        "Future" => Some(BillingStatus::Future),
        "Run Now" => Some(BillingStatus::RunNow),
        _ => None,
    }
}

/// Stage 4 — StatusCheck, unified across the scheduled and manual
/// selection modes (spec §4.3's Open Question, resolved in favor of
/// unification).
pub async fn status_check(
    db: &DatabaseConnection,
    adr: &AdrClient,
    defaults: &OrchestratorDefaults,
    selection: StatusCheckSelection,
    progress_cb: &mut ProgressCallback<'_>,
    cancel: &CancellationToken,
) -> Result<StatusCheckResult, OrchestratorError> {
    let today = Utc::now().date_naive();

    // Each selection mode owns its own eligibility condition rather than
    // ANDing a mode-specific filter over a shared scrape/credential-only
    // base: Manual additionally recovers jobs parked in
    // `StatusCheckInProgress` by an interrupted prior sweep, which the
    // Scheduled base would otherwise silently exclude.
    let mut query = job::Entity::find().filter(job::Column::IsDeleted.eq(false));

    query = match selection {
        StatusCheckSelection::Scheduled => {
            let stale_cutoff = today - chrono::Duration::days(defaults.daily_status_check_delay_days as i64);
            query
                .filter(
                    Condition::any()
                        .add(job::Column::Status.eq(JobStatus::ScrapeRequested.as_str()))
                        .add(job::Column::Status.eq(JobStatus::CredentialCheckInProgress.as_str())),
                )
                .filter(
                    Condition::any()
                        .add(job::Column::LastStatusCheckAt.is_null())
                        .add(job::Column::LastStatusCheckAt.lt(
                            stale_cutoff
                                .and_hms_opt(0, 0, 0)
                                .unwrap()
                                .and_utc()
                                .fixed_offset(),
                        )),
                )
        }
        StatusCheckSelection::Manual => query.filter(
            Condition::any()
                .add(job::Column::Status.eq(JobStatus::ScrapeRequested.as_str()))
                .add(job::Column::Status.eq(JobStatus::StatusCheckInProgress.as_str())),
        ),
    };

    let mut jobs = query.all(db).await?;
    let total = jobs.len();
    let negative_base = if selection == StatusCheckSelection::Manual {
        -1_000_001
    } else {
        0
    };
    progress_cb(negative_base - total as i64, total as i64);

    let now = Utc::now().fixed_offset();
    let mut prior_status_by_job: std::collections::HashMap<i64, JobStatus> = std::collections::HashMap::new();

    for (index, job_model) in jobs.iter_mut().enumerate() {
        let prior = parse_job_status(&job_model.status).unwrap_or(JobStatus::ScrapeRequested);
        prior_status_by_job.insert(job_model.id, prior);

        let mut active: job::ActiveModel = job_model.clone().into();
        active.status = Set(JobStatus::StatusCheckInProgress.as_str().to_string());
        active.last_status_check_at = Set(Some(now));
        active.modified_at = Set(now);
        active.modified_by = Set(SYSTEM_ACTOR.to_string());
        *job_model = active.update(db).await?;

        if (index + 1) % MARK_BATCH == 0 {
            progress_cb(negative_base - (index + 1) as i64, total as i64);
        }
    }

    if cancel.is_cancelled() {
        return Ok(StatusCheckResult::default());
    }

    let calls: Vec<_> = jobs.iter().cloned().collect();
    let outcomes = bounded_map(calls, defaults.max_parallel_requests as usize, |job_model| {
        let adr = adr.clone();
        async move {
            let response = adr.status_check(job_model.id).await;
            (job_model, response)
        }
    })
    .await;

    let mut result = StatusCheckResult::default();
    let apply_base = if selection == StatusCheckSelection::Manual {
        -1_000_001
    } else {
        0
    };

    for (processed, (job_model, outcome)) in outcomes.into_iter().enumerate() {
        let is_credential_stream = prior_status_by_job
            .get(&job_model.id)
            .map(|s| *s == JobStatus::CredentialCheckInProgress)
            .unwrap_or(false);

        match outcome {
            Ok(response) => {
                apply_status_response(
                    db,
                    &job_model,
                    &response,
                    is_credential_stream,
                    today,
                    now,
                    &mut result,
                )
                .await?;
            }
            Err(error) => {
                let mut active: job::ActiveModel = job_model.clone().into();
                active.error_message = Set(Some(error.to_string()));
                active.modified_at = Set(now);
                active.modified_by = Set(SYSTEM_ACTOR.to_string());
                active.update(db).await?;
                result.still_pending += 1;
                result.errors.push(ItemFailure {
                    item_id: job_model.id,
                    message: error.to_string(),
                });
            }
        }

        if (processed + 1) % defaults.batch_size.max(1) as usize == 0 {
            progress_cb(apply_base + (processed + 1) as i64, total as i64);
        }
    }

    // Window-exhaustion: scrape-stream jobs still non-final past their range end.
    for job_model in jobs.iter() {
        if cancel.is_cancelled() {
            break;
        }
        let is_credential_stream = prior_status_by_job
            .get(&job_model.id)
            .map(|s| *s == JobStatus::CredentialCheckInProgress)
            .unwrap_or(false);
        if is_credential_stream {
            continue;
        }

        let current = job::Entity::find_by_id(job_model.id).one(db).await?;
        let Some(current) = current else { continue };
        let current_status = parse_job_status(&current.status);
        if current_status != Some(JobStatus::StatusCheckInProgress) {
            continue;
        }
        if today <= current.next_range_end_at {
            continue;
        }

        let mut active: job::ActiveModel = current.clone().into();
        active.status = Set(JobStatus::NoInvoiceFound.as_str().to_string());
        active.scraping_completed_at = Set(Some(now));
        active.modified_at = Set(now);
        active.modified_by = Set(SYSTEM_ACTOR.to_string());
        active.update(db).await?;
        advance_rule_and_account(db, &current, now).await?;
        result.no_invoice_found += 1;
    }

    progress_cb(apply_base + total as i64, total as i64);
    Ok(result)
}

async fn apply_status_response(
    db: &DatabaseConnection,
    job_model: &job::Model,
    response: &crate::adr::types::IngestAdrResponse,
    is_credential_stream: bool,
    today: chrono::NaiveDate,
    now: chrono::DateTime<chrono::FixedOffset>,
    result: &mut StatusCheckResult,
) -> Result<(), OrchestratorError> {
    // A scrape-stream job whose window has already closed never gets another
    // sweep to catch it once it leaves `StatusCheckInProgress`, so exhaustion
    // must be checked here, before any revert to `ScrapeRequested`.
    let window_closed = !is_credential_stream && today > job_model.next_range_end_at;

    let Some(status_id) = response.status_id else {
        if window_closed {
            finalize_no_invoice_found(db, job_model, now, result).await?;
        } else {
            result.still_pending += 1;
        }
        return Ok(());
    };

    let is_final = response.is_final.unwrap_or_else(|| status::derive_is_final(status_id));

    if !is_final || status::is_in_flight_status(status_id) {
        if window_closed {
            finalize_no_invoice_found(db, job_model, now, result).await?;
            return Ok(());
        }
        let mut active: job::ActiveModel = job_model.clone().into();
        active.status = Set(if is_credential_stream {
            JobStatus::CredentialCheckInProgress.as_str().to_string()
        } else {
            JobStatus::ScrapeRequested.as_str().to_string()
        });
        active.adr_status_id = Set(Some(status_id));
        active.adr_status_description = Set(response.status_description.clone());
        active.last_status_check_response = Set(response.status_description.clone());
        active.modified_at = Set(now);
        active.modified_by = Set(SYSTEM_ACTOR.to_string());
        active.update(db).await?;
        result.still_pending += 1;
        return Ok(());
    }

    if is_credential_stream {
        if status_id == status::STATUS_LOGIN_SUCCEEDED {
            let mut active: job::ActiveModel = job_model.clone().into();
            active.status = Set(JobStatus::CredentialVerified.as_str().to_string());
            active.credential_verified_at = Set(Some(now));
            active.adr_status_id = Set(Some(status_id));
            active.adr_status_description = Set(response.status_description.clone());
            active.modified_at = Set(now);
            active.modified_by = Set(SYSTEM_ACTOR.to_string());
            active.update(db).await?;
            result.credential_verified += 1;
        } else {
            let mut active: job::ActiveModel = job_model.clone().into();
            active.status = Set(JobStatus::CredentialFailed.as_str().to_string());
            active.retry_count = Set(job_model.retry_count + 1);
            active.adr_status_id = Set(Some(status_id));
            active.adr_status_description = Set(response.status_description.clone());
            active.modified_at = Set(now);
            active.modified_by = Set(SYSTEM_ACTOR.to_string());
            active.update(db).await?;
            result.credential_failed += 1;
        }
        return Ok(());
    }

    match status_id {
        id if id == status::STATUS_DOCUMENT_RETRIEVAL_COMPLETE => {
            let mut active: job::ActiveModel = job_model.clone().into();
            active.status = Set(JobStatus::Completed.as_str().to_string());
            active.scraping_completed_at = Set(Some(now));
            active.adr_status_id = Set(Some(status_id));
            active.adr_status_description = Set(response.status_description.clone());
            active.modified_at = Set(now);
            active.modified_by = Set(SYSTEM_ACTOR.to_string());
            active.update(db).await?;
            advance_rule_and_account(db, job_model, now).await?;
            result.completed += 1;
        }
        id if id == status::STATUS_NEEDS_HUMAN_REVIEW => {
            let mut active: job::ActiveModel = job_model.clone().into();
            active.status = Set(JobStatus::NeedsReview.as_str().to_string());
            active.adr_status_id = Set(Some(status_id));
            active.adr_status_description = Set(response.status_description.clone());
            active.modified_at = Set(now);
            active.modified_by = Set(SYSTEM_ACTOR.to_string());
            active.update(db).await?;
            result.needs_review += 1;
        }
        id if status::is_failure_status(id) => {
            let mut active: job::ActiveModel = job_model.clone().into();
            active.status = Set(JobStatus::ScrapeFailed.as_str().to_string());
            active.retry_count = Set(job_model.retry_count + 1);
            active.adr_status_id = Set(Some(status_id));
            active.adr_status_description = Set(response.status_description.clone());
            active.modified_at = Set(now);
            active.modified_by = Set(SYSTEM_ACTOR.to_string());
            active.update(db).await?;
            result.scrape_failed += 1;
        }
        _ => {
            result.still_pending += 1;
        }
    }

    Ok(())
}

async fn finalize_no_invoice_found(
    db: &DatabaseConnection,
    job_model: &job::Model,
    now: chrono::DateTime<chrono::FixedOffset>,
    result: &mut StatusCheckResult,
) -> Result<(), OrchestratorError> {
    let mut active: job::ActiveModel = job_model.clone().into();
    active.status = Set(JobStatus::NoInvoiceFound.as_str().to_string());
    active.scraping_completed_at = Set(Some(now));
    active.modified_at = Set(now);
    active.modified_by = Set(SYSTEM_ACTOR.to_string());
    active.update(db).await?;
    advance_rule_and_account(db, job_model, now).await?;
    result.no_invoice_found += 1;
    Ok(())
}

fn parse_job_status(s: &str) -> Option<JobStatus> {
    match s {
        "Pending" => Some(JobStatus::Pending),
        "CredentialCheckInProgress" => Some(JobStatus::CredentialCheckInProgress),
        "CredentialVerified" => Some(JobStatus::CredentialVerified),
        "CredentialFailed" => Some(JobStatus::CredentialFailed),
        "ScrapeInProgress" => Some(JobStatus::ScrapeInProgress),
        "ScrapeRequested" => Some(JobStatus::ScrapeRequested),
        "ScrapeFailed" => Some(JobStatus::ScrapeFailed),
        "StatusCheckInProgress" => Some(JobStatus::StatusCheckInProgress),
        "NeedsReview" => Some(JobStatus::NeedsReview),
        "NoInvoiceFound" => Some(JobStatus::NoInvoiceFound),
        "Completed" => Some(JobStatus::Completed),
        "Cancelled" => Some(JobStatus::Cancelled),
        _ => None,
    }
}
