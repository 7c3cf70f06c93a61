//! OrchestratorCore (C4): the public entry point (spec §6). Wraps each
//! stage/engine call with a C7 queue claim, an `OrchestrationRun` row, and
//! notification-on-failure, grounded on the claim/run/notify shape of the
//! teacher's `SyncScheduler::tick`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::adr::client::AdrClient;
use crate::config::ConfigurationLoader;
use crate::error::OrchestratorError;
use crate::models::account_rule::DOWNLOAD_INVOICE_JOB_TYPE_ID;
use crate::models::job_execution::AdrRequestType;
use crate::models::orchestration_run::{self, RunStatus};
use crate::models::{account, account_rule};
use crate::models::SYSTEM_ACTOR;
use crate::notification::EmailService;
use crate::sync::{AccountSync, SyncResult};

use super::queue::{OrchestrationQueue, QueueOutcome};
use super::recovery::{self, RecoveryResult};
use super::stages;
use super::stale_finalizer::StaleFinalizer;
use super::types::{
    BulkVerifyResult, CredentialVerificationResult, JobCreationResult, ProgressCallback,
    ScrapeResult, SingleRebillResult, StalePendingResult, StatusCheckResult, StatusCheckSelection,
};

pub struct OrchestratorCore {
    db: DatabaseConnection,
    external_db: DatabaseConnection,
    adr: AdrClient,
    queue: OrchestrationQueue,
    notifier: Arc<dyn EmailService>,
}

impl OrchestratorCore {
    pub fn new(
        db: DatabaseConnection,
        external_db: DatabaseConnection,
        adr: AdrClient,
        notifier: Arc<dyn EmailService>,
    ) -> Self {
        Self {
            db,
            external_db,
            adr,
            queue: OrchestrationQueue::new(),
            notifier,
        }
    }

    pub fn queue(&self) -> &OrchestrationQueue {
        &self.queue
    }

    /// Runs startup recovery (C6). Intended to be called once, before any
    /// other method, after the process's configured startup delay.
    pub async fn recover_from_restart(
        &self,
        app_start: DateTime<Utc>,
        grace_period_minutes: i64,
    ) -> Result<RecoveryResult, OrchestratorError> {
        let result = recovery::recover(&self.db, app_start, grace_period_minutes).await?;
        if result.runs_interrupted > 0 {
            let subject = "Orchestration run interrupted by restart";
            let body = format!(
                "{} orchestration run(s) were interrupted by an app restart. Most recent: {:?}",
                result.runs_interrupted, result.most_recently_interrupted_run_id
            );
            self.notifier.send(subject, &body, None).await;
        }
        Ok(result)
    }

    /// Claims the C7 slot, opens an `OrchestrationRun` row, runs `body`,
    /// then closes the run as Completed or Failed and releases the slot.
    /// The slot is released whether `body` succeeds or returns an error;
    /// a panic inside `body` still unwinds past the release call below, so
    /// callers that wrap this in `catch_unwind` must release manually.
    async fn run_guarded<T, F, Fut>(
        &self,
        requested_by: &str,
        cancel: &CancellationToken,
        body: F,
    ) -> Result<T, OrchestratorError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, OrchestratorError>>,
    {
        let request_id = Uuid::new_v4().to_string();
        let outcome = self
            .queue
            .queue(request_id.clone(), requested_by.to_string(), cancel.clone())
            .await;
        if outcome == QueueOutcome::RejectedAlreadyRunning {
            return Err(OrchestratorError::AlreadyRunning);
        }

        let result = self.run_guarded_inner(&request_id, requested_by, body).await;
        self.queue.release().await;
        result
    }

    async fn run_guarded_inner<T, F, Fut>(
        &self,
        request_id: &str,
        requested_by: &str,
        body: F,
    ) -> Result<T, OrchestratorError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, OrchestratorError>>,
    {
        let request_id = request_id.to_string();
        let now = Utc::now().fixed_offset();
        let run = orchestration_run::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            request_id: Set(request_id),
            requested_by: Set(requested_by.to_string()),
            requested_at: Set(now),
            started_at: Set(Some(now)),
            completed_at: Set(None),
            status: Set(RunStatus::Running.as_str().to_string()),
            error_message: Set(None),
            jobs_created: Set(0),
            credentials_verified: Set(0),
            scrapes_requested: Set(0),
            status_checks_performed: Set(0),
            errors: Set(0),
            created_at: Set(now),
            created_by: Set(SYSTEM_ACTOR.to_string()),
            modified_at: Set(now),
            modified_by: Set(SYSTEM_ACTOR.to_string()),
            is_deleted: Set(false),
        };
        let run = run.insert(&self.db).await?;
        let started = std::time::Instant::now();

        let result = body().await;

        let metric_labels = vec![("operation", requested_by.to_string())];
        histogram!("orchestrator_run_duration_ms", &metric_labels)
            .record(started.elapsed().as_millis() as f64);

        let completed_at = Utc::now().fixed_offset();
        let mut active: orchestration_run::ActiveModel = run.into();
        active.completed_at = Set(Some(completed_at));
        active.modified_at = Set(completed_at);
        active.modified_by = Set(SYSTEM_ACTOR.to_string());
        match &result {
            Ok(_) => {
                active.status = Set(RunStatus::Completed.as_str().to_string());
                counter!("orchestrator_run_completed_total", &metric_labels).increment(1);
            }
            Err(err) => {
                active.status = Set(RunStatus::Failed.as_str().to_string());
                active.error_message = Set(Some(err.to_string()));
                counter!("orchestrator_run_failed_total", &metric_labels).increment(1);
            }
        }
        if let Err(persist_err) = active.update(&self.db).await {
            tracing::error!(error = %persist_err, "failed to persist orchestration run outcome");
        }

        if let Err(err) = &result {
            self.notifier
                .send(
                    "Orchestration run failed",
                    &format!("run requested_by={requested_by} failed: {err}"),
                    None,
                )
                .await;
        }

        result
    }

    pub async fn sync_accounts(
        &self,
        mut progress_cb: impl FnMut(i64, i64) + Send,
        mut substep_cb: impl FnMut(&str) + Send,
        cancel: &CancellationToken,
    ) -> Result<SyncResult, OrchestratorError> {
        self.run_guarded("sync_accounts", cancel, || async {
            let engine = AccountSync::new(&self.db, &self.external_db);
            engine
                .run(
                    |c, t| progress_cb(c, t),
                    |s| substep_cb(s.as_str()),
                    cancel,
                )
                .await
        })
        .await
    }

    pub async fn create_jobs(
        &self,
        progress_cb: &mut ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<JobCreationResult, OrchestratorError> {
        let defaults = ConfigurationLoader::load(&self.db).await;
        self.run_guarded("create_jobs", cancel, || async {
            stages::create_jobs(&self.db, defaults.batch_size.max(1) as usize, progress_cb, cancel).await
        })
        .await
    }

    pub async fn verify_credentials(
        &self,
        progress_cb: &mut ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<CredentialVerificationResult, OrchestratorError> {
        let defaults = ConfigurationLoader::load(&self.db).await;
        self.run_guarded("verify_credentials", cancel, || async {
            stages::verify_credentials(&self.db, &self.adr, &defaults, progress_cb, cancel).await
        })
        .await
    }

    pub async fn process_scraping(
        &self,
        progress_cb: &mut ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<ScrapeResult, OrchestratorError> {
        let defaults = ConfigurationLoader::load(&self.db).await;
        self.run_guarded("process_scraping", cancel, || async {
            stages::scrape(&self.db, &self.adr, &defaults, progress_cb, cancel).await
        })
        .await
    }

    pub async fn check_pending_statuses(
        &self,
        progress_cb: &mut ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<StatusCheckResult, OrchestratorError> {
        let defaults = ConfigurationLoader::load(&self.db).await;
        self.run_guarded("check_pending_statuses", cancel, || async {
            stages::status_check(
                &self.db,
                &self.adr,
                &defaults,
                StatusCheckSelection::Scheduled,
                progress_cb,
                cancel,
            )
            .await
        })
        .await
    }

    pub async fn check_all_scraped_statuses(
        &self,
        progress_cb: &mut ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<StatusCheckResult, OrchestratorError> {
        let defaults = ConfigurationLoader::load(&self.db).await;
        self.run_guarded("check_all_scraped_statuses", cancel, || async {
            stages::status_check(
                &self.db,
                &self.adr,
                &defaults,
                StatusCheckSelection::Manual,
                progress_cb,
                cancel,
            )
            .await
        })
        .await
    }

    pub async fn finalize_stale_pending_jobs(
        &self,
        progress_cb: &mut ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<StalePendingResult, OrchestratorError> {
        let defaults = ConfigurationLoader::load(&self.db).await;
        self.run_guarded("finalize_stale_pending_jobs", cancel, || async {
            let finalizer = StaleFinalizer::new(&self.db, defaults.batch_size.max(1) as usize);
            finalizer.run(progress_cb).await
        })
        .await
    }

    /// Fires `AttemptLogin` for every non-deleted, enabled account
    /// (independent of the job-creation schedule), used for ad hoc bulk
    /// credential verification.
    pub async fn verify_all_account_credentials(
        &self,
        progress_cb: &mut ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<BulkVerifyResult, OrchestratorError> {
        let defaults = ConfigurationLoader::load(&self.db).await;
        self.run_guarded("verify_all_account_credentials", cancel, || async {
            let accounts = account::Entity::find()
                .filter(account::Column::IsDeleted.eq(false))
                .all(&self.db)
                .await?;
            let total = accounts.len();
            progress_cb(-(total as i64), total as i64);

            let outcomes = super::concurrency::bounded_map(
                accounts,
                defaults.max_parallel_requests.max(1) as usize,
                |account_model| {
                    let adr = self.adr.clone();
                    async move {
                        let request = crate::adr::types::IngestAdrRequest {
                            adr_request_type_id: AdrRequestType::AttemptLogin as i32,
                            credential_id: account_model.credential_id,
                            start_date: String::new(),
                            end_date: String::new(),
                            source_application_name: adr.source_application_name().to_string(),
                            recipient_email: adr.recipient_email().to_string(),
                            job_id: 0,
                            account_id: account_model.vm_account_id,
                            interface_account_id: account_model.interface_account_id.clone(),
                            is_last_attempt: false,
                        };
                        let outcome = adr.ingest(&request).await;
                        (account_model, outcome)
                    }
                },
            )
            .await;

            let mut result = BulkVerifyResult::default();
            for (processed, (account_model, outcome)) in outcomes.into_iter().enumerate() {
                match outcome {
                    Ok(_) => result.verified += 1,
                    Err((error, _index_id)) => {
                        result.failed += 1;
                        result.errors.push(crate::error::ItemFailure {
                            item_id: account_model.id,
                            message: error.to_string(),
                        });
                    }
                }
                if (processed + 1) % defaults.batch_size.max(1) as usize == 0 {
                    progress_cb((processed + 1) as i64, total as i64);
                }
            }
            progress_cb(total as i64, total as i64);
            Ok(result)
        })
        .await
    }

    /// Fires a single out-of-band `Rebill` request for one account,
    /// bypassing the schedule entirely (spec §6).
    pub async fn fire_rebill_for_account(
        &self,
        account_id: i64,
        cancel: &CancellationToken,
    ) -> Result<SingleRebillResult, OrchestratorError> {
        self.run_guarded("fire_rebill_for_account", cancel, || async {
            let Some(account_model) = account::Entity::find_by_id(account_id).one(&self.db).await?
            else {
                return Ok(SingleRebillResult {
                    success: false,
                    message: Some(format!("account {account_id} not found")),
                });
            };

            let rule = account_rule::Entity::find()
                .filter(account_rule::Column::AccountId.eq(account_id))
                .filter(account_rule::Column::JobTypeId.eq(DOWNLOAD_INVOICE_JOB_TYPE_ID))
                .filter(account_rule::Column::IsDeleted.eq(false))
                .one(&self.db)
                .await?;

            let (start, end) = match &rule {
                Some(rule) => (Some(rule.next_range_start_at), Some(rule.next_range_end_at)),
                None => (None, None),
            };

            let request = crate::adr::types::IngestAdrRequest {
                adr_request_type_id: AdrRequestType::Rebill as i32,
                credential_id: account_model.credential_id,
                start_date: crate::adr::types::IngestAdrRequest::format_date(start),
                end_date: crate::adr::types::IngestAdrRequest::format_date(end),
                source_application_name: self.adr.source_application_name().to_string(),
                recipient_email: self.adr.recipient_email().to_string(),
                job_id: 0,
                account_id: account_model.vm_account_id,
                interface_account_id: account_model.interface_account_id.clone(),
                is_last_attempt: false,
            };

            match self.adr.ingest(&request).await {
                Ok(response) => Ok(SingleRebillResult {
                    success: true,
                    message: response.status_description,
                }),
                Err((error, _index_id)) => Ok(SingleRebillResult {
                    success: false,
                    message: Some(error.to_string()),
                }),
            }
        })
        .await
    }
}
